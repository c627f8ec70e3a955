/// Whole-percent download progress, `None` while the total is unknown.
#[must_use]
pub fn progress_percent(downloaded: u64, total: Option<u64>) -> Option<u8> {
    match total {
        Some(total) if total > 0 => {
            let pct = downloaded.saturating_mul(100) / total;
            Some(pct.min(100) as u8)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculates_progress_percent() {
        assert_eq!(progress_percent(0, Some(10)), Some(0));
        assert_eq!(progress_percent(5, Some(10)), Some(50));
        assert_eq!(progress_percent(10, Some(10)), Some(100));
        assert_eq!(progress_percent(5, None), None);
        assert_eq!(progress_percent(5, Some(0)), None);
    }

    #[test]
    fn floors_and_clamps() {
        assert_eq!(progress_percent(8192, Some(20_480)), Some(40));
        assert_eq!(progress_percent(1, Some(3)), Some(33));
        assert_eq!(progress_percent(30, Some(10)), Some(100));
    }
}
