use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info, warn};
use walkdir::WalkDir;

/// Finds a `java` executable on this machine.
#[derive(Debug, Clone, Default)]
pub struct JavaLocator {
    preferred: Option<PathBuf>,
    java_home: Option<OsString>,
    search_path: Option<OsString>,
    install_roots: Vec<PathBuf>,
}

impl JavaLocator {
    /// Locator reading `JAVA_HOME` and `PATH` from the environment.
    pub fn from_env() -> Self {
        Self {
            preferred: None,
            java_home: env::var_os("JAVA_HOME"),
            search_path: env::var_os("PATH"),
            install_roots: default_install_roots(),
        }
    }

    /// Try `path` before anything else, when it is set.
    pub fn prefer(mut self, path: &str) -> Self {
        let trimmed = path.trim();
        self.preferred = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        self
    }

    pub fn with_java_home(mut self, home: Option<OsString>) -> Self {
        self.java_home = home;
        self
    }

    pub fn with_search_path(mut self, path: Option<OsString>) -> Self {
        self.search_path = path;
        self
    }

    pub fn with_install_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.install_roots = roots;
        self
    }

    /// Profile override, then `JAVA_HOME`, then `PATH`, then common install roots.
    pub fn find(&self) -> Option<PathBuf> {
        if let Some(preferred) = &self.preferred {
            if preferred.is_file() {
                debug!("jre: using configured java {}", preferred.display());
                return Some(preferred.clone());
            }
            warn!(
                "jre: configured java {} does not exist; searching",
                preferred.display()
            );
        }

        if let Some(home) = &self.java_home {
            let candidate = java_in_home(Path::new(home));
            if candidate.is_file() {
                debug!("jre: found via JAVA_HOME at {}", candidate.display());
                return Some(candidate);
            }
        }

        if let Some(path) = &self.search_path {
            for dir in env::split_paths(path) {
                if dir.as_os_str().is_empty() {
                    continue;
                }
                let candidate = dir.join(java_binary_name());
                if candidate.is_file() {
                    debug!("jre: found on PATH at {}", candidate.display());
                    return Some(candidate);
                }
            }
        }

        for root in &self.install_roots {
            if let Some(found) = scan_install_root(root) {
                debug!("jre: found under {} at {}", root.display(), found.display());
                return Some(found);
            }
        }

        info!("jre: no Java runtime found");
        None
    }
}

/// First line of `java -version`, which the JVM prints on stderr.
pub fn java_version(java: &Path) -> Option<String> {
    let output = Command::new(java)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| warn!("jre: failed to run {} -version: {e}", java.display()))
        .ok()?;
    first_line(&String::from_utf8_lossy(&output.stderr))
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_owned)
}

fn java_binary_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "java.exe"
    } else {
        "java"
    }
}

fn java_in_home(home: &Path) -> PathBuf {
    home.join("bin").join(java_binary_name())
}

/// Look one directory level below `root` for an installed runtime.
fn scan_install_root(root: &Path) -> Option<PathBuf> {
    if !root.is_dir() {
        return None;
    }
    let mut homes: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();
    // Prefer the newest-looking install when several are present.
    homes.reverse();

    homes.into_iter().find_map(|dir| {
        [dir.clone(), dir.join("Contents").join("Home")]
            .into_iter()
            .map(|home| java_in_home(&home))
            .find(|candidate| candidate.is_file())
    })
}

fn default_install_roots() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        let mut roots = Vec::new();
        for var in ["ProgramFiles", "ProgramFiles(x86)"] {
            if let Some(base) = env::var_os(var) {
                let base = PathBuf::from(base);
                roots.push(base.join("Java"));
                roots.push(base.join("Eclipse Adoptium"));
                roots.push(base.join("Microsoft"));
            }
        }
        roots
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from("/Library/Java/JavaVirtualMachines")]
    } else {
        vec![PathBuf::from("/usr/lib/jvm"), PathBuf::from("/usr/java")]
    }
}
