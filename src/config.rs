//! Location of the proc filesystem.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the proc mount point.
pub const PROCFS_ROOT_ENV: &str = "PROCFS_ROOT";

/// Default mount point.
pub const DEFAULT_ROOT: &str = "/proc";

/// Root of a proc filesystem: the host's `/proc`, a container's view, or a
/// fixture directory in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcRoot {
    path: PathBuf,
}

impl Default for ProcRoot {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl ProcRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `$PROCFS_ROOT` when set and non-empty, `/proc` otherwise.
    pub fn from_env() -> Self {
        match env::var_os(PROCFS_ROOT_ENV) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file relative to the root, e.g. `net/dev`.
    pub fn path_for(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }

    /// Path of a per-process file, e.g. `pid_path(42, "stat")`.
    pub fn pid_path(&self, pid: u32, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(pid.to_string()).join(relative)
    }

    /// Path of a file of the calling process.
    pub fn self_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.pid_path(std::process::id(), relative)
    }
}
