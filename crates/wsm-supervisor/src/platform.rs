//! Platform strategy and path resolution.
//!
//! The host platform is selected once and answers every platform question
//! the supervisor has: where the daemon and its logs live, whether the
//! daemon can be asked to stop with a signal, which executable suffix the
//! process table uses, and where the user goes to close a stray daemon.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::DaemonNames;
use crate::error::{Result, SupervisorError};

/// Per-user directory holding application data on macOS, relative to home.
const MACOS_APP_SUPPORT: &str = "Library/Application Support";

// ============================================================================
// Platform
// ============================================================================

/// Host platform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    #[serde(rename = "macos", alias = "darwin")]
    MacOs,
    Windows,
}

impl Platform {
    /// Platform this binary was compiled for.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// Maps a platform name to a family. Unknown names fall back to Linux.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "darwin" | "macos" => Self::MacOs,
            "windows" => Self::Windows,
            _ => Self::Linux,
        }
    }

    /// True if the daemon can be asked to exit with a termination signal.
    ///
    /// Without one, the wallet must be saved over RPC before a hard kill.
    #[must_use]
    pub fn has_graceful_signal(&self) -> bool {
        !matches!(self, Self::Windows)
    }

    /// Suffix executables carry in the process table.
    #[must_use]
    pub fn executable_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux | Self::MacOs => "",
        }
    }

    /// Where the user closes background processes on this platform.
    #[must_use]
    pub fn collision_hint(&self) -> &'static str {
        match self {
            Self::Windows => "the task manager",
            Self::MacOs => "the activity monitor",
            Self::Linux => "a system monitor app",
        }
    }

    /// Strips the `file:` URL prefix front ends hand over with picked paths.
    pub fn strip_file_url<'a>(&self, path: &'a str) -> &'a str {
        let prefix = match self {
            Self::Windows => "file:\\",
            Self::Linux | Self::MacOs => "file:",
        };
        path.strip_prefix(prefix).unwrap_or(path)
    }
}

// ============================================================================
// Install Layout
// ============================================================================

/// Where the application runs from.
///
/// Captured once from the environment; tests build it by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    /// Current working directory
    pub working_dir: PathBuf,
    /// Path of the running binary
    pub current_exe: PathBuf,
    /// User home directory, if one could be determined
    pub home_dir: Option<PathBuf>,
}

impl InstallLayout {
    /// Reads the layout of the running process.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::Io` if the working directory or the
    /// running binary cannot be determined.
    pub fn detect() -> Result<Self> {
        let working_dir = std::env::current_dir()
            .map_err(|e| SupervisorError::io("failed to read working directory", e))?;
        let current_exe = std::env::current_exe()
            .map_err(|e| SupervisorError::io("failed to locate running binary", e))?;

        Ok(Self {
            working_dir,
            current_exe,
            home_dir: dirs::home_dir(),
        })
    }
}

// ============================================================================
// Platform Paths
// ============================================================================

/// Every filesystem location the supervisor touches.
///
/// Computed once per supervisor and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPaths {
    /// Daemon executable
    pub executable: PathBuf,
    /// Log the daemon writes for the current run (truncated per start)
    pub current_session_log: PathBuf,
    /// Append-only raw stdout of every run
    pub all_sessions_log: PathBuf,
    /// Exclusive lock held while a daemon is supervised
    pub lock_file: PathBuf,
    /// Directory bare wallet file names resolve against
    pub default_wallet_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolves paths for `platform` within `layout`.
    ///
    /// - Linux/Windows: everything lives in the working directory.
    /// - macOS: the daemon sits in the bundle's `Contents` directory (the
    ///   parent of the binary's directory), logs in the per-user
    ///   application-support directory, wallets in the home directory.
    ///
    /// # Errors
    ///
    /// On macOS, returns `SupervisorError::Io` when the home directory is
    /// unknown or the binary has no bundle parent.
    pub fn resolve(
        platform: Platform,
        layout: &InstallLayout,
        names: &DaemonNames,
        app_name: &str,
    ) -> Result<Self> {
        let executable_name = format!("{}{}", names.service, platform.executable_suffix());

        let (executable, data_dir, default_wallet_dir) = match platform {
            Platform::MacOs => {
                let home = layout.home_dir.clone().ok_or_else(|| {
                    SupervisorError::io(
                        "failed to find home directory",
                        std::io::Error::new(std::io::ErrorKind::NotFound, "no home directory"),
                    )
                })?;
                let contents = bundle_contents_dir(&layout.current_exe).ok_or_else(|| {
                    SupervisorError::io(
                        "failed to find application bundle",
                        std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            layout.current_exe.display().to_string(),
                        ),
                    )
                })?;
                let data_dir = home.join(MACOS_APP_SUPPORT).join(app_name);
                (contents.join(&executable_name), data_dir, home)
            }
            Platform::Linux | Platform::Windows => (
                layout.working_dir.join(&executable_name),
                layout.working_dir.clone(),
                layout.working_dir.clone(),
            ),
        };

        Ok(Self {
            executable,
            current_session_log: data_dir.join(names.current_session_log_name()),
            all_sessions_log: data_dir.join(names.all_sessions_log_name()),
            lock_file: data_dir.join(names.lock_file_name()),
            default_wallet_dir,
        })
    }

    /// Replaces the daemon executable path.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Resolves a wallet path handed over by a front end.
    ///
    /// Strips the `file:` URL prefix and anchors bare file names in the
    /// default wallet directory.
    pub fn resolve_wallet(&self, platform: Platform, wallet: &str) -> PathBuf {
        let path = Path::new(platform.strip_file_url(wallet));
        let is_bare = path
            .parent()
            .map(|p| p.as_os_str().is_empty())
            .unwrap_or(true);

        if is_bare {
            self.default_wallet_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// `Foo.app/Contents/MacOS/foo` -> `Foo.app/Contents`
fn bundle_contents_dir(current_exe: &Path) -> Option<PathBuf> {
    current_exe.parent()?.parent().map(Path::to_path_buf)
}

// ============================================================================
// Tests
// ============================================================================
