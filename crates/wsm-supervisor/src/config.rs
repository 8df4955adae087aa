//! Supervisor configuration.
//!
//! Every timeout the supervisor uses is a named constant here and an
//! overridable field of [`Timeouts`] or [`ReadinessBackoff`]. The whole
//! configuration can be loaded from TOML; missing keys keep their defaults
//! and durations are written in milliseconds.
//!
//! ```toml
//! app_name = "Nest"
//!
//! [daemon]
//! service = "anon-service"
//! node = "AnonCoind"
//!
//! [timeouts]
//! graceful_stop_ms = 8000
//!
//! [readiness]
//! max_attempts = 12
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wsm_core::NetworkParams;

use crate::error::{Result, SupervisorError};
use crate::platform::Platform;

/// Environment variable that overrides the daemon executable path.
pub const DAEMON_PATH_ENV: &str = "WSM_DAEMON_PATH";

/// Default wallet-service executable name.
pub const DEFAULT_SERVICE_NAME: &str = "anon-service";

/// Default node executable name (monitored for collisions only).
pub const DEFAULT_NODE_NAME: &str = "AnonCoind";

/// Default application name, used for the macOS support directory.
pub const DEFAULT_APP_NAME: &str = "wsm";

/// Extension every wallet file must carry.
pub const DEFAULT_WALLET_EXTENSION: &str = ".wallet";

/// How long a stopping daemon gets to exit after SIGTERM.
pub const GRACEFUL_STOP_WINDOW: Duration = Duration::from_secs(5);

/// How long to wait after an RPC save before a hard kill (no-signal platforms).
pub const SAVE_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// How long an aborted daemon gets to exit before it is killed.
pub const CLEANUP_WINDOW: Duration = Duration::from_millis(500);

/// How often the log is polled while a wallet is being created.
pub const CREATION_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound on wallet creation.
pub const CREATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Wait before the first readiness probe (the boot delay).
pub const READINESS_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Longest wait between readiness probes.
pub const READINESS_MAX_DELAY: Duration = Duration::from_secs(5);

/// Growth factor between readiness waits.
pub const READINESS_MULTIPLIER: f64 = 2.0;

/// Readiness probes before a start is declared failed.
pub const READINESS_MAX_ATTEMPTS: u32 = 10;

// ============================================================================
// Daemon Names
// ============================================================================

/// Executable names of the daemons that must not run twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonNames {
    /// The wallet service the supervisor launches
    pub service: String,
    /// The full node; never launched, but it holds the same resources
    pub node: String,
}

impl Default for DaemonNames {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE_NAME.to_string(),
            node: DEFAULT_NODE_NAME.to_string(),
        }
    }
}

impl DaemonNames {
    pub fn current_session_log_name(&self) -> String {
        format!("{}-session.log", self.service)
    }

    pub fn all_sessions_log_name(&self) -> String {
        format!("{}.log", self.service)
    }

    pub fn lock_file_name(&self) -> String {
        format!("{}.lock", self.service)
    }
}

// ============================================================================
// Timeouts
// ============================================================================

/// Fixed waits used while stopping and creating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    #[serde(rename = "graceful_stop_ms", with = "millis")]
    pub graceful_stop: Duration,
    #[serde(rename = "save_grace_ms", with = "millis")]
    pub save_grace: Duration,
    #[serde(rename = "cleanup_ms", with = "millis")]
    pub cleanup: Duration,
    #[serde(rename = "creation_poll_ms", with = "millis")]
    pub creation_poll: Duration,
    #[serde(rename = "creation_timeout_ms", with = "millis")]
    pub creation_timeout: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            graceful_stop: GRACEFUL_STOP_WINDOW,
            save_grace: SAVE_GRACE_PERIOD,
            cleanup: CLEANUP_WINDOW,
            creation_poll: CREATION_POLL_INTERVAL,
            creation_timeout: CREATION_TIMEOUT,
        }
    }
}

// ============================================================================
// Readiness Backoff
// ============================================================================

/// Retry schedule for the startup readiness probe.
///
/// Waits `initial_delay` before the first probe, then multiplies the wait
/// by `multiplier` after every failed probe, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessBackoff {
    #[serde(rename = "initial_delay_ms", with = "millis")]
    pub initial_delay: Duration,
    #[serde(rename = "max_delay_ms", with = "millis")]
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_attempts: u32,
}

impl Default for ReadinessBackoff {
    fn default() -> Self {
        Self {
            initial_delay: READINESS_INITIAL_DELAY,
            max_delay: READINESS_MAX_DELAY,
            multiplier: READINESS_MULTIPLIER,
            max_attempts: READINESS_MAX_ATTEMPTS,
        }
    }
}

impl ReadinessBackoff {
    /// Wait that follows `delay` (exponential backoff, capped).
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let next_delay_ms = (delay.as_millis() as f64 * self.multiplier) as u64;
        Duration::from_millis(next_delay_ms).min(self.max_delay)
    }

    /// Sum of every wait in the schedule.
    pub fn total_wait(&self) -> Duration {
        let mut delay = self.initial_delay;
        let mut total = Duration::ZERO;
        for _ in 0..self.max_attempts {
            total = total.saturating_add(delay);
            delay = self.next_delay(delay);
        }
        total
    }
}

// ============================================================================
// Supervisor Config
// ============================================================================

/// Complete supervisor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Platform strategy; detected from the build target when absent
    pub platform: Option<Platform>,
    /// Application name, used for the macOS support directory
    pub app_name: String,
    /// Extension wallet files must carry
    pub wallet_extension: String,
    /// Monitored daemon executable names
    pub daemon: DaemonNames,
    /// Explicit daemon executable, bypassing platform resolution
    pub executable: Option<PathBuf>,
    pub timeouts: Timeouts,
    pub readiness: ReadinessBackoff,
    pub network: NetworkParams,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            platform: None,
            app_name: DEFAULT_APP_NAME.to_string(),
            wallet_extension: DEFAULT_WALLET_EXTENSION.to_string(),
            daemon: DaemonNames::default(),
            executable: None,
            timeouts: Timeouts::default(),
            readiness: ReadinessBackoff::default(),
            network: NetworkParams::default(),
        }
    }
}

impl SupervisorConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::Config` if the text is not valid TOML or
    /// a value has the wrong type.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|e| SupervisorError::Config {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Loads configuration from a TOML file, or returns defaults if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::Io` if the file exists but cannot be read,
    /// `SupervisorError::Config` if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| SupervisorError::io_at("read config file", path, e))?;

        Self::from_toml_str(&contents, path)
    }

    /// Applies `WSM_DAEMON_PATH` if set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = std::env::var_os(DAEMON_PATH_ENV) {
            debug!(path = ?path, "Daemon executable overridden from environment");
            self.executable = Some(PathBuf::from(path));
        }
        self
    }

    /// Configured platform, or the build target's.
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }
}

/// Serde adapter for `Duration` as integer milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

// ============================================================================
// Tests
// ============================================================================
