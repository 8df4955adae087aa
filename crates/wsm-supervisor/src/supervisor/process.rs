//! Spawning and terminating the daemon process.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use wsm_rpc::RpcCredential;

use crate::error::{Result, SupervisorError};

/// Placeholder printed instead of secrets in command lines.
const REDACTED: &str = "<redacted>";

// ============================================================================
// Launch Arguments
// ============================================================================

/// What the daemon is launched to do.
#[derive(Debug, Clone)]
pub enum LaunchMode {
    /// Open an existing wallet and serve RPC
    Open { credential: RpcCredential },
    /// Generate a new wallet and exit
    Generate,
    /// Import a wallet from its keys and exit
    Import { view_key: String, spend_key: String },
}

/// Full daemon command line.
#[derive(Debug, Clone)]
pub struct LaunchArgs {
    pub wallet: PathBuf,
    pub password: String,
    pub log: PathBuf,
    pub mode: LaunchMode,
}

impl LaunchArgs {
    /// Arguments in the order the daemon expects.
    pub fn to_args(&self) -> Vec<OsString> {
        self.render(false)
    }

    /// Arguments with the password, keys and credential masked, for logs.
    pub fn redacted(&self) -> String {
        self.render(true)
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn render(&self, redact: bool) -> Vec<OsString> {
        let secret = |value: &str| -> OsString {
            if redact {
                REDACTED.into()
            } else {
                value.into()
            }
        };

        let mut args: Vec<OsString> = vec![
            "-w".into(),
            self.wallet.clone().into_os_string(),
            "-p".into(),
            secret(&self.password),
        ];

        match &self.mode {
            LaunchMode::Open { credential } => {
                args.push("-l".into());
                args.push(self.log.clone().into_os_string());
                args.push("--local".into());
                args.push("--rpc-password".into());
                args.push(secret(credential.expose()));
            }
            LaunchMode::Generate => {
                args.push("-l".into());
                args.push(self.log.clone().into_os_string());
                args.push("-g".into());
            }
            LaunchMode::Import {
                view_key,
                spend_key,
            } => {
                args.push("--view-key".into());
                args.push(secret(view_key));
                args.push("--spend-key".into());
                args.push(secret(spend_key));
                args.push("-l".into());
                args.push(self.log.clone().into_os_string());
                args.push("-g".into());
            }
        }

        args
    }
}

// ============================================================================
// Daemon Process
// ============================================================================

/// Handle to the spawned daemon.
///
/// The child is spawned with `kill_on_drop`, so dropping the handle never
/// leaves the daemon running.
#[derive(Debug)]
pub struct DaemonProcess {
    child: Child,
    pid: u32,
    command_line: String,
    started_at: DateTime<Utc>,
}

impl DaemonProcess {
    /// Spawns `executable` with `args`, stdout and stderr appended to
    /// `output` and stdin closed.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::Io` if the process cannot be spawned.
    pub fn spawn(executable: &Path, args: &LaunchArgs, output: File) -> Result<Self> {
        let command_line = format!("{} {}", executable.display(), args.redacted());

        let stderr = match output.try_clone() {
            Ok(file) => Stdio::from(file),
            Err(e) => {
                warn!(error = %e, "Failed to share daemon output file with stderr");
                Stdio::null()
            }
        };

        let child = Command::new(executable)
            .args(args.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(output))
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SupervisorError::io_at("spawn", executable, e))?;

        let pid = child.id().unwrap_or_default();
        info!(pid, command = %command_line, "Spawned wallet daemon");

        Ok(Self {
            child,
            pid,
            command_line,
            started_at: Utc::now(),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Command line with secrets masked.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns true if the daemon has exited. Does not wait.
    pub fn has_exited(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = self.pid, status = %status, "Daemon exited");
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(pid = self.pid, error = %e, "Failed to poll daemon status");
                false
            }
        }
    }

    /// Asks the daemon to exit with SIGTERM.
    ///
    /// Returns false if the signal could not be sent or the platform has
    /// no termination signal.
    pub fn terminate(&self) -> bool {
        #[cfg(unix)]
        {
            let Ok(pid) = libc::pid_t::try_from(self.pid) else {
                return false;
            };
            // SAFETY: kill(2) has no memory-safety preconditions
            let result = unsafe { libc::kill(pid, libc::SIGTERM) };
            if result != 0 {
                warn!(pid = self.pid, "Failed to send SIGTERM to daemon");
                return false;
            }
            debug!(pid = self.pid, "Sent SIGTERM to daemon");
            true
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Waits up to `window` for the daemon to exit.
    ///
    /// Returns the exit status, or `None` if the window elapsed first.
    pub async fn wait_for_exit(&mut self, window: Duration) -> Option<ExitStatus> {
        tokio::select! {
            status = self.child.wait() => match status {
                Ok(status) => {
                    debug!(pid = self.pid, status = %status, "Daemon exited");
                    Some(status)
                }
                Err(e) => {
                    warn!(pid = self.pid, error = %e, "Failed to wait for daemon");
                    None
                }
            },
            _ = tokio::time::sleep(window) => {
                debug!(pid = self.pid, window_ms = window.as_millis() as u64, "Daemon still running");
                None
            }
        }
    }

    /// Kills the daemon and reaps it.
    pub async fn kill(&mut self) {
        match self.child.kill().await {
            Ok(()) => info!(pid = self.pid, "Killed wallet daemon"),
            Err(e) => debug!(pid = self.pid, error = %e, "Kill failed, daemon already gone"),
        }
    }

    /// Gives the daemon `window` to exit on its own, then kills it.
    pub async fn wait_or_kill(&mut self, window: Duration) {
        if self.wait_for_exit(window).await.is_none() {
            warn!(pid = self.pid, "Daemon did not exit in time, killing it");
            self.kill().await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
