//! The daemon supervisor.
//!
//! [`Supervisor`] owns everything about the one daemon it may run: the
//! process handle, the RPC credential, the session lock and the cached
//! wallet session. All mutating operations take `&mut self`, so a
//! supervisor is driven by one caller at a time.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Starting -> Verifying -> Running -> Stopping -> Idle
//!            |            |
//!            +-> Failed <-+-> Idle
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - A spawned daemon is always killed before a startup or creation error
//!   is returned

mod process;
mod wallet;

pub use process::{DaemonProcess, LaunchArgs, LaunchMode};

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};
use wsm_core::WalletSession;
use wsm_rpc::{RpcCredential, WalletRpc};

use crate::config::SupervisorConfig;
use crate::credential::generate_credential;
use crate::discovery::{daemon_names, find_running_daemon, ProcessScanner, SystemProcessScanner};
use crate::error::{diagnosis, Result, SupervisorError};
use crate::lock::{LockError, SessionLock};
use crate::log_scan::{LineClass, LogTail, MarkerSet};
use crate::platform::{InstallLayout, Platform, PlatformPaths};

/// Header of a failed-start message.
const STARTUP_FAILED_HEADER: &str = "The wallet daemon could not be started.";

/// Header of a failed-creation message.
const CREATION_FAILED_HEADER: &str = "The wallet could not be created.";

/// Characters a new wallet's file name may not contain.
const FORBIDDEN_FILENAME_CHARS: [char; 4] = ['/', '\\', ' ', ':'];

// ============================================================================
// Supervisor State
// ============================================================================

/// Lifecycle state of the supervised daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    /// No daemon
    #[default]
    Idle,
    /// Spawning the daemon
    Starting,
    /// Waiting for the daemon to prove it is healthy
    Verifying,
    /// Daemon up and answering RPC
    Running,
    /// Shutting the daemon down
    Stopping,
    /// Start or creation failed; cleanup in progress
    Failed,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Verifying => "verifying",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a wallet-creation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreationOutcome {
    Created,
    Rejected,
    EndOfStream,
    TimedOut,
}

// ============================================================================
// Supervisor
// ============================================================================

/// Supervisor for a single wallet-service daemon.
pub struct Supervisor {
    config: SupervisorConfig,
    platform: Platform,
    paths: PlatformPaths,
    rpc: Arc<dyn WalletRpc>,
    scanner: Arc<dyn ProcessScanner>,
    state: SupervisorState,
    session: WalletSession,
    credential: Option<RpcCredential>,
    daemon: Option<DaemonProcess>,
    lock: Option<SessionLock>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("platform", &self.platform)
            .field("paths", &self.paths)
            .field("state", &self.state)
            .field("session", &self.session)
            .field("daemon", &self.daemon)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Creates a supervisor for the running installation.
    ///
    /// Paths are resolved from the process layout; the configured
    /// executable, if any, replaces the resolved one.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorError::Io` if the layout cannot be detected.
    pub fn new(config: SupervisorConfig, rpc: Arc<dyn WalletRpc>) -> Result<Self> {
        let platform = config.platform();
        let layout = InstallLayout::detect()?;
        let mut paths = PlatformPaths::resolve(platform, &layout, &config.daemon, &config.app_name)?;
        if let Some(executable) = &config.executable {
            paths = paths.with_executable(executable);
        }

        Ok(Self::with_parts(
            config,
            paths,
            rpc,
            Arc::new(SystemProcessScanner),
        ))
    }

    /// Creates a supervisor from explicit parts.
    pub fn with_parts(
        config: SupervisorConfig,
        paths: PlatformPaths,
        rpc: Arc<dyn WalletRpc>,
        scanner: Arc<dyn ProcessScanner>,
    ) -> Self {
        let platform = config.platform();
        debug!(
            platform = ?platform,
            executable = %paths.executable.display(),
            log = %paths.current_session_log.display(),
            "Supervisor configured"
        );

        Self {
            config,
            platform,
            paths,
            rpc,
            scanner,
            state: SupervisorState::Idle,
            session: WalletSession::default(),
            credential: None,
            daemon: None,
            lock: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Cached state of the open wallet.
    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn paths(&self) -> &PlatformPaths {
        &self.paths
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Returns true while a verified daemon is serving the wallet.
    pub fn is_running(&self) -> bool {
        self.state == SupervisorState::Running
    }

    /// The retained daemon, if any.
    pub fn daemon(&self) -> Option<&DaemonProcess> {
        self.daemon.as_ref()
    }

    /// Pid of the retained daemon, if any.
    pub fn daemon_pid(&self) -> Option<u32> {
        self.daemon.as_ref().map(DaemonProcess::pid)
    }

    // ------------------------------------------------------------------------
    // Start
    // ------------------------------------------------------------------------

    /// Starts the daemon on an existing wallet and waits until it answers.
    ///
    /// `wallet` may carry a `file:` URL prefix; a bare file name is looked
    /// up in the default wallet directory.
    ///
    /// # Errors
    ///
    /// - `Validation` if the path lacks the wallet extension
    /// - `Collision` if a daemon already runs or the session lock is held
    /// - `Io` if the output log cannot be opened or the daemon cannot be
    ///   spawned
    /// - `Startup` if the daemon never answered the status probe; the
    ///   daemon has been killed and the session reset
    pub async fn start(&mut self, wallet: &str, password: &str) -> Result<()> {
        let wallet_path = self.paths.resolve_wallet(self.platform, wallet);
        let extension = &self.config.wallet_extension;
        if !wallet_path.to_string_lossy().ends_with(extension.as_str()) {
            return Err(SupervisorError::Validation(format!(
                "the wallet file must end with {extension}"
            )));
        }

        let lock = self.claim_machine().await?;
        self.transition(SupervisorState::Starting);

        let output = match self.prepare_logs() {
            Ok(output) => output,
            Err(e) => {
                self.abandon(lock);
                return Err(e);
            }
        };

        let credential = generate_credential();
        let args = LaunchArgs {
            wallet: wallet_path.clone(),
            password: password.to_string(),
            log: self.paths.current_session_log.clone(),
            mode: LaunchMode::Open {
                credential: credential.clone(),
            },
        };

        let daemon = match DaemonProcess::spawn(&self.paths.executable, &args, output) {
            Ok(daemon) => daemon,
            Err(e) => {
                error!(error = %e, "Failed to spawn wallet daemon");
                self.abandon(lock);
                return Err(e);
            }
        };

        self.daemon = Some(daemon);
        self.lock = Some(lock);
        self.credential = Some(credential);

        self.transition(SupervisorState::Verifying);
        let mut tail = LogTail::new(&self.paths.current_session_log);
        let mut errors = Vec::new();

        if self.await_readiness(&mut tail, &mut errors).await {
            let filename = wallet_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            for line in &errors {
                warn!(error = %line, "Daemon logged an error during startup");
            }
            info!(pid = ?self.daemon_pid(), wallet = %filename, "Wallet daemon running");
            self.session = WalletSession::opened(filename);
            self.transition(SupervisorState::Running);
            return Ok(());
        }

        // Lines written just before the daemon gave up
        self.collect(&mut tail, &MarkerSet::startup(), &mut errors);

        self.transition(SupervisorState::Failed);
        self.force_cleanup().await;
        self.finish_session();
        self.transition(SupervisorState::Idle);

        let message = diagnosis(STARTUP_FAILED_HEADER, &self.paths.all_sessions_log, &errors);
        error!(errors = errors.len(), "Wallet daemon failed to start");
        Err(SupervisorError::Startup(message))
    }

    /// Probes the daemon with exponential backoff until it answers, exits
    /// or the attempts run out. Returns true if it answered.
    async fn await_readiness(&mut self, tail: &mut LogTail, errors: &mut Vec<String>) -> bool {
        let Some(credential) = self.credential.clone() else {
            return false;
        };
        let backoff = self.config.readiness;
        let mut delay = backoff.initial_delay;

        for attempt in 1..=backoff.max_attempts {
            sleep(delay).await;
            self.collect(tail, &MarkerSet::startup(), errors);

            if self.daemon_exited() {
                warn!(attempt, "Wallet daemon exited during startup");
                return false;
            }

            match self.rpc.status(&credential).await {
                Ok(status) => {
                    debug!(
                        attempt,
                        block_count = status.block_count,
                        peers = status.peer_count,
                        "Readiness probe succeeded"
                    );
                    return true;
                }
                Err(e) => {
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "Readiness probe failed");
                }
            }

            delay = backoff.next_delay(delay);
        }

        warn!(attempts = backoff.max_attempts, "Wallet daemon never answered");
        false
    }

    // ------------------------------------------------------------------------
    // Create Wallet
    // ------------------------------------------------------------------------

    /// Runs the daemon once to generate a new wallet, or to import one when
    /// keys are given.
    ///
    /// The wallet is written to `filename` in the default wallet
    /// directory. The daemon is gone when this returns.
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if this supervisor has a daemon
    /// - `Validation` for a bad file name or only one key
    /// - `Collision` as for [`Supervisor::start`]
    /// - `Creation` if the daemon reported an error, exited without
    ///   confirming, or timed out
    pub async fn create_wallet(
        &mut self,
        filename: &str,
        password: &str,
        view_key: &str,
        spend_key: &str,
    ) -> Result<()> {
        if self.state != SupervisorState::Idle || self.daemon.is_some() {
            return Err(SupervisorError::AlreadyRunning);
        }

        if filename.is_empty() {
            return Err(SupervisorError::Validation(
                "the wallet file name is empty".to_string(),
            ));
        }
        if filename.contains(&FORBIDDEN_FILENAME_CHARS[..]) {
            return Err(SupervisorError::Validation(
                "the wallet file name cannot contain /, \\, spaces or :".to_string(),
            ));
        }

        let mode = match (view_key.is_empty(), spend_key.is_empty()) {
            (true, true) => LaunchMode::Generate,
            (false, false) => LaunchMode::Import {
                view_key: view_key.to_string(),
                spend_key: spend_key.to_string(),
            },
            _ => {
                return Err(SupervisorError::Validation(
                    "both the view key and the spend key are required to import a wallet"
                        .to_string(),
                ))
            }
        };

        let lock = self.claim_machine().await?;
        self.transition(SupervisorState::Starting);

        let output = match self.prepare_logs() {
            Ok(output) => output,
            Err(e) => {
                self.abandon(lock);
                return Err(e);
            }
        };

        let args = LaunchArgs {
            wallet: self.paths.default_wallet_dir.join(filename),
            password: password.to_string(),
            log: self.paths.current_session_log.clone(),
            mode,
        };

        let daemon = match DaemonProcess::spawn(&self.paths.executable, &args, output) {
            Ok(daemon) => daemon,
            Err(e) => {
                error!(error = %e, "Failed to spawn wallet daemon");
                self.abandon(lock);
                return Err(e);
            }
        };

        self.daemon = Some(daemon);
        self.lock = Some(lock);
        self.transition(SupervisorState::Verifying);

        let mut errors = Vec::new();
        let outcome = self.watch_creation(&mut errors).await;

        if outcome == CreationOutcome::Created {
            info!(wallet = %filename, "Wallet created");
            self.transition(SupervisorState::Stopping);
            if let Some(mut daemon) = self.daemon.take() {
                daemon.wait_or_kill(self.config.timeouts.graceful_stop).await;
            }
            self.lock = None;
            self.transition(SupervisorState::Idle);
            return Ok(());
        }

        if outcome == CreationOutcome::TimedOut {
            errors.push(format!(
                "No answer from the wallet daemon after {} seconds.",
                self.config.timeouts.creation_timeout.as_secs()
            ));
        }

        self.transition(SupervisorState::Failed);
        self.force_cleanup().await;
        self.lock = None;
        self.transition(SupervisorState::Idle);

        error!(outcome = ?outcome, errors = errors.len(), "Wallet creation failed");
        let message = diagnosis(CREATION_FAILED_HEADER, &self.paths.all_sessions_log, &errors);
        Err(SupervisorError::Creation(message))
    }

    /// Polls the session log until the daemon confirms the wallet, reports
    /// an error, exits, or the creation timeout elapses.
    async fn watch_creation(&mut self, errors: &mut Vec<String>) -> CreationOutcome {
        let timeouts = self.config.timeouts;
        let deadline = Instant::now() + timeouts.creation_timeout;
        let markers = MarkerSet::creation();
        let mut tail = LogTail::new(&self.paths.current_session_log);

        loop {
            // Checked before draining so lines written just before exit are seen
            let exited = self.daemon_exited();

            let lines = match tail.drain(&markers) {
                Ok(lines) => lines,
                Err(e) => {
                    warn!(path = %tail.path().display(), error = %e, "Failed to read daemon log");
                    Vec::new()
                }
            };

            for line in lines {
                match line.class {
                    LineClass::Success if errors.is_empty() => return CreationOutcome::Created,
                    LineClass::Error(message) => errors.push(message),
                    LineClass::Success | LineClass::Normal => {
                        debug!(line = %line.text, "Daemon output");
                    }
                }
            }

            if !errors.is_empty() {
                return CreationOutcome::Rejected;
            }
            if exited {
                return CreationOutcome::EndOfStream;
            }
            if Instant::now() >= deadline {
                return CreationOutcome::TimedOut;
            }

            sleep(timeouts.creation_poll).await;
        }
    }

    // ------------------------------------------------------------------------
    // Stop
    // ------------------------------------------------------------------------

    /// Stops the running daemon. Does nothing unless running.
    ///
    /// Where the platform has a termination signal the daemon gets SIGTERM
    /// and the graceful window to exit; elsewhere the wallet is saved over
    /// RPC first. Either way the daemon is killed if it is still alive, and
    /// the session is cleared.
    pub async fn stop(&mut self) {
        if self.state != SupervisorState::Running {
            debug!(state = %self.state, "Stop ignored, daemon not running");
            return;
        }

        self.transition(SupervisorState::Stopping);

        if let Some(mut daemon) = self.daemon.take() {
            info!(pid = daemon.pid(), "Stopping wallet daemon");
            if self.platform.has_graceful_signal() {
                daemon.terminate();
                daemon.wait_or_kill(self.config.timeouts.graceful_stop).await;
            } else {
                if let Some(credential) = &self.credential {
                    if let Err(e) = self.rpc.save_wallet(credential).await {
                        error!(error = %e, "Failed to save wallet before stopping");
                    }
                }
                sleep(self.config.timeouts.save_grace).await;
                daemon.kill().await;
            }
        }

        self.finish_session();
        self.transition(SupervisorState::Idle);
        info!("Wallet daemon stopped");
    }

    /// Disposes of the retained daemon after a failed start or creation.
    ///
    /// Kills immediately on platforms without a termination signal;
    /// elsewhere the daemon gets the cleanup window to exit first.
    pub async fn force_cleanup(&mut self) {
        let Some(mut daemon) = self.daemon.take() else {
            return;
        };

        debug!(pid = daemon.pid(), "Cleaning up wallet daemon");
        if self.platform.has_graceful_signal() {
            daemon.wait_or_kill(self.config.timeouts.cleanup).await;
        } else {
            daemon.kill().await;
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn transition(&mut self, to: SupervisorState) {
        debug!(from = %self.state, to = %to, "Supervisor state transition");
        self.state = to;
    }

    /// Makes sure no other daemon occupies the machine and takes the
    /// session lock.
    async fn claim_machine(&self) -> Result<SessionLock> {
        if let Some(daemon) = &self.daemon {
            warn!(pid = daemon.pid(), "Daemon already retained by this supervisor");
            return Err(self.collision());
        }

        let names = daemon_names(&self.config.daemon, self.platform);
        if let Some(found) = find_running_daemon(Arc::clone(&self.scanner), names).await {
            warn!(pid = found.pid, name = %found.name, "Daemon already running");
            return Err(self.collision());
        }

        match SessionLock::try_acquire(&self.paths.lock_file) {
            Ok(lock) => Ok(lock),
            Err(LockError::Held) => {
                warn!(path = %self.paths.lock_file.display(), "Session lock held by another process");
                Err(self.collision())
            }
            Err(LockError::Io(e)) => Err(SupervisorError::io_at(
                "lock",
                &self.paths.lock_file,
                e,
            )),
        }
    }

    fn collision(&self) -> SupervisorError {
        SupervisorError::Collision {
            service: self.config.daemon.service.clone(),
            node: self.config.daemon.node.clone(),
            hint: self.platform.collision_hint(),
        }
    }

    /// Truncates the current-session log and opens the all-sessions log
    /// for the daemon's output.
    fn prepare_logs(&self) -> Result<File> {
        if let Err(e) = File::create(&self.paths.current_session_log) {
            error!(
                path = %self.paths.current_session_log.display(),
                error = %e,
                "Failed to truncate session log"
            );
        }

        open_append_private(&self.paths.all_sessions_log)
            .map_err(|e| SupervisorError::io_at("open", &self.paths.all_sessions_log, e))
    }

    /// Unwinds a start or creation that failed before a daemon existed.
    fn abandon(&mut self, lock: SessionLock) {
        drop(lock);
        self.transition(SupervisorState::Failed);
        self.transition(SupervisorState::Idle);
    }

    /// Clears everything tied to the last daemon.
    fn finish_session(&mut self) {
        self.session.reset();
        self.credential = None;
        self.daemon = None;
        self.lock = None;
    }

    fn daemon_exited(&mut self) -> bool {
        self.daemon.as_mut().map_or(true, DaemonProcess::has_exited)
    }

    fn collect(&self, tail: &mut LogTail, markers: &MarkerSet, errors: &mut Vec<String>) {
        match tail.drain(markers) {
            Ok(lines) => {
                errors.extend(lines.into_iter().filter_map(|line| match line.class {
                    LineClass::Error(message) => Some(message),
                    LineClass::Normal | LineClass::Success => None,
                }));
            }
            Err(e) => {
                warn!(path = %tail.path().display(), error = %e, "Failed to read daemon log");
            }
        }
    }
}

/// Opens `path` for appending, creating it owner-only on Unix.
fn open_append_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
