//! Error types for the daemon supervisor.
//!
//! This module defines every failure the supervisor reports: bad caller
//! input, a daemon already occupying the machine, a daemon that failed
//! verification, and wrapped RPC and I/O failures.
//!
//! Startup and creation failures carry the daemon's own error lines so the
//! operator sees the daemon's diagnosis rather than a generic wrapper.
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use wsm_core::TransferError;
use wsm_rpc::RpcError;

// ============================================================================
// Supervisor Error Type
// ============================================================================

/// Supervisor errors.
///
/// # Side effects
///
/// - `Validation`, `Transfer`, `Collision` and `AlreadyRunning` are raised
///   before any process is spawned.
/// - `Startup` and `Creation` are raised only after the spawned daemon has
///   been killed.
/// - `Rpc` leaves cached wallet state untouched.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Malformed caller input (wallet extension, file name characters, keys).
    #[error("{0}")]
    Validation(String),

    /// Outgoing transfer rejected before reaching the daemon.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// A daemon instance already occupies the machine.
    ///
    /// The message names both monitored daemons and tells the user where
    /// to close them on this platform.
    #[error("{service} or {node} is already running in the background.\nPlease close it via {hint}.")]
    Collision {
        /// Wallet service executable name
        service: String,
        /// Node executable name
        node: String,
        /// Platform-specific place to close processes
        hint: &'static str,
    },

    /// Wallet creation requested while a session is active.
    #[error("the wallet daemon is already running. It should be stopped before being able to generate a new wallet")]
    AlreadyRunning,

    /// Wallet operation requested without a running daemon.
    #[error("the wallet daemon is not running")]
    NotRunning,

    /// Daemon spawned but never became ready.
    #[error("{0}")]
    Startup(String),

    /// Daemon spawned in creation mode but never confirmed the wallet.
    #[error("{0}")]
    Creation(String),

    /// Failure reported by the daemon RPC client.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// Filesystem or process I/O failure.
    #[error("{context}: {source}")]
    Io {
        /// What the supervisor was doing
        context: String,
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be loaded.
    #[error("invalid configuration in {path}: {reason}")]
    Config {
        path: PathBuf,
        reason: String,
    },
}

impl SupervisorError {
    /// Wraps an I/O error with a description of the failed step.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wraps an I/O error on a specific path.
    pub fn io_at(action: &str, path: &Path, source: io::Error) -> Self {
        Self::io(format!("failed to {action} {}", path.display()), source)
    }
}

// ============================================================================
// Daemon Diagnosis
// ============================================================================

/// Builds a startup/creation failure message: a header naming the
/// all-sessions log, then every error line the daemon wrote, one per line.
pub(crate) fn diagnosis(header: &str, all_sessions_log: &Path, errors: &[String]) -> String {
    let mut message = format!(
        "{header} More info in the file {}\n",
        all_sessions_log.display()
    );
    for line in errors {
        message.push_str(line);
        message.push('\n');
    }
    message
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Convenience Result type alias for supervisor operations.
pub type Result<T> = std::result::Result<T, SupervisorError>;

// ============================================================================
// Tests
// ============================================================================
