//! Errors surfaced by the daemon RPC client.

use thiserror::Error;

/// Failure reported by a [`crate::WalletRpc`] implementation.
///
/// The supervisor wraps these without reinterpreting them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The daemon's RPC endpoint could not be reached
    #[error("wallet daemon unreachable: {0}")]
    Unreachable(String),

    /// The daemon rejected the RPC credential
    #[error("wallet daemon rejected the RPC credential")]
    Unauthorized,

    /// The daemon answered with an error
    #[error("wallet daemon error {code}: {message}")]
    Daemon { code: i64, message: String },

    /// The daemon answered with something that could not be decoded
    #[error("invalid response from wallet daemon: {0}")]
    InvalidResponse(String),
}

/// Result type for RPC calls.
pub type RpcResult<T> = Result<T, RpcError>;
