//! WSM RPC - client seam for the wallet-service daemon
//!
//! Defines what the supervisor needs from the daemon's RPC channel:
//! - `WalletRpc` - async trait with one method per daemon call
//! - `RpcCredential` - per-session authentication token
//! - request/response types and `RpcError`
//!
//! The wire format lives in whichever implementation the application
//! plugs in; nothing here speaks a protocol.

pub mod client;
pub mod credential;
pub mod error;
pub mod types;

pub use client::WalletRpc;
pub use credential::RpcCredential;
pub use error::{RpcError, RpcResult};
pub use types::{
    Balance, DaemonStatus, SpendKeys, TransactionQuery, Transfer, TransferRequest,
};
