//! WSM Core - Shared types for wallet-service supervision
//!
//! This crate provides the domain types shared between the RPC seam
//! (wsm-rpc) and the supervisor (wsm-supervisor).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod amount;
pub mod error;
pub mod session;
pub mod transfer;

// Re-exports for convenience
pub use amount::{Amount, COIN_DECIMALS};
pub use error::{DomainResult, TransferError};
pub use session::{ConnectionInfo, SyncStatus, WalletSession, KNOWN_HEIGHT_SLACK};
pub use transfer::NetworkParams;
