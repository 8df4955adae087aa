//! Domain-specific error types following panic-free policy.

use crate::Amount;
use thiserror::Error;

/// Reasons an outgoing transfer is rejected before it reaches the daemon.
///
/// Variants are listed in the order the checks run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Destination does not have the network prefix or the exact length
    #[error("address is invalid")]
    InvalidAddress,

    /// Destination is the wallet's own address
    #[error("sending to yourself is not supported")]
    SelfSend,

    /// Amount is not a number, is zero or negative, or carries more
    /// decimals than an atomic unit
    #[error("amount is invalid: it should be a number greater than 0 with at most 2 decimals")]
    InvalidAmount,

    /// Amount plus fee exceeds the available balance
    #[error("your available balance is insufficient")]
    InsufficientBalance,

    /// Amount exceeds the per-transaction ceiling
    #[error("for sending more than {max} to one address, you should split in multiple transfers of smaller amounts")]
    AmountTooLarge { max: Amount },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, TransferError>;
