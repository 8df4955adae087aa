//! Network parameters and outgoing transfer validation.

use serde::{Deserialize, Serialize};

use crate::{Amount, DomainResult, TransferError};

/// Default address prefix for the network.
pub const DEFAULT_ADDRESS_PREFIX: &str = "TRTL";

/// Exact length of a valid address.
pub const DEFAULT_ADDRESS_LENGTH: usize = 99;

/// Fee attached to every transfer, in coins.
pub const DEFAULT_TRANSFER_FEE_COINS: f64 = 1.0;

/// Largest amount allowed in a single transfer, in coins.
pub const DEFAULT_MAX_TRANSFER_COINS: f64 = 5_000_000.0;

/// Ring size parameter passed with every transfer.
pub const DEFAULT_MIXIN: u32 = 4;

/// Network-dependent rules for addresses and transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Fixed prefix every address starts with.
    pub address_prefix: String,
    /// Exact character length of an address.
    pub address_length: usize,
    /// Fee added on top of every transfer.
    pub transfer_fee: Amount,
    /// Per-transaction ceiling.
    pub max_transfer: Amount,
    /// Mixin (ring size) requested from the daemon.
    pub mixin: u32,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            address_prefix: DEFAULT_ADDRESS_PREFIX.to_string(),
            address_length: DEFAULT_ADDRESS_LENGTH,
            transfer_fee: Amount::from_coins(DEFAULT_TRANSFER_FEE_COINS),
            max_transfer: Amount::from_coins(DEFAULT_MAX_TRANSFER_COINS),
            mixin: DEFAULT_MIXIN,
        }
    }
}

impl NetworkParams {
    /// Returns true if `address` has the network prefix and exact length.
    pub fn is_valid_address(&self, address: &str) -> bool {
        address.starts_with(&self.address_prefix) && address.len() == self.address_length
    }

    /// Validates an outgoing transfer and returns the parsed amount.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// address format, self-send, amount parse, balance, ceiling.
    ///
    /// # Errors
    ///
    /// One `TransferError` variant per failed check.
    pub fn validate_transfer(
        &self,
        own_address: &str,
        available: Amount,
        destination: &str,
        amount: &str,
    ) -> DomainResult<Amount> {
        if !self.is_valid_address(destination) {
            return Err(TransferError::InvalidAddress);
        }

        if destination == own_address {
            return Err(TransferError::SelfSend);
        }

        let amount = match Amount::parse(amount) {
            Some(a) if a.is_positive() => a,
            _ => return Err(TransferError::InvalidAmount),
        };

        if amount + self.transfer_fee > available {
            return Err(TransferError::InsufficientBalance);
        }

        if amount > self.max_transfer {
            return Err(TransferError::AmountTooLarge {
                max: self.max_transfer,
            });
        }

        Ok(amount)
    }
}
