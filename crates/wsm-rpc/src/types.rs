//! Request and response types exchanged with the wallet daemon.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wsm_core::Amount;

/// Balances of the open wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub available: Amount,
    pub locked: Amount,
}

impl Balance {
    /// Available plus locked.
    pub fn total(&self) -> Amount {
        self.available + self.locked
    }
}

/// Answer to the status call, also used as the readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Height the wallet has synced to
    pub block_count: u64,
    /// Height the network is believed to have
    pub known_block_count: u64,
    /// Connected peers
    pub peer_count: u64,
}

/// One transaction touching the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub tx_hash: String,
    pub payment_id: String,
    pub timestamp: DateTime<Utc>,
    /// Negative for outgoing transfers
    pub amount: Amount,
    pub fee: Amount,
    pub block_index: u64,
    /// Counterparty address, when the daemon reports one
    pub address: String,
}

impl Transfer {
    /// Returns true if the wallet received funds in this transfer.
    pub fn is_incoming(&self) -> bool {
        self.amount.is_positive()
    }
}

/// Window of blocks and addresses to list transactions for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub first_block_index: u64,
    pub block_count: u64,
    pub addresses: Vec<String>,
}

/// Outgoing transfer, already validated by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub destination: String,
    pub amount: Amount,
    pub payment_id: String,
    pub fee: Amount,
    pub mixin: u32,
}

/// Spend key pair for an address.
#[derive(Clone, PartialEq, Eq)]
pub struct SpendKeys {
    pub private_key: String,
    pub public_key: String,
}

impl std::fmt::Debug for SpendKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpendKeys")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_total() {
        let balance = Balance {
            available: Amount::from_coins(10.5),
            locked: Amount::from_coins(2.0),
        };
        assert_eq!(balance.total(), Amount::from_coins(12.5));
    }

    #[test]
    fn test_transfer_direction() {
        let transfer = Transfer {
            tx_hash: "ab".repeat(32),
            payment_id: String::new(),
            timestamp: Utc::now(),
            amount: Amount::from_coins(-3.0),
            fee: Amount::from_coins(1.0),
            block_index: 12,
            address: String::new(),
        };
        assert!(!transfer.is_incoming());
    }

    #[test]
    fn test_spend_keys_debug_hides_private_key() {
        let keys = SpendKeys {
            private_key: "secret-spend".to_string(),
            public_key: "public-spend".to_string(),
        };
        let debug = format!("{keys:?}");
        assert!(!debug.contains("secret-spend"));
        assert!(debug.contains("public-spend"));
    }
}
