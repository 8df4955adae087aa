//! Wallet session state and chain sync classification.

use crate::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Local height may run ahead of the reported network height by this many
/// blocks before the wallet is considered out of sync (the network height
/// reading can be stale).
pub const KNOWN_HEIGHT_SLACK: u64 = 10;

/// Suffix appended to every not-yet-synced status message.
const TRANSFERS_BLOCKED: &str = " (No transfers allowed until synced)";

// ============================================================================
// Wallet Session
// ============================================================================

/// State of the wallet opened in the supervised daemon.
///
/// When `running` is false every other field holds its empty value.
/// Only the supervisor mutates this; front ends read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletSession {
    /// Address of the open wallet, empty until requested
    pub address: String,
    /// Spendable balance, as last reported by the daemon
    pub available_balance: Amount,
    /// Balance locked in unconfirmed transactions
    pub locked_balance: Amount,
    /// File name (no directory) of the open wallet
    pub filename: String,
    /// True while a daemon is up with this wallet open
    pub running: bool,
    /// True when the last status check classified the chain as synced
    pub synced: bool,
}

impl WalletSession {
    /// Creates the session for a freshly opened wallet.
    pub fn opened(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            running: true,
            ..Self::default()
        }
    }

    /// Resets every field to its empty value in one step.
    pub fn reset(&mut self) {
        debug!(filename = %self.filename, "Resetting wallet session");
        *self = Self::default();
    }

    /// Returns true if the session satisfies its invariant:
    /// a stopped session carries no data.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.running || *self == Self::default()
    }
}

// ============================================================================
// Sync Status
// ============================================================================

/// Chain sync classification derived from block-height counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// The daemon does not know the network height yet
    AcquiringHeight,
    /// Local height differs from network height
    Syncing,
    /// Local height matches network height
    Synced,
}

impl SyncStatus {
    /// Classifies local height `block_count` against the network height
    /// `known_block_count`.
    ///
    /// - known height 0: `AcquiringHeight`
    /// - local more than one block behind: `Syncing`
    /// - local more than [`KNOWN_HEIGHT_SLACK`] blocks ahead: `Syncing`
    /// - otherwise: `Synced`
    pub fn classify(block_count: u64, known_block_count: u64) -> Self {
        if known_block_count == 0 {
            return Self::AcquiringHeight;
        }

        let behind = block_count.saturating_add(1) < known_block_count;
        let ahead = block_count > known_block_count.saturating_add(KNOWN_HEIGHT_SLACK);

        if behind || ahead {
            Self::Syncing
        } else {
            Self::Synced
        }
    }

    /// Returns true only for `Synced`.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }

    /// Returns the user-facing status line.
    pub fn message(&self) -> String {
        match self {
            Self::AcquiringHeight => format!("Getting block count...{TRANSFERS_BLOCKED}"),
            Self::Syncing => format!("Wallet syncing...{TRANSFERS_BLOCKED}"),
            Self::Synced => "Wallet synced".to_string(),
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Chain connection snapshot returned to front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub sync: SyncStatus,
    pub block_count: u64,
    pub known_block_count: u64,
    pub peer_count: u64,
}

impl ConnectionInfo {
    /// Builds a snapshot, classifying sync state from the two heights.
    pub fn new(block_count: u64, known_block_count: u64, peer_count: u64) -> Self {
        Self {
            sync: SyncStatus::classify(block_count, known_block_count),
            block_count,
            known_block_count,
            peer_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_unknown_height() {
        assert_eq!(SyncStatus::classify(100, 0), SyncStatus::AcquiringHeight);
        assert_eq!(SyncStatus::classify(0, 0), SyncStatus::AcquiringHeight);
    }

    #[test]
    fn test_classify_synced() {
        assert_eq!(SyncStatus::classify(100, 100), SyncStatus::Synced);
        // One block behind is tolerated
        assert_eq!(SyncStatus::classify(99, 100), SyncStatus::Synced);
        // Slightly ahead of a stale network height is tolerated
        assert_eq!(SyncStatus::classify(110, 100), SyncStatus::Synced);
    }

    #[test]
    fn test_classify_syncing() {
        assert_eq!(SyncStatus::classify(50, 100), SyncStatus::Syncing);
        assert_eq!(SyncStatus::classify(98, 100), SyncStatus::Syncing);
        assert_eq!(SyncStatus::classify(111, 100), SyncStatus::Syncing);
    }

    #[test]
    fn test_classify_no_overflow_at_extremes() {
        assert_eq!(SyncStatus::classify(u64::MAX, u64::MAX), SyncStatus::Synced);
        assert_eq!(SyncStatus::classify(0, u64::MAX), SyncStatus::Syncing);
    }

    #[test]
    fn test_status_messages() {
        assert!(SyncStatus::AcquiringHeight.message().starts_with("Getting block count..."));
        assert!(SyncStatus::Syncing.message().contains("No transfers allowed"));
        assert_eq!(SyncStatus::Synced.to_string(), "Wallet synced");
    }

    #[test]
    fn test_connection_info_classifies() {
        let info = ConnectionInfo::new(50, 100, 8);
        assert_eq!(info.sync, SyncStatus::Syncing);
        assert!(!info.sync.is_synced());
        assert_eq!(info.peer_count, 8);
    }

    #[test]
    fn test_session_reset_restores_invariant() {
        let mut session = WalletSession::opened("alice.wallet");
        session.address = "TRTLabc".to_string();
        session.available_balance = Amount::from_coins(5.0);
        session.synced = true;
        assert!(session.is_consistent());

        session.reset();
        assert_eq!(session, WalletSession::default());
        assert!(!session.running);
        assert!(session.is_consistent());
    }

    #[test]
    fn test_stopped_session_with_data_is_inconsistent() {
        let session = WalletSession {
            address: "TRTLabc".to_string(),
            ..WalletSession::default()
        };
        assert!(!session.is_consistent());
    }
}
