//! Wallet queries and transfers against the running daemon.
//!
//! Every call presents the credential of the current session. RPC
//! failures are returned unchanged and leave the cached session as it was.

use tracing::{debug, error, info};
use wsm_core::{ConnectionInfo, SyncStatus, TransferError};
use wsm_rpc::{Balance, RpcCredential, RpcError, TransactionQuery, Transfer, TransferRequest};

use super::Supervisor;
use crate::error::{Result, SupervisorError};

/// First block scanned when listing transactions.
const FIRST_BLOCK_INDEX: u64 = 1;

/// Logs a failed RPC call and wraps its error.
fn rpc_failed(operation: &'static str) -> impl FnOnce(RpcError) -> SupervisorError {
    move |e: RpcError| {
        error!(operation, error = %e, "Wallet daemon request failed");
        SupervisorError::Rpc(e)
    }
}

impl Supervisor {
    fn session_credential(&self) -> Result<RpcCredential> {
        self.credential.clone().ok_or(SupervisorError::NotRunning)
    }

    /// Fetches the balance and caches available and locked amounts.
    ///
    /// # Errors
    ///
    /// `NotRunning` without a daemon, `Rpc` if the daemon call fails.
    pub async fn request_balance(&mut self) -> Result<Balance> {
        let credential = self.session_credential()?;
        let balance = self
            .rpc
            .balance(&credential)
            .await
            .map_err(rpc_failed("balance"))?;

        self.session.available_balance = balance.available;
        self.session.locked_balance = balance.locked;
        debug!(available = %balance.available, locked = %balance.locked, "Balance updated");
        Ok(balance)
    }

    /// Fetches the wallet address and caches it.
    ///
    /// # Errors
    ///
    /// `NotRunning` without a daemon, `Rpc` if the daemon call fails.
    pub async fn request_address(&mut self) -> Result<String> {
        let credential = self.session_credential()?;
        let address = self
            .rpc
            .address(&credential)
            .await
            .map_err(rpc_failed("address"))?;

        self.session.address = address.clone();
        Ok(address)
    }

    /// Fetches block heights and peers, and caches whether the wallet is
    /// synced.
    ///
    /// # Errors
    ///
    /// `NotRunning` without a daemon, `Rpc` if the daemon call fails.
    pub async fn request_connection_info(&mut self) -> Result<ConnectionInfo> {
        let credential = self.session_credential()?;
        let status = self
            .rpc
            .status(&credential)
            .await
            .map_err(rpc_failed("status"))?;

        let info = ConnectionInfo::new(
            status.block_count,
            status.known_block_count,
            status.peer_count,
        );
        self.session.synced = info.sync.is_synced();
        if info.sync != SyncStatus::Synced {
            debug!(
                block_count = status.block_count,
                known_block_count = status.known_block_count,
                status = %info.sync,
                "Wallet not synced"
            );
        }
        Ok(info)
    }

    /// Lists every transaction of the wallet's own address, from the first
    /// block up to the wallet's current height.
    ///
    /// # Errors
    ///
    /// `NotRunning` without a daemon, `Rpc` if a daemon call fails.
    pub async fn request_list_transactions(&mut self) -> Result<Vec<Transfer>> {
        let credential = self.session_credential()?;
        let address = self.own_address().await?;
        let status = self
            .rpc
            .status(&credential)
            .await
            .map_err(rpc_failed("status"))?;

        let query = TransactionQuery {
            first_block_index: FIRST_BLOCK_INDEX,
            block_count: status.block_count,
            addresses: vec![address],
        };

        let transfers = self
            .rpc
            .list_transactions(&query, &credential)
            .await
            .map_err(rpc_failed("list_transactions"))?;

        debug!(count = transfers.len(), block_count = query.block_count, "Listed transactions");
        Ok(transfers)
    }

    /// Validates and submits a transfer, returning the transaction hash.
    ///
    /// Validation uses the cached available balance; callers refresh it
    /// and check sync status first.
    ///
    /// # Errors
    ///
    /// - `NotRunning` without a daemon
    /// - `Transfer` if the destination or amount is rejected
    /// - `Rpc` if the daemon call fails
    pub async fn send_transaction(
        &mut self,
        destination: &str,
        amount: &str,
        payment_id: &str,
    ) -> Result<String> {
        let credential = self.session_credential()?;
        if !self.config.network.is_valid_address(destination) {
            return Err(TransferError::InvalidAddress.into());
        }
        let own_address = self.own_address().await?;

        let network = &self.config.network;
        let amount = network.validate_transfer(
            &own_address,
            self.session.available_balance,
            destination,
            amount,
        )?;

        let request = TransferRequest {
            destination: destination.to_string(),
            amount,
            payment_id: payment_id.to_string(),
            fee: network.transfer_fee,
            mixin: network.mixin,
        };

        let tx_hash = self
            .rpc
            .send_transaction(&request, &credential)
            .await
            .map_err(rpc_failed("send_transaction"))?;

        info!(amount = %amount, tx_hash = %tx_hash, "Transfer submitted");
        Ok(tx_hash)
    }

    /// Private view key and private spend key of the open wallet.
    ///
    /// # Errors
    ///
    /// `NotRunning` without a daemon, `Rpc` if a daemon call fails.
    pub async fn private_keys(&mut self) -> Result<(String, String)> {
        let credential = self.session_credential()?;
        let address = self.own_address().await?;

        let view_key = self
            .rpc
            .view_key(&credential)
            .await
            .map_err(rpc_failed("view_key"))?;
        let spend_keys = self
            .rpc
            .spend_keys(&address, &credential)
            .await
            .map_err(rpc_failed("spend_keys"))?;

        Ok((view_key, spend_keys.private_key))
    }

    /// Cached address, fetched once if not known yet.
    async fn own_address(&mut self) -> Result<String> {
        if self.session.address.is_empty() {
            self.request_address().await
        } else {
            Ok(self.session.address.clone())
        }
    }
}
