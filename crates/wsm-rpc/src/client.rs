//! The RPC client interface the supervisor talks to the daemon through.

use async_trait::async_trait;

use crate::{
    Balance, DaemonStatus, RpcCredential, RpcResult, SpendKeys, TransactionQuery, Transfer,
    TransferRequest,
};

/// Operations the wallet daemon exposes over its local RPC channel.
///
/// Every call presents the credential the daemon was launched with.
/// Implementations own the wire format; the supervisor only sees these
/// typed calls and [`crate::RpcError`].
#[async_trait]
pub trait WalletRpc: Send + Sync {
    /// Available and locked balance of the open wallet.
    async fn balance(&self, credential: &RpcCredential) -> RpcResult<Balance>;

    /// Primary address of the open wallet.
    async fn address(&self, credential: &RpcCredential) -> RpcResult<String>;

    /// Block heights and peer count. Doubles as the readiness probe.
    async fn status(&self, credential: &RpcCredential) -> RpcResult<DaemonStatus>;

    /// Transactions in a block window for the given addresses.
    async fn list_transactions(
        &self,
        query: &TransactionQuery,
        credential: &RpcCredential,
    ) -> RpcResult<Vec<Transfer>>;

    /// Submits a transfer and returns its transaction hash.
    async fn send_transaction(
        &self,
        request: &TransferRequest,
        credential: &RpcCredential,
    ) -> RpcResult<String>;

    /// Private view key of the open wallet.
    async fn view_key(&self, credential: &RpcCredential) -> RpcResult<String>;

    /// Spend keys for one of the wallet's addresses.
    async fn spend_keys(&self, address: &str, credential: &RpcCredential) -> RpcResult<SpendKeys>;

    /// Flushes the wallet file to disk.
    async fn save_wallet(&self, credential: &RpcCredential) -> RpcResult<()>;
}
