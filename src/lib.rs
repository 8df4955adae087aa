//! WSM - supervisor for a local wallet-service daemon
//!
//! Facade over the workspace crates:
//! - [`domain`] - amounts, wallet session, sync classification, transfer rules
//! - [`rpc`] - the `WalletRpc` seam the daemon is driven through
//! - [`supervisor`] - platform layout, discovery, log scanning and the
//!   `Supervisor` lifecycle
//!
//! # Usage
//!
//! ```no_run
//! # async fn run(rpc: std::sync::Arc<dyn wsm::WalletRpc>) -> wsm::Result<()> {
//! use std::path::Path;
//! use wsm::{Supervisor, SupervisorConfig};
//!
//! let config = SupervisorConfig::load(Path::new("wsm.toml"))?.with_env_overrides();
//! let mut supervisor = Supervisor::new(config, rpc)?;
//!
//! supervisor.start("main.wallet", "password").await?;
//! let balance = supervisor.request_balance().await?;
//! println!("available: {}", balance.available);
//! supervisor.stop().await;
//! # Ok(())
//! # }
//! ```

pub use wsm_core as domain;
pub use wsm_rpc as rpc;
pub use wsm_supervisor as supervisor;

pub use wsm_core::{Amount, ConnectionInfo, NetworkParams, SyncStatus, TransferError, WalletSession};
pub use wsm_rpc::{Balance, RpcCredential, RpcError, Transfer, WalletRpc};
pub use wsm_supervisor::{
    Platform, PlatformPaths, Result, Supervisor, SupervisorConfig, SupervisorError,
    SupervisorState,
};
