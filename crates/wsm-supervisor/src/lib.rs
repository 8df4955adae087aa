//! WSM Supervisor - lifecycle management for the wallet-service daemon
//!
//! This crate starts the daemon, proves it came up healthy, watches its log
//! for failure, serves wallet operations over the RPC seam and shuts it
//! down:
//! - `supervisor` - the `Supervisor` state machine and wallet operations
//! - `platform` - platform strategy and filesystem layout
//! - `discovery` - process-table scan for daemons already running
//! - `lock` - exclusive session lock next to the logs
//! - `log_scan` - incremental session-log reader and line classification
//! - `credential` - per-start RPC token
//! - `config` - TOML configuration and timeouts
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Supervisor                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  start/create ──▶ discovery + lock ──▶ spawn DaemonProcess   │
//! │                                           │                  │
//! │                        ┌──────────────────┴───────────┐      │
//! │                        ▼                              ▼      │
//! │                 LogTail (session log)      WalletRpc::status │
//! │                        │                              │      │
//! │                        └────────── verdict ◀──────────┘      │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The library installs no tracing subscriber; the embedding application
//! chooses where logs go.
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - A spawned daemon is never orphaned

pub mod config;
pub mod credential;
pub mod discovery;
pub mod error;
pub mod lock;
pub mod log_scan;
pub mod platform;
pub mod supervisor;

pub use config::{DaemonNames, ReadinessBackoff, SupervisorConfig, Timeouts};
pub use credential::generate_credential;
pub use discovery::{DiscoveredProcess, ProcessScanner, SystemProcessScanner};
pub use error::{Result, SupervisorError};
pub use lock::SessionLock;
pub use log_scan::{LineClass, LogTail, MarkerSet, ScannedLine};
pub use platform::{InstallLayout, Platform, PlatformPaths};
pub use supervisor::{Supervisor, SupervisorState};
