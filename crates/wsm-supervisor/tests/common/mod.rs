//! Shared fixtures for the supervisor integration tests.
//!
//! Tests CAN use `.unwrap()` and `.expect()`; production code is held to
//! the panic-free policy through assertions on its results.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use wsm_core::Amount;
use wsm_rpc::{
    Balance, DaemonStatus, RpcCredential, RpcError, RpcResult, SpendKeys, TransactionQuery,
    Transfer, TransferRequest, WalletRpc,
};
use wsm_supervisor::{
    DaemonNames, DiscoveredProcess, InstallLayout, Platform, PlatformPaths, ProcessScanner,
    ReadinessBackoff, Supervisor, SupervisorConfig, Timeouts,
};

/// A well-formed address owned by the test wallet.
pub fn own_address() -> String {
    address_filled_with('a')
}

/// A well-formed address owned by somebody else.
pub fn other_address() -> String {
    address_filled_with('b')
}

fn address_filled_with(fill: char) -> String {
    let mut address = String::from("TRTL");
    while address.len() < 99 {
        address.push(fill);
    }
    address
}

// ============================================================================
// Fake RPC
// ============================================================================

/// What the fake daemon answers and what it has been asked.
#[derive(Debug)]
pub struct FakeState {
    pub status: RpcResult<DaemonStatus>,
    pub balance: RpcResult<Balance>,
    pub address: RpcResult<String>,
    pub send_result: RpcResult<String>,
    pub transfers: Vec<Transfer>,
    /// Every credential presented to the status call, in order
    pub credentials: Vec<String>,
    pub saves: u32,
    pub sent: Vec<TransferRequest>,
    pub queries: Vec<TransactionQuery>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            status: Ok(DaemonStatus {
                block_count: 100,
                known_block_count: 100,
                peer_count: 8,
            }),
            balance: Ok(Balance {
                available: Amount::from_coins(100.0),
                locked: Amount::from_coins(5.0),
            }),
            address: Ok(own_address()),
            send_result: Ok("f".repeat(64)),
            transfers: Vec::new(),
            credentials: Vec::new(),
            saves: 0,
            sent: Vec::new(),
            queries: Vec::new(),
        }
    }
}

/// In-memory stand-in for the daemon's RPC channel.
#[derive(Debug, Default)]
pub struct FakeRpc {
    state: Mutex<FakeState>,
}

impl FakeRpc {
    /// A daemon that answers every call.
    pub fn ready() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A daemon whose RPC port never opens.
    pub fn unreachable() -> Arc<Self> {
        let rpc = Self::default();
        rpc.update(|s| s.status = Err(RpcError::Unreachable("connection refused".into())));
        Arc::new(rpc)
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn read<T>(&self, f: impl FnOnce(&FakeState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }
}

#[async_trait]
impl WalletRpc for FakeRpc {
    async fn balance(&self, _: &RpcCredential) -> RpcResult<Balance> {
        self.read(|s| s.balance.clone())
    }

    async fn address(&self, _: &RpcCredential) -> RpcResult<String> {
        self.read(|s| s.address.clone())
    }

    async fn status(&self, credential: &RpcCredential) -> RpcResult<DaemonStatus> {
        let mut state = self.state.lock().unwrap();
        state.credentials.push(credential.expose().to_string());
        state.status.clone()
    }

    async fn list_transactions(
        &self,
        query: &TransactionQuery,
        _: &RpcCredential,
    ) -> RpcResult<Vec<Transfer>> {
        let mut state = self.state.lock().unwrap();
        state.queries.push(query.clone());
        Ok(state.transfers.clone())
    }

    async fn send_transaction(
        &self,
        request: &TransferRequest,
        _: &RpcCredential,
    ) -> RpcResult<String> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(request.clone());
        state.send_result.clone()
    }

    async fn view_key(&self, _: &RpcCredential) -> RpcResult<String> {
        Ok("view-private".to_string())
    }

    async fn spend_keys(&self, _: &str, _: &RpcCredential) -> RpcResult<SpendKeys> {
        Ok(SpendKeys {
            private_key: "spend-private".to_string(),
            public_key: "spend-public".to_string(),
        })
    }

    async fn save_wallet(&self, _: &RpcCredential) -> RpcResult<()> {
        self.update(|s| s.saves += 1);
        Ok(())
    }
}

// ============================================================================
// Fake Scanner
// ============================================================================

/// Process scanner with a fixed answer.
#[derive(Debug, Default)]
pub struct FakeScanner {
    pub found: Option<DiscoveredProcess>,
}

impl FakeScanner {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn finding(name: &str) -> Arc<Self> {
        Arc::new(Self {
            found: Some(DiscoveredProcess {
                pid: 4242,
                name: name.to_string(),
            }),
        })
    }
}

impl ProcessScanner for FakeScanner {
    fn find_first(&self, names: &[String]) -> Option<DiscoveredProcess> {
        self.found
            .clone()
            .filter(|found| names.iter().any(|name| *name == found.name))
    }
}

// ============================================================================
// Fake Daemons
// ============================================================================

/// Serves forever and exits on SIGTERM.
pub const SERVING: &str = "exec sleep 600";

/// Serves forever and ignores SIGTERM.
pub const IGNORES_TERM: &str = "trap '' TERM\nexec sleep 600";

/// Writes `body` as an executable shell script that finds its `-l` log
/// argument in `$log`.
#[cfg(unix)]
pub fn write_daemon(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        "#!/bin/sh\n\
         log=/dev/null\n\
         while [ $# -gt 0 ]; do\n\
         \x20 if [ \"$1\" = \"-l\" ]; then log=\"$2\"; fi\n\
         \x20 shift\n\
         done\n\
         {body}\n"
    );
    let path = dir.join("anon-service");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// ============================================================================
// Supervisor Construction
// ============================================================================

/// Timeouts short enough for tests.
pub fn test_config(platform: Platform) -> SupervisorConfig {
    SupervisorConfig {
        platform: Some(platform),
        timeouts: Timeouts {
            graceful_stop: Duration::from_millis(300),
            save_grace: Duration::from_millis(50),
            cleanup: Duration::from_millis(100),
            creation_poll: Duration::from_millis(20),
            creation_timeout: Duration::from_secs(5),
        },
        readiness: ReadinessBackoff {
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_attempts: 5,
        },
        ..SupervisorConfig::default()
    }
}

/// Paths rooted in `dir` with `executable` as the daemon.
pub fn test_paths(dir: &Path, executable: &Path) -> PlatformPaths {
    let layout = InstallLayout {
        working_dir: dir.to_path_buf(),
        current_exe: dir.join("wsm"),
        home_dir: None,
    };
    PlatformPaths::resolve(Platform::Linux, &layout, &DaemonNames::default(), "wsm")
        .unwrap()
        .with_executable(executable)
}

/// A supervisor on `platform` with a fake daemon running `body`.
#[cfg(unix)]
pub fn supervisor_with(
    dir: &TempDir,
    platform: Platform,
    body: &str,
    rpc: Arc<FakeRpc>,
    scanner: Arc<FakeScanner>,
) -> Supervisor {
    let executable = write_daemon(dir.path(), body);
    Supervisor::with_parts(
        test_config(platform),
        test_paths(dir.path(), &executable),
        rpc,
        scanner,
    )
}

/// True if a process with `pid` still exists.
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    // SAFETY: signal 0 only checks for existence
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}
