//! Process discovery - finds daemons already running on the machine.
//!
//! Enumerates the OS process table and matches executable names against
//! the monitored daemons. Discovery is best effort: a scan that fails is
//! logged and reported as "nothing found", and the session lock in
//! [`crate::lock`] backs it up.
//!
//! # Async Safety
//!
//! The process-table scan is blocking and runs via `spawn_blocking`.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Discovery errors are logged but never fatal

use std::ffi::OsStr;
use std::sync::Arc;

use sysinfo::System;
use tracing::{debug, warn};

use crate::config::DaemonNames;
use crate::platform::Platform;

/// A running process whose name matched a monitored daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredProcess {
    pub pid: u32,
    /// The candidate name that matched
    pub name: String,
}

/// Source of process-table snapshots.
///
/// Implementations are blocking; callers go through
/// [`find_running_daemon`].
pub trait ProcessScanner: Send + Sync {
    /// Returns the first process whose executable name equals one of
    /// `names`.
    fn find_first(&self, names: &[String]) -> Option<DiscoveredProcess>;
}

/// Scanner backed by `sysinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessScanner;

impl ProcessScanner for SystemProcessScanner {
    fn find_first(&self, names: &[String]) -> Option<DiscoveredProcess> {
        let mut system = System::new();
        system.refresh_all();

        system.processes().iter().find_map(|(pid, process)| {
            names
                .iter()
                .find(|candidate| process.name() == OsStr::new(candidate.as_str()))
                .map(|candidate| DiscoveredProcess {
                    pid: pid.as_u32(),
                    name: candidate.clone(),
                })
        })
    }
}

/// Process names the platform may show for the monitored daemons.
pub fn daemon_names(names: &DaemonNames, platform: Platform) -> Vec<String> {
    let mut candidates = vec![names.service.clone(), names.node.clone()];
    let suffix = platform.executable_suffix();
    if !suffix.is_empty() {
        candidates.push(format!("{}{suffix}", names.service));
        candidates.push(format!("{}{suffix}", names.node));
    }
    candidates
}

/// Looks for a running daemon without blocking the runtime.
pub async fn find_running_daemon(
    scanner: Arc<dyn ProcessScanner>,
    names: Vec<String>,
) -> Option<DiscoveredProcess> {
    match tokio::task::spawn_blocking(move || scanner.find_first(&names)).await {
        Ok(Some(found)) => {
            debug!(pid = found.pid, name = %found.name, "Found running daemon");
            Some(found)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "Process scan task panicked");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_names_unix() {
        let names = daemon_names(&DaemonNames::default(), Platform::Linux);
        assert_eq!(names, vec!["anon-service".to_string(), "AnonCoind".to_string()]);
    }

    #[test]
    fn test_daemon_names_windows_adds_exe_variants() {
        let names = daemon_names(&DaemonNames::default(), Platform::Windows);
        assert!(names.contains(&"anon-service.exe".to_string()));
        assert!(names.contains(&"AnonCoind.exe".to_string()));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_system_scanner_ignores_unknown_names() {
        let scanner = SystemProcessScanner;
        let found = scanner.find_first(&["wsm-no-such-daemon-7f3a".to_string()]);
        assert!(found.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_finds_spawned_process() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .kill_on_drop(true)
            .spawn()
            .unwrap();

        let scanner: Arc<dyn ProcessScanner> = Arc::new(SystemProcessScanner);
        let found = find_running_daemon(scanner, vec!["sleep".to_string()]).await;
        assert!(found.is_some());
        assert_eq!(found.map(|p| p.name), Some("sleep".to_string()));

        child.kill().await.unwrap();
    }
}
