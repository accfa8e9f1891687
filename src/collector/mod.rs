//! Collector registry and one-time subsystem initialization.

pub mod snapshot;

use std::sync::Mutex;

use tracing::debug;

use crate::error::Result;
use crate::host::{Host, HostDump};

pub use snapshot::Snapshot;

/// Ordered mapping from collector id to parsed snapshot, built fresh per
/// collection cycle. Iteration order is the host's registry order.
pub struct Registry {
    entries: Vec<(String, Snapshot)>,
}

impl Registry {
    /// Parse a host dump. Collectors whose snapshot is `null` (or not an
    /// object) are dropped here, never emitted as empty records.
    pub fn from_dump(dump: HostDump) -> Self {
        let entries = dump
            .collectors
            .into_iter()
            .filter_map(|(id, value)| Snapshot::from_value(&id, value).map(|snap| (id, snap)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&Snapshot> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, snap)| snap)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Snapshot)> {
        self.entries.iter().map(|(id, snap)| (id.as_str(), snap))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lifecycle of the one-time collector bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Guards the process-wide, initialize-once collector bootstrap.
///
/// The host process model is single-invocation-at-a-time, so this is a
/// simple guarded state machine rather than a contended lock: re-entrant
/// calls while `Ready` are no-ops, and a failed bootstrap resets to
/// `Uninitialized` so the next invocation retries.
pub struct InitGuard {
    state: Mutex<InitState>,
}

impl InitGuard {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(InitState::Uninitialized),
        }
    }

    pub fn state(&self) -> InitState {
        *self.state.lock().unwrap()
    }

    /// Ensure the host's collector subsystem is bootstrapped.
    pub async fn ensure(&self, host: &dyn Host) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            match *state {
                InitState::Ready => return Ok(()),
                // A re-entrant call mid-bootstrap: host init is idempotent,
                // so the in-flight attempt covers this caller too.
                InitState::Initializing => return Ok(()),
                InitState::Uninitialized => *state = InitState::Initializing,
            }
        }

        match host.init().await {
            Ok(()) => {
                debug!(host = host.name(), "collector subsystem initialized");
                *self.state.lock().unwrap() = InitState::Ready;
                Ok(())
            }
            Err(e) => {
                *self.state.lock().unwrap() = InitState::Uninitialized;
                Err(e.into())
            }
        }
    }
}

impl Default for InitGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide init flag shared by all entry points.
pub static COLLECTOR_INIT: InitGuard = InitGuard::new();

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FixtureHost;
    use serde_json::json;

    fn registry(doc: serde_json::Value) -> Registry {
        Registry::from_dump(HostDump::from_value(doc).unwrap())
    }

    #[test]
    fn test_null_collectors_dropped() {
        let reg = registry(json!({
            "collectors": {
                "cache": {"stats": {"hits": 1, "misses": 0, "total": 1}},
                "theme": null,
            }
        }));

        assert_eq!(reg.len(), 1);
        assert!(reg.get("cache").is_some());
        assert!(reg.get("theme").is_none());
    }

    #[test]
    fn test_iteration_order_matches_dump() {
        let reg = registry(json!({
            "collectors": {
                "http": {},
                "environment": {},
                "hooks": {},
            }
        }));

        let ids: Vec<&str> = reg.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["http", "environment", "hooks"]);
    }

    #[tokio::test]
    async fn test_init_guard_transitions_to_ready_once() {
        let host = FixtureHost::from_value(json!({})).unwrap();
        let guard = InitGuard::new();
        assert_eq!(guard.state(), InitState::Uninitialized);

        guard.ensure(&host).await.unwrap();
        assert_eq!(guard.state(), InitState::Ready);

        // Redundant calls are no-ops.
        guard.ensure(&host).await.unwrap();
        assert_eq!(guard.state(), InitState::Ready);
    }

    #[tokio::test]
    async fn test_init_guard_resets_on_failure() {
        let host = FixtureHost::from_value(json!({"reachable": false})).unwrap();
        let guard = InitGuard::new();

        assert!(guard.ensure(&host).await.is_err());
        assert_eq!(guard.state(), InitState::Uninitialized);

        // A later attempt against a healthy host succeeds.
        let healthy = FixtureHost::from_value(json!({})).unwrap();
        guard.ensure(&healthy).await.unwrap();
        assert_eq!(guard.state(), InitState::Ready);
    }
}
