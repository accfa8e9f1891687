//! Bridge to the WordPress host running Query Monitor.
//!
//! The collectors themselves (query tracing, HTTP interception, hook
//! instrumentation) live in the host. This crate only asks the host for a
//! point-in-time dump of every collector's data and reshapes it. The
//! [`Host`] trait is the seam: [`WpCliHost`] shells out to WP-CLI in
//! production, [`FixtureHost`] replays a pre-recorded dump for offline use
//! and tests.

mod fixture;
mod wp_cli;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use fixture::FixtureHost;
pub use wp_cli::WpCliHost;

/// Errors from the host bridge.
#[derive(Debug)]
pub enum HostError {
    /// The host or the Query Monitor plugin is unreachable.
    Unreachable(String),

    /// A command run under observation failed.
    CommandFailed(String),

    /// The collector dump could not be parsed.
    BadDump(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Unreachable(msg) => write!(f, "host unreachable: {}", msg),
            HostError::CommandFailed(msg) => write!(f, "command failed: {}", msg),
            HostError::BadDump(msg) => write!(f, "bad collector dump: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

/// Post metadata as resolved by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRef {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub post_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub permalink: String,
}

/// Scope for an inspection collection cycle: the host simulates loading
/// this post/URL before collectors are processed.
#[derive(Debug, Clone, Default)]
pub struct InspectContext {
    pub post_id: Option<u64>,
    pub url: Option<String>,
}

/// One collection cycle's worth of raw collector data, in the host's
/// registry iteration order. A `Value::Null` snapshot means the collector
/// produced nothing and is omitted downstream.
#[derive(Debug, Default)]
pub struct HostDump {
    pub collectors: Vec<(String, Value)>,
}

impl HostDump {
    /// Parse the wire shape: `{"collectors": {"<id>": {...}, ...}}`.
    /// Key order of the `collectors` object is preserved.
    pub fn from_value(value: Value) -> Result<Self, HostError> {
        let mut obj = match value {
            Value::Object(map) => map,
            other => {
                return Err(HostError::BadDump(format!(
                    "expected object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let collectors = match obj.remove("collectors") {
            Some(Value::Object(map)) => map.into_iter().collect(),
            Some(other) => {
                return Err(HostError::BadDump(format!(
                    "expected \"collectors\" object, got {}",
                    json_kind(&other)
                )))
            }
            None => Vec::new(),
        };

        Ok(Self { collectors })
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Interface to the WordPress host's Query Monitor subsystem.
///
/// Implementations must be cheap to call redundantly: `init` is guarded by
/// the caller's one-time state machine but must itself tolerate repeat
/// invocations.
#[async_trait]
pub trait Host: Send + Sync {
    /// Check the host and the Query Monitor plugin are reachable.
    async fn ping(&self) -> Result<(), HostError>;

    /// Bootstrap the collector subsystem. Idempotent.
    async fn init(&self) -> Result<(), HostError>;

    /// Run a host command whose side effects populate collector data.
    async fn run_command(&self, command: &str) -> Result<(), HostError>;

    /// Trigger collection on every registered collector and return the dump.
    async fn collect(&self, ctx: Option<&InspectContext>) -> Result<HostDump, HostError>;

    /// Resolve a post slug to its metadata.
    async fn resolve_slug(&self, slug: &str) -> Result<Option<PostRef>, HostError>;

    /// Look up a post by id.
    async fn post(&self, id: u64) -> Result<Option<PostRef>, HostError>;

    /// Implementation name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dump_preserves_collector_order() {
        let dump = HostDump::from_value(json!({
            "collectors": {
                "environment": {},
                "db_queries": {},
                "http": {},
            }
        }))
        .unwrap();

        let ids: Vec<&str> = dump.collectors.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["environment", "db_queries", "http"]);
    }

    #[test]
    fn test_dump_rejects_non_object() {
        let err = HostDump::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(err.to_string().contains("expected object"));

        let err = HostDump::from_value(json!({"collectors": "nope"})).unwrap_err();
        assert!(err.to_string().contains("got string"));
    }

    #[test]
    fn test_dump_without_collectors_is_empty() {
        let dump = HostDump::from_value(json!({})).unwrap();
        assert!(dump.collectors.is_empty());
    }
}
