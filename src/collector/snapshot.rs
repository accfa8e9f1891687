//! Raw collector snapshots.
//!
//! Each Query Monitor collector emits a differently shaped blob. The dump
//! is parsed into a closed tagged union keyed by collector id, so the
//! normalizer dispatches on the variant instead of inspecting shapes at
//! runtime. Every field carries a serde default: a snapshot with missing
//! fields always parses, it never faults downstream.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Point-in-time data from one collector, keyed by collector id.
#[derive(Debug, Clone)]
pub enum Snapshot {
    Environment(EnvironmentData),
    DbQueries(DbQueriesData),
    Http(HttpData),
    Hooks(HooksData),
    PhpErrors(PhpErrorsData),
    Theme(ThemeData),
    Cache(CacheData),
    Conditionals(ConditionalsData),
    Overview(OverviewData),
    Request(RequestData),
    Transients(TransientsData),
    Assets(AssetsData),
    /// Unknown collector: all declared fields pass through unmodified.
    Generic(Map<String, Value>),
}

impl Snapshot {
    /// Parse one collector's raw value.
    ///
    /// Returns `None` for `null` or non-object values: such a collector is
    /// omitted from the report entirely, not emitted as an empty record.
    /// A known id whose object doesn't match the expected shape degrades
    /// to the generic passthrough rather than erroring.
    pub fn from_value(id: &str, value: Value) -> Option<Snapshot> {
        let map = match value {
            Value::Object(map) => map,
            _ => return None,
        };

        let parsed = match id {
            "environment" => from_map(map, Snapshot::Environment),
            "db_queries" => from_map(map, Snapshot::DbQueries),
            "http" => from_map(map, Snapshot::Http),
            "hooks" => from_map(map, Snapshot::Hooks),
            "php_errors" => from_map(map, Snapshot::PhpErrors),
            "theme" => from_map(map, Snapshot::Theme),
            "cache" => from_map(map, Snapshot::Cache),
            "conditionals" => from_map(map, Snapshot::Conditionals),
            "overview" => from_map(map, Snapshot::Overview),
            "request" => from_map(map, Snapshot::Request),
            "transients" => from_map(map, Snapshot::Transients),
            "assets_scripts" | "assets_styles" => from_map(map, Snapshot::Assets),
            _ => Ok(Snapshot::Generic(map)),
        };

        Some(parsed.unwrap_or_else(|generic| generic))
    }
}

/// Parse a typed snapshot, handing the original map back on failure so the
/// caller can fall back to the generic variant.
fn from_map<T, F>(map: Map<String, Value>, variant: F) -> Result<Snapshot, Snapshot>
where
    T: for<'de> Deserialize<'de>,
    F: FnOnce(T) -> Snapshot,
{
    match serde_json::from_value(Value::Object(map.clone())) {
        Ok(data) => Ok(variant(data)),
        Err(_) => Err(Snapshot::Generic(map)),
    }
}

// ---------------------------------------------------------------------------
// environment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentData {
    #[serde(default)]
    pub php: PhpEnv,
    #[serde(default)]
    pub wp: WpEnv,
    #[serde(default)]
    pub db: DbEnv,
    #[serde(default)]
    pub server: ServerEnv,
}

/// Leaf environment fields stay as raw values: the host reports some of
/// them as strings and some as numbers, and both pass through to JSON
/// unmodified. Missing fields default to the "N/A" sentinel at
/// normalization time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhpEnv {
    pub version: Option<Value>,
    pub memory_limit: Option<Value>,
    pub max_execution_time: Option<Value>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WpEnv {
    pub version: Option<Value>,
    #[serde(default)]
    pub multisite: bool,
    #[serde(rename = "WP_DEBUG", default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbEnv {
    pub extension: Option<Value>,
    pub server: Option<Value>,
    pub version: Option<Value>,
    pub database: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerEnv {
    pub name: Option<Value>,
    pub version: Option<Value>,
}

// ---------------------------------------------------------------------------
// db_queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbQueriesData {
    #[serde(default)]
    pub rows: Vec<DbRow>,
    /// Host-side aggregate over all captured queries. Computed before any
    /// slow-query filtering, and reported as-is.
    #[serde(default)]
    pub total_qs: u64,
    #[serde(default)]
    pub total_time: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbRow {
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub ltime: f64,
    #[serde(rename = "type", default)]
    pub query_type: String,
    #[serde(default)]
    pub caller_name: Option<String>,
    #[serde(default)]
    pub caller: Option<String>,
    #[serde(default, deserialize_with = "component_name")]
    pub component: Option<String>,
}

impl DbRow {
    /// Display name of the calling function; `caller_name` wins when the
    /// host reports both forms.
    pub fn caller_display(&self) -> &str {
        self.caller_name
            .as_deref()
            .or(self.caller.as_deref())
            .unwrap_or("")
    }
}

/// The host reports a query's component either as a plain string or as an
/// object with a `name` field.
fn component_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Object(map) => map
            .get("name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// http
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpData {
    #[serde(default)]
    pub http: Vec<HttpRequestRaw>,
    /// Aggregate wall time across requests, as reported by the host.
    #[serde(default)]
    pub ltime: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpRequestRaw {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub args: HttpArgs,
    /// Either `{"response": {"code": ...}}` or an error value
    /// (an object carrying an `errors` key).
    #[serde(default)]
    pub response: Value,
    #[serde(default)]
    pub ltime: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpArgs {
    pub method: Option<String>,
}

// ---------------------------------------------------------------------------
// remaining collectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HooksData {
    /// Hook mapping keyed by hook name, in firing order.
    #[serde(default)]
    pub hooks: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhpErrorsData {
    #[serde(default)]
    pub errors: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeData {
    pub stylesheet: Option<String>,
    pub template: Option<String>,
    pub template_file: Option<String>,
    #[serde(default)]
    pub template_hierarchy: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheData {
    #[serde(default)]
    pub stats: CacheStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheStats {
    #[serde(default)]
    pub hits: u64,
    #[serde(default)]
    pub misses: u64,
    #[serde(default)]
    pub total: u64,
}

/// All declared conditional flags; the renderer later picks the
/// true-valued ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ConditionalsData {
    pub flags: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverviewData {
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub memory_limit: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestData {
    #[serde(default)]
    pub request: RequestInner,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestInner {
    #[serde(default)]
    pub matched_query: String,
    #[serde(default)]
    pub matched_rule: String,
    #[serde(default)]
    pub query_vars: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransientsData {
    #[serde(default)]
    pub trans: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetsData {
    #[serde(default)]
    pub assets: Map<String, Value>,
}
