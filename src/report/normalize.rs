//! Snapshot normalization.
//!
//! One extraction function per snapshot variant turns a collector's raw
//! blob into a flat, display-ready record. Extraction never fails: every
//! missing field has a named default (`"N/A"` for environment strings,
//! zero for counters, empty lists otherwise).

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::collector::snapshot::*;
use crate::collector::Snapshot;

use super::FormatOptions;

/// Sentinel for absent environment fields.
pub const NA: &str = "N/A";

/// How many hook names an inspection report samples.
pub const HOOK_SAMPLE_LEN: usize = 20;

/// One collector's extracted, display-ready fields.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NormalizedRecord {
    Environment(EnvironmentRecord),
    DbQueries(DbQueriesRecord),
    Http(HttpRecord),
    Hooks(HooksRecord),
    PhpErrors(PhpErrorsRecord),
    Theme(ThemeRecord),
    Cache(CacheRecord),
    Conditionals(Map<String, Value>),
    Overview(OverviewRecord),
    Request(RequestRecord),
    Transients(TransientsRecord),
    Assets(AssetsRecord),
    Generic(Map<String, Value>),
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentRecord {
    pub php: PhpSection,
    pub wordpress: WordPressSection,
    pub database: DatabaseSection,
    pub server: ServerSection,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhpSection {
    pub version: Value,
    pub memory_limit: Value,
    pub max_execution_time: Value,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WordPressSection {
    pub version: Value,
    pub multisite: bool,
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseSection {
    pub extension: Value,
    pub server: Value,
    pub version: Value,
    pub database: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerSection {
    pub software: Value,
    pub version: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct DbQueriesRecord {
    /// Aggregates reflect every captured query, not the filtered view.
    pub total_queries: u64,
    pub total_time: f64,
    pub queries: Vec<QueryRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryRecord {
    pub sql: String,
    pub time: f64,
    #[serde(rename = "type")]
    pub query_type: String,
    pub caller: String,
    pub component: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HttpRecord {
    pub total_requests: usize,
    pub total_time: f64,
    pub requests: Vec<HttpCallRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HttpCallRecord {
    pub url: String,
    pub method: String,
    pub status: HttpStatus,
    pub time: f64,
}

/// Response outcome: a numeric code, the error sentinel when the host
/// recorded an error value, or unknown when the response carried no code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Code(u64),
    Error,
    Unknown,
}

impl Serialize for HttpStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HttpStatus::Code(code) => serializer.serialize_u64(*code),
            HttpStatus::Error => serializer.serialize_str("Error"),
            HttpStatus::Unknown => serializer.serialize_str("Unknown"),
        }
    }
}

impl std::fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpStatus::Code(code) => write!(f, "{}", code),
            HttpStatus::Error => write!(f, "Error"),
            HttpStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HooksRecord {
    pub total_hooks: usize,
    /// First [`HOOK_SAMPLE_LEN`] hook names, in firing order.
    pub hook_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhpErrorsRecord {
    pub total_errors: usize,
    pub errors: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeRecord {
    pub theme: String,
    pub template: String,
    pub template_file: String,
    pub template_hierarchy: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheRecord {
    pub hits: u64,
    pub misses: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewRecord {
    pub current_memory: u64,
    pub memory_limit: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    pub matched_query: String,
    pub matched_rule: String,
    pub query_vars: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransientsRecord {
    pub total: usize,
    pub transients: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetsRecord {
    pub total: usize,
    pub assets: Vec<String>,
}

/// Extract one snapshot into its normalized record.
pub fn normalize(snapshot: &Snapshot, opts: &FormatOptions) -> NormalizedRecord {
    match snapshot {
        Snapshot::Environment(data) => NormalizedRecord::Environment(environment(data)),
        Snapshot::DbQueries(data) => NormalizedRecord::DbQueries(db_queries(data, opts)),
        Snapshot::Http(data) => NormalizedRecord::Http(http(data)),
        Snapshot::Hooks(data) => NormalizedRecord::Hooks(hooks(data)),
        Snapshot::PhpErrors(data) => NormalizedRecord::PhpErrors(php_errors(data)),
        Snapshot::Theme(data) => NormalizedRecord::Theme(theme(data)),
        Snapshot::Cache(data) => NormalizedRecord::Cache(cache(data)),
        Snapshot::Conditionals(data) => NormalizedRecord::Conditionals(conditionals(data)),
        Snapshot::Overview(data) => NormalizedRecord::Overview(overview(data)),
        Snapshot::Request(data) => NormalizedRecord::Request(request(data)),
        Snapshot::Transients(data) => NormalizedRecord::Transients(transients(data)),
        Snapshot::Assets(data) => NormalizedRecord::Assets(assets(data)),
        Snapshot::Generic(map) => NormalizedRecord::Generic(map.clone()),
    }
}

fn value_or_na(value: &Option<Value>) -> Value {
    value.clone().unwrap_or_else(|| json!(NA))
}

fn environment(data: &EnvironmentData) -> EnvironmentRecord {
    EnvironmentRecord {
        php: PhpSection {
            version: value_or_na(&data.php.version),
            memory_limit: value_or_na(&data.php.memory_limit),
            max_execution_time: value_or_na(&data.php.max_execution_time),
            extensions: data.php.extensions.clone(),
        },
        wordpress: WordPressSection {
            version: value_or_na(&data.wp.version),
            multisite: data.wp.multisite,
            debug_mode: data.wp.debug,
        },
        database: DatabaseSection {
            extension: value_or_na(&data.db.extension),
            server: value_or_na(&data.db.server),
            version: value_or_na(&data.db.version),
            database: value_or_na(&data.db.database),
        },
        server: ServerSection {
            software: value_or_na(&data.server.name),
            version: value_or_na(&data.server.version),
        },
    }
}

fn db_queries(data: &DbQueriesData, opts: &FormatOptions) -> DbQueriesRecord {
    let queries = data
        .rows
        .iter()
        // Slow filtering is inclusive: a row at exactly the threshold stays.
        .filter(|row| !opts.slow_only || row.ltime >= opts.threshold)
        .map(|row| QueryRecord {
            sql: row.sql.clone(),
            time: row.ltime,
            query_type: row.query_type.clone(),
            caller: row.caller_display().to_string(),
            component: row.component.clone().unwrap_or_else(|| "Unknown".into()),
        })
        .collect();

    DbQueriesRecord {
        total_queries: data.total_qs,
        total_time: data.total_time,
        queries,
    }
}

fn http(data: &HttpData) -> HttpRecord {
    let requests: Vec<HttpCallRecord> = data
        .http
        .iter()
        .map(|req| HttpCallRecord {
            url: req.url.clone(),
            method: req.args.method.clone().unwrap_or_else(|| "GET".into()),
            status: http_status(&req.response),
            time: req.ltime,
        })
        .collect();

    HttpRecord {
        total_requests: requests.len(),
        total_time: data.ltime,
        requests,
    }
}

/// An error value is an object carrying an `errors` key (the host's
/// serialized WP_Error); otherwise the code lives at `response.code`.
fn http_status(response: &Value) -> HttpStatus {
    if response.get("errors").is_some() {
        return HttpStatus::Error;
    }
    match response.pointer("/response/code").and_then(Value::as_u64) {
        Some(code) => HttpStatus::Code(code),
        None => HttpStatus::Unknown,
    }
}

fn hooks(data: &HooksData) -> HooksRecord {
    HooksRecord {
        total_hooks: data.hooks.len(),
        hook_names: data
            .hooks
            .keys()
            .take(HOOK_SAMPLE_LEN)
            .cloned()
            .collect(),
    }
}

fn php_errors(data: &PhpErrorsData) -> PhpErrorsRecord {
    PhpErrorsRecord {
        total_errors: data.errors.len(),
        errors: data.errors.clone(),
    }
}

fn theme(data: &ThemeData) -> ThemeRecord {
    ThemeRecord {
        theme: data.stylesheet.clone().unwrap_or_else(|| NA.into()),
        template: data.template.clone().unwrap_or_else(|| NA.into()),
        template_file: data.template_file.clone().unwrap_or_else(|| NA.into()),
        template_hierarchy: data.template_hierarchy.clone(),
    }
}

fn cache(data: &CacheData) -> CacheRecord {
    CacheRecord {
        hits: data.stats.hits,
        misses: data.stats.misses,
        total: data.stats.total,
    }
}

/// Keep only boolean flags; consumers later pick the true-valued ones.
fn conditionals(data: &ConditionalsData) -> Map<String, Value> {
    data.flags
        .iter()
        .filter(|(_, v)| v.is_boolean())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn overview(data: &OverviewData) -> OverviewRecord {
    OverviewRecord {
        current_memory: data.memory,
        memory_limit: data.memory_limit,
    }
}

fn request(data: &RequestData) -> RequestRecord {
    RequestRecord {
        matched_query: data.request.matched_query.clone(),
        matched_rule: data.request.matched_rule.clone(),
        query_vars: data.request.query_vars.clone(),
    }
}

fn transients(data: &TransientsData) -> TransientsRecord {
    TransientsRecord {
        total: data.trans.len(),
        transients: data.trans.keys().cloned().collect(),
    }
}

fn assets(data: &AssetsData) -> AssetsRecord {
    AssetsRecord {
        total: data.assets.len(),
        assets: data.assets.keys().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(id: &str, value: Value) -> Snapshot {
        Snapshot::from_value(id, value).unwrap()
    }

    #[test]
    fn test_environment_defaults_to_na() {
        let record = normalize(&snap("environment", json!({})), &FormatOptions::default());
        match record {
            NormalizedRecord::Environment(env) => {
                assert_eq!(env.php.version, json!(NA));
                assert_eq!(env.database.server, json!(NA));
                assert!(!env.wordpress.multisite);
                assert!(env.php.extensions.is_empty());
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_slow_filter_is_inclusive() {
        let data = json!({
            "rows": [
                {"sql": "SELECT 1", "ltime": 0.02},
                {"sql": "SELECT 2", "ltime": 0.05},
                {"sql": "SELECT 3", "ltime": 0.08},
            ],
            "total_qs": 3,
            "total_time": 0.15,
        });

        let opts = FormatOptions {
            slow_only: true,
            threshold: 0.05,
            ..FormatOptions::default()
        };
        let record = normalize(&snap("db_queries", data), &opts);
        match record {
            NormalizedRecord::DbQueries(db) => {
                // The row at exactly the threshold is retained.
                assert_eq!(db.queries.len(), 2);
                assert_eq!(db.queries[0].sql, "SELECT 2");
                // Aggregates still reflect the unfiltered capture.
                assert_eq!(db.total_queries, 3);
                assert!((db.total_time - 0.15).abs() < 1e-9);
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_http_status_extraction() {
        let data = json!({
            "http": [
                {"url": "https://a.test", "response": {"response": {"code": 200}}, "ltime": 0.1},
                {"url": "https://b.test", "response": {"errors": {"http_request_failed": ["timeout"]}}, "ltime": 5.0},
                {"url": "https://c.test", "response": {}, "ltime": 0.2,
                 "args": {"method": "POST"}},
            ]
        });

        let record = normalize(&snap("http", data), &FormatOptions::default());
        match record {
            NormalizedRecord::Http(http) => {
                assert_eq!(http.total_requests, 3);
                assert_eq!(http.requests[0].status, HttpStatus::Code(200));
                assert_eq!(http.requests[1].status, HttpStatus::Error);
                assert_eq!(http.requests[2].status, HttpStatus::Unknown);
                // Missing method defaults to GET.
                assert_eq!(http.requests[0].method, "GET");
                assert_eq!(http.requests[2].method, "POST");
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_hooks_sample_caps_at_twenty() {
        let mut hooks = Map::new();
        for i in 0..25 {
            hooks.insert(format!("hook_{:02}", i), json!({}));
        }
        let record = normalize(
            &snap("hooks", json!({ "hooks": hooks })),
            &FormatOptions::default(),
        );
        match record {
            NormalizedRecord::Hooks(h) => {
                assert_eq!(h.total_hooks, 25);
                assert_eq!(h.hook_names.len(), HOOK_SAMPLE_LEN);
                assert_eq!(h.hook_names[0], "hook_00");
                assert_eq!(h.hook_names[19], "hook_19");
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_conditionals_keeps_only_booleans() {
        let record = normalize(
            &snap(
                "conditionals",
                json!({"is_single": true, "is_admin": false, "noise": "yes"}),
            ),
            &FormatOptions::default(),
        );
        match record {
            NormalizedRecord::Conditionals(flags) => {
                assert_eq!(flags.len(), 2);
                assert_eq!(flags["is_single"], json!(true));
                assert!(!flags.contains_key("noise"));
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_http_status_serializes_as_code_or_sentinel() {
        assert_eq!(serde_json::to_value(HttpStatus::Code(404)).unwrap(), json!(404));
        assert_eq!(serde_json::to_value(HttpStatus::Error).unwrap(), json!("Error"));
        assert_eq!(
            serde_json::to_value(HttpStatus::Unknown).unwrap(),
            json!("Unknown")
        );
    }

    #[test]
    fn test_cache_defaults_to_zero() {
        let record = normalize(&snap("cache", json!({})), &FormatOptions::default());
        match record {
            NormalizedRecord::Cache(c) => {
                assert_eq!((c.hits, c.misses, c.total), (0, 0, 0));
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }
}
