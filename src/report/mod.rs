//! Report assembly.
//!
//! A [`Report`] is the normalized, filtered aggregation of collector
//! snapshots for one invocation: an ordered mapping from collector id to
//! [`NormalizedRecord`], plus contextual metadata. Reports are built fresh
//! per invocation and immutable once rendered.

mod filter;
pub mod normalize;

use serde_json::{json, Map, Value};

use crate::collector::Registry;
use crate::host::PostRef;
use crate::render::OutputFormat;

pub use filter::CollectorFilter;
pub use normalize::{normalize, NormalizedRecord};

/// Formatting and filtering policy for one invocation.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub format: OutputFormat,
    /// Slow-query threshold in seconds. Non-negative.
    pub threshold: f64,
    pub slow_only: bool,
    pub collectors: CollectorFilter,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            threshold: 0.05,
            slow_only: false,
            collectors: CollectorFilter::All,
        }
    }
}

/// Wall time, host memory, and query load for one collection cycle,
/// optionally wrapped around an observed command. Built by the profile
/// operation from the overview and db_queries records.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProfileSummary {
    pub command: Option<String>,
    pub wall_time: f64,
    pub current_memory: u64,
    pub memory_limit: u64,
    pub total_queries: u64,
    pub query_time: f64,
}

/// Contextual metadata attached to a report.
#[derive(Debug, Clone, Default)]
pub struct ReportMeta {
    pub url: Option<String>,
    pub post_id: Option<u64>,
    pub post: Option<PostRef>,
    pub command: Option<String>,
}

/// One collector's entry in a report.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub collector: String,
    pub record: NormalizedRecord,
}

/// Ordered collection of normalized collector records.
#[derive(Debug, Clone)]
pub struct Report {
    pub meta: ReportMeta,
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// Normalize every registry snapshot admitted by the filter, in
    /// registry iteration order.
    pub fn assemble(registry: &Registry, opts: &FormatOptions, meta: ReportMeta) -> Self {
        let entries = registry
            .iter()
            .filter(|(id, _)| opts.collectors.contains(id))
            .map(|(id, snapshot)| ReportEntry {
                collector: id.to_string(),
                record: normalize(snapshot, opts),
            })
            .collect();

        Self { meta, entries }
    }

    pub fn get(&self, id: &str) -> Option<&NormalizedRecord> {
        self.entries
            .iter()
            .find(|e| e.collector == id)
            .map(|e| &e.record)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON shape used by the inspect surfaces:
    /// `{url, post_id, post?, collectors: {id: {collector, data}}}`.
    /// Collector key order is entry order.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        root.insert("url".into(), json!(self.meta.url));
        root.insert("post_id".into(), json!(self.meta.post_id));
        if let Some(ref post) = self.meta.post {
            root.insert(
                "post".into(),
                json!({
                    "ID": post.id,
                    "title": post.title,
                    "type": post.post_type,
                    "status": post.status,
                    "slug": post.slug,
                }),
            );
        }
        if let Some(ref command) = self.meta.command {
            root.insert("command".into(), json!(command));
        }

        let mut collectors = Map::new();
        for entry in &self.entries {
            collectors.insert(
                entry.collector.clone(),
                json!({
                    "collector": entry.collector,
                    "data": serde_json::to_value(&entry.record).unwrap_or(Value::Null),
                }),
            );
        }
        root.insert("collectors".into(), Value::Object(collectors));

        Value::Object(root)
    }
}
