//! Text and table rendering.
//!
//! Layout rules shared by the CLI and the inspection report:
//! durations print with 4 decimal places and an `s` suffix; long strings
//! truncate to a fixed character prefix with a `...` marker that is always
//! appended (SQL 60 in tables, 100 in detail listings; URLs 50); callers
//! clip to 30 characters without a marker; hook listings sample the first
//! 20 names. An aggregate summary line always precedes per-row detail.

use serde_json::Value;

use crate::report::normalize::*;
use crate::report::Report;

/// SQL prefix width in query tables.
pub const SQL_TABLE_WIDTH: usize = 60;
/// SQL prefix width in detail listings.
pub const SQL_DETAIL_WIDTH: usize = 100;
/// URL prefix width in request tables.
pub const URL_WIDTH: usize = 50;
/// Caller clip width (no marker).
pub const CALLER_WIDTH: usize = 30;
/// How many queries a detail listing shows.
pub const DETAIL_QUERY_COUNT: usize = 10;

/// Truncate to the first `width` characters and append the `...` marker.
///
/// The marker is appended whether or not the string was shortened, so a
/// string of exactly `width` characters renders unmodified plus marker.
/// Counts characters, not bytes.
pub fn truncate_marked(s: &str, width: usize) -> String {
    let mut out: String = s.chars().take(width).collect();
    out.push_str("...");
    out
}

/// Clip to the first `width` characters without a marker.
pub fn clip(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Duration with 4 decimal places: `0.0234s`.
pub fn secs(t: f64) -> String {
    format!("{:.4}s", t)
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Scalar display form of a JSON value: strings unquoted, lists joined
/// with commas, objects as compact JSON, null empty.
pub fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(scalar)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Render a bordered table with column widths computed from content.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let separator = {
        let mut line = String::from("+");
        for w in &widths {
            line.push_str(&"-".repeat(w + 2));
            line.push('+');
        }
        line.push('\n');
        line
    };

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (i, w) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = w - cell.chars().count();
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad + 1));
            line.push('|');
        }
        line.push('\n');
        line
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();

    let mut out = String::new();
    out.push_str(&separator);
    out.push_str(&render_row(&header_cells));
    out.push_str(&separator);
    for row in rows {
        out.push_str(&render_row(row));
    }
    out.push_str(&separator);
    out
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_line(fields: &[String]) -> String {
    let escaped: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    format!("{}\n", escaped.join(","))
}

// ---------------------------------------------------------------------------
// per-collector layouts
// ---------------------------------------------------------------------------

pub fn environment_text(env: &EnvironmentRecord) -> String {
    let mut out = String::new();
    out.push_str("=== PHP Information ===\n");
    out.push_str(&format!("Version: {}\n", scalar(&env.php.version)));
    out.push_str(&format!("Memory Limit: {}\n", scalar(&env.php.memory_limit)));
    out.push_str(&format!(
        "Max Execution Time: {}\n",
        scalar(&env.php.max_execution_time)
    ));
    out.push('\n');

    out.push_str("=== WordPress Information ===\n");
    out.push_str(&format!("Version: {}\n", scalar(&env.wordpress.version)));
    out.push_str(&format!(
        "Multisite: {}\n",
        if env.wordpress.multisite { "Yes" } else { "No" }
    ));
    out.push('\n');

    out.push_str("=== Database Information ===\n");
    out.push_str(&format!("Extension: {}\n", scalar(&env.database.extension)));
    out.push_str(&format!("Server: {}\n", scalar(&env.database.server)));
    out.push_str(&format!("Version: {}\n", scalar(&env.database.version)));
    out
}

/// Summary line for query aggregates. Always reflects the unfiltered
/// capture, regardless of any slow-only view beneath it.
pub fn db_summary(record: &DbQueriesRecord) -> String {
    format!(
        "Total Queries: {} | Total Time: {}\n",
        record.total_queries,
        secs(record.total_time)
    )
}

pub fn db_queries_table(record: &DbQueriesRecord) -> String {
    let mut out = db_summary(record);
    out.push('\n');

    if record.queries.is_empty() {
        out.push_str("No queries recorded.\n");
        return out;
    }

    let rows: Vec<Vec<String>> = record
        .queries
        .iter()
        .enumerate()
        .map(|(i, q)| {
            vec![
                (i + 1).to_string(),
                secs(q.time),
                q.query_type.clone(),
                clip(&q.caller, CALLER_WIDTH),
                truncate_marked(&q.sql, SQL_TABLE_WIDTH),
            ]
        })
        .collect();

    out.push_str(&render_table(&["#", "Time", "Type", "Caller", "SQL"], &rows));
    out
}

pub fn db_queries_csv(record: &DbQueriesRecord) -> String {
    let mut out = csv_line(&[
        "index".into(),
        "time".into(),
        "type".into(),
        "caller".into(),
        "sql".into(),
    ]);
    for (i, q) in record.queries.iter().enumerate() {
        out.push_str(&csv_line(&[
            (i + 1).to_string(),
            format!("{:.4}", q.time),
            q.query_type.clone(),
            q.caller.clone(),
            q.sql.clone(),
        ]));
    }
    out
}

pub fn http_table(record: &HttpRecord) -> String {
    let mut out = format!("Total HTTP Requests: {}\n\n", record.total_requests);

    if record.requests.is_empty() {
        out.push_str("No HTTP requests recorded.\n");
        return out;
    }

    let rows: Vec<Vec<String>> = record
        .requests
        .iter()
        .map(|r| {
            vec![
                truncate_marked(&r.url, URL_WIDTH),
                r.method.clone(),
                r.status.to_string(),
                secs(r.time),
            ]
        })
        .collect();

    out.push_str(&render_table(&["URL", "Method", "Status", "Time"], &rows));
    out
}

pub fn http_csv(record: &HttpRecord) -> String {
    let mut out = csv_line(&[
        "url".into(),
        "method".into(),
        "status".into(),
        "time".into(),
    ]);
    for r in &record.requests {
        out.push_str(&csv_line(&[
            r.url.clone(),
            r.method.clone(),
            r.status.to_string(),
            format!("{:.4}", r.time),
        ]));
    }
    out
}

pub fn hooks_text(record: &HooksRecord) -> String {
    let mut out = format!("Total Hooks: {}\n", record.total_hooks);
    out.push_str("Use --format=json to see detailed hook information.\n");
    out
}

pub fn php_errors_text(record: &PhpErrorsRecord) -> String {
    let mut out = format!("Total PHP Errors: {}\n", record.total_errors);
    if record.total_errors > 0 {
        out.push_str("Use --format=json to see detailed error information.\n");
    }
    out
}

fn theme_text(record: &ThemeRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("Theme: {}\n", record.theme));
    out.push_str(&format!("Template: {}\n", record.template));
    out.push_str(&format!("Template file: {}\n", record.template_file));
    out.push_str(&format!(
        "Template hierarchy: {}\n",
        record.template_hierarchy.join(", ")
    ));
    out
}

fn conditionals_text(flags: &serde_json::Map<String, Value>) -> String {
    let true_flags: Vec<&str> = flags
        .iter()
        .filter(|(_, v)| v.as_bool() == Some(true))
        .map(|(k, _)| k.as_str())
        .collect();
    format!("True Conditionals: {}\n", true_flags.join(", "))
}

fn cache_text(record: &CacheRecord) -> String {
    format!(
        "Hits: {} | Misses: {} | Total: {}\n",
        record.hits, record.misses, record.total
    )
}

fn overview_text(record: &OverviewRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Current Memory: {}\n",
        format_bytes(record.current_memory)
    ));
    out.push_str(&format!(
        "Memory Limit: {}\n",
        format_bytes(record.memory_limit)
    ));
    out
}

fn request_text(record: &RequestRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("Matched query: {}\n", record.matched_query));
    out.push_str(&format!("Matched rule: {}\n", record.matched_rule));
    if !record.query_vars.is_empty() {
        let vars: Vec<String> = record
            .query_vars
            .iter()
            .map(|(k, v)| format!("{}={}", k, scalar(v)))
            .collect();
        out.push_str(&format!("Query vars: {}\n", vars.join(", ")));
    }
    out
}

/// Generic display: scalar fields as `key: value` lines, short lists as
/// compact JSON, anything bigger skipped.
fn generic_text(map: &serde_json::Map<String, Value>) -> String {
    let mut out = String::new();
    for (key, value) in map {
        match value {
            Value::Array(items) if items.len() >= 10 => {}
            Value::Array(_) | Value::Object(_) => {
                out.push_str(&format!(
                    "{}: {}\n",
                    key,
                    serde_json::to_string(value).unwrap_or_default()
                ));
            }
            _ => out.push_str(&format!("{}: {}\n", key, scalar(value))),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// inspection report
// ---------------------------------------------------------------------------

fn section_heading(collector_id: &str) -> String {
    format!("=== {} ===\n", collector_id.replace('_', " ").to_uppercase())
}

fn db_queries_detail(record: &DbQueriesRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total Queries: {}\n", record.total_queries));
    out.push_str(&format!("Total Time: {}\n", secs(record.total_time)));
    out.push('\n');
    out.push_str(&format!("Top {} Queries:\n", DETAIL_QUERY_COUNT));
    for (i, q) in record.queries.iter().take(DETAIL_QUERY_COUNT).enumerate() {
        out.push_str(&format!(
            "{}. [{}] {}\n",
            i + 1,
            secs(q.time),
            truncate_marked(&q.sql, SQL_DETAIL_WIDTH)
        ));
        out.push_str(&format!(
            "   Caller: {} | Component: {}\n",
            q.caller, q.component
        ));
    }
    out
}

fn http_detail(record: &HttpRecord) -> String {
    let mut out = format!("Total HTTP Requests: {}\n", record.total_requests);
    for (i, r) in record.requests.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {} - Status: {} ({})\n",
            i + 1,
            r.method,
            r.url,
            r.status,
            secs(r.time)
        ));
    }
    out
}

fn hooks_detail(record: &HooksRecord) -> String {
    let mut out = format!("Total Hooks Fired: {}\n", record.total_hooks);
    out.push_str(&format!("Sample Hooks (first {}):\n", HOOK_SAMPLE_LEN));
    out.push_str(&record.hook_names.join(", "));
    out.push('\n');
    out
}

fn listing_detail(label: &str, total: usize, names: &[String]) -> String {
    let mut out = format!("Total {}: {}\n", label, total);
    if !names.is_empty() {
        out.push_str(&names.join(", "));
        out.push('\n');
    }
    out
}

/// Full inspection report: post information followed by one section per
/// collector, in report order.
pub fn report_text(report: &Report) -> String {
    let mut out = String::new();

    if let Some(ref post) = report.meta.post {
        out.push_str("=== Post Information ===\n");
        out.push_str(&format!("ID: {}\n", post.id));
        out.push_str(&format!("Title: {}\n", post.title));
        out.push_str(&format!("Type: {}\n", post.post_type));
        out.push_str(&format!("Status: {}\n", post.status));
        out.push('\n');
    }

    for entry in &report.entries {
        out.push_str(&section_heading(&entry.collector));
        let body = match &entry.record {
            NormalizedRecord::Environment(env) => environment_text(env),
            NormalizedRecord::DbQueries(db) => db_queries_detail(db),
            NormalizedRecord::Http(http) => http_detail(http),
            NormalizedRecord::Hooks(hooks) => hooks_detail(hooks),
            NormalizedRecord::PhpErrors(errors) => {
                format!("Total PHP Errors: {}\n", errors.total_errors)
            }
            NormalizedRecord::Theme(theme) => theme_text(theme),
            NormalizedRecord::Cache(cache) => cache_text(cache),
            NormalizedRecord::Conditionals(flags) => conditionals_text(flags),
            NormalizedRecord::Overview(overview) => overview_text(overview),
            NormalizedRecord::Request(request) => request_text(request),
            NormalizedRecord::Transients(t) => {
                listing_detail("Transients", t.total, &t.transients)
            }
            NormalizedRecord::Assets(a) => listing_detail("Assets", a.total, &a.assets),
            NormalizedRecord::Generic(map) => generic_text(map),
        };

        if body.is_empty() {
            out.push_str("No data available\n");
        } else {
            out.push_str(&body);
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncation_boundary_is_exact() {
        let s61: String = "a".repeat(61);
        let s60: String = "a".repeat(60);
        let short = "SELECT 1";

        // 61 chars: first 60 + marker.
        assert_eq!(
            truncate_marked(&s61, SQL_TABLE_WIDTH),
            format!("{}...", "a".repeat(60))
        );
        // Exactly 60 chars: unmodified + marker.
        assert_eq!(truncate_marked(&s60, SQL_TABLE_WIDTH), format!("{}...", s60));
        // Shorter strings keep the marker too.
        assert_eq!(truncate_marked(short, SQL_TABLE_WIDTH), "SELECT 1...");
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let s: String = "é".repeat(70);
        let out = truncate_marked(&s, SQL_TABLE_WIDTH);
        assert_eq!(out.chars().count(), SQL_TABLE_WIDTH + 3);
    }

    #[test]
    fn test_clip_has_no_marker() {
        let s: String = "c".repeat(40);
        assert_eq!(clip(&s, CALLER_WIDTH), "c".repeat(30));
        assert_eq!(clip("short", CALLER_WIDTH), "short");
    }

    #[test]
    fn test_secs_formats_four_decimals() {
        assert_eq!(secs(0.05), "0.0500s");
        assert_eq!(secs(1.23456), "1.2346s");
        assert_eq!(secs(0.0), "0.0000s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(128 * 1024 * 1024), "128.00 MB");
    }

    #[test]
    fn test_render_table_widths() {
        let out = render_table(
            &["#", "Time"],
            &[vec!["1".into(), "0.0200s".into()], vec!["2".into(), "0.0800s".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "+---+---------+");
        assert_eq!(lines[1], "| # | Time    |");
        assert!(lines[3].starts_with("| 1 |"));
        // All rows share the border width.
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
    }

    #[test]
    fn test_db_summary_precedes_rows() {
        let record = DbQueriesRecord {
            total_queries: 2,
            total_time: 0.1,
            queries: vec![QueryRecord {
                sql: "SELECT * FROM wp_posts".into(),
                time: 0.08,
                query_type: "SELECT".into(),
                caller: "get_posts()".into(),
                component: "core".into(),
            }],
        };

        let out = db_queries_table(&record);
        assert!(out.starts_with("Total Queries: 2 | Total Time: 0.1000s\n"));
        assert!(out.contains("SELECT * FROM wp_posts..."));
    }

    #[test]
    fn test_empty_queries_message() {
        let record = DbQueriesRecord {
            total_queries: 0,
            total_time: 0.0,
            queries: vec![],
        };
        assert!(db_queries_table(&record).contains("No queries recorded."));
    }

    #[test]
    fn test_csv_escaping() {
        let record = DbQueriesRecord {
            total_queries: 1,
            total_time: 0.01,
            queries: vec![QueryRecord {
                sql: "SELECT a, b FROM \"t\"".into(),
                time: 0.01,
                query_type: "SELECT".into(),
                caller: "f()".into(),
                component: "core".into(),
            }],
        };

        let out = db_queries_csv(&record);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "index,time,type,caller,sql");
        assert_eq!(lines[1], "1,0.0100,SELECT,f(),\"SELECT a, b FROM \"\"t\"\"\"");
    }

    #[test]
    fn test_conditionals_text_lists_true_flags() {
        let mut flags = serde_json::Map::new();
        flags.insert("is_single".into(), json!(true));
        flags.insert("is_admin".into(), json!(false));
        flags.insert("is_singular".into(), json!(true));

        let out = conditionals_text(&flags);
        assert_eq!(out, "True Conditionals: is_single, is_singular\n");
    }

    #[test]
    fn test_section_heading_style() {
        assert_eq!(section_heading("db_queries"), "=== DB QUERIES ===\n");
        assert_eq!(section_heading("cache"), "=== CACHE ===\n");
    }
}
