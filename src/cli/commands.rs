//! Subcommand implementations.
//!
//! Each command returns the full rendered output as a string so the thin
//! binary wrapper owns all printing. A failing observed command is a
//! warning, not an abort: collectors may still hold useful data from the
//! partial run.

use std::time::Instant;

use tracing::{debug, warn};

use crate::collector::{Registry, Snapshot, COLLECTOR_INIT};
use crate::error::{ReportError, Result};
use crate::host::{Host, InspectContext, PostRef};
use crate::render::text;
use crate::render::{json, OutputFormat};
use crate::report::normalize::NormalizedRecord;
use crate::report::{
    normalize, CollectorFilter, FormatOptions, ProfileSummary, Report, ReportMeta,
};

use super::{CommandArgs, DbArgs, FormatArgs, InspectArgs};

/// One full collection cycle: reachability check, one-time bootstrap,
/// optional observed command, dump, parse.
///
/// A failed observed command surfaces as a `Warning:` line on table
/// output only; json and csv stdout must stay machine-parseable, so
/// there the failure is logged and omitted from the payload.
async fn collect(
    host: &dyn Host,
    command: Option<&str>,
    ctx: Option<&InspectContext>,
    format: OutputFormat,
    out: &mut String,
) -> Result<Registry> {
    host.ping().await?;
    COLLECTOR_INIT.ensure(host).await?;

    if let Some(cmd) = command {
        debug!(host = host.name(), command = cmd, "running observed command");
        if let Err(e) = host.run_command(cmd).await {
            // Partial collector data is still worth reporting.
            warn!(command = cmd, error = %e, "observed command failed");
            if format == OutputFormat::Table {
                out.push_str(&format!("Warning: {}\n", e));
            }
        }
    }

    let dump = host.collect(ctx).await?;
    Ok(Registry::from_dump(dump))
}

fn require_snapshot<'a>(registry: &'a Registry, id: &str) -> Result<&'a Snapshot> {
    registry
        .get(id)
        .ok_or_else(|| ReportError::collector_missing(id))
}

fn reject_csv(format: OutputFormat, command: &str) -> Result<()> {
    if format == OutputFormat::Csv {
        return Err(ReportError::MissingRequiredParameter(format!(
            "the {} command supports table or json output only",
            command
        )));
    }
    Ok(())
}

fn unexpected_shape(id: &str) -> ReportError {
    ReportError::PreconditionUnmet(format!("{} collector returned an unexpected shape", id))
}

pub async fn env(host: &dyn Host, args: &FormatArgs) -> Result<String> {
    reject_csv(args.format, "env")?;

    let mut out = String::new();
    let registry = collect(host, None, None, args.format, &mut out).await?;
    let snapshot = require_snapshot(&registry, "environment")?;

    match normalize(snapshot, &FormatOptions::default()) {
        NormalizedRecord::Environment(record) => {
            match args.format {
                OutputFormat::Json => out.push_str(&json::pretty(&record)),
                _ => out.push_str(&text::environment_text(&record)),
            }
            Ok(out)
        }
        _ => Err(unexpected_shape("environment")),
    }
}

pub async fn db(host: &dyn Host, args: &DbArgs) -> Result<String> {
    let opts = FormatOptions {
        format: args.format,
        threshold: args.threshold.max(0.0),
        slow_only: args.slow_only,
        collectors: CollectorFilter::All,
    };

    let mut out = String::new();
    let registry = collect(host, args.command.as_deref(), None, args.format, &mut out).await?;
    let snapshot = require_snapshot(&registry, "db_queries")?;

    match normalize(snapshot, &opts) {
        NormalizedRecord::DbQueries(record) => {
            match args.format {
                OutputFormat::Json => out.push_str(&json::pretty(&record)),
                OutputFormat::Csv => out.push_str(&text::db_queries_csv(&record)),
                OutputFormat::Table => {
                    out.push_str(&text::db_queries_table(&record));
                    out.push_str(&format!(
                        "Success: Found {} queries.\n",
                        record.queries.len()
                    ));
                }
            }
            Ok(out)
        }
        _ => Err(unexpected_shape("db_queries")),
    }
}

pub async fn http(host: &dyn Host, args: &CommandArgs) -> Result<String> {
    let mut out = String::new();
    let registry = collect(host, args.command.as_deref(), None, args.format, &mut out).await?;
    let snapshot = require_snapshot(&registry, "http")?;

    match normalize(snapshot, &FormatOptions::default()) {
        NormalizedRecord::Http(record) => {
            match args.format {
                OutputFormat::Json => out.push_str(&json::pretty(&record)),
                OutputFormat::Csv => out.push_str(&text::http_csv(&record)),
                OutputFormat::Table => {
                    out.push_str(&text::http_table(&record));
                    out.push_str(&format!(
                        "Success: Found {} HTTP requests.\n",
                        record.total_requests
                    ));
                }
            }
            Ok(out)
        }
        _ => Err(unexpected_shape("http")),
    }
}

pub async fn hooks(host: &dyn Host, args: &CommandArgs) -> Result<String> {
    reject_csv(args.format, "hooks")?;

    let mut out = String::new();
    let registry = collect(host, args.command.as_deref(), None, args.format, &mut out).await?;
    let snapshot = require_snapshot(&registry, "hooks")?;

    match normalize(snapshot, &FormatOptions::default()) {
        NormalizedRecord::Hooks(record) => {
            match args.format {
                OutputFormat::Json => out.push_str(&json::pretty(&record)),
                _ => {
                    out.push_str(&text::hooks_text(&record));
                    out.push_str(&format!(
                        "Success: Found {} hooks fired.\n",
                        record.total_hooks
                    ));
                }
            }
            Ok(out)
        }
        _ => Err(unexpected_shape("hooks")),
    }
}

pub async fn errors(host: &dyn Host, args: &CommandArgs) -> Result<String> {
    reject_csv(args.format, "errors")?;

    let mut out = String::new();
    let registry = collect(host, args.command.as_deref(), None, args.format, &mut out).await?;
    let snapshot = require_snapshot(&registry, "php_errors")?;

    match normalize(snapshot, &FormatOptions::default()) {
        NormalizedRecord::PhpErrors(record) => {
            match args.format {
                OutputFormat::Json => out.push_str(&json::pretty(&record)),
                _ => {
                    if record.total_errors == 0 {
                        out.push_str("Success: No PHP errors found.\n");
                    } else {
                        out.push_str(&text::php_errors_text(&record));
                        out.push_str(&format!(
                            "Warning: Found {} PHP errors.\n",
                            record.total_errors
                        ));
                    }
                }
            }
            Ok(out)
        }
        _ => Err(unexpected_shape("php_errors")),
    }
}

pub async fn profile(host: &dyn Host, args: &CommandArgs) -> Result<String> {
    reject_csv(args.format, "profile")?;

    let mut out = String::new();
    host.ping().await?;
    COLLECTOR_INIT.ensure(host).await?;

    // The measurement covers the observed command alone; bridge overhead
    // (dump transfer and parsing) stays outside the timer.
    let start = Instant::now();
    if let Some(cmd) = args.command.as_deref() {
        debug!(host = host.name(), command = cmd, "running observed command");
        if let Err(e) = host.run_command(cmd).await {
            warn!(command = cmd, error = %e, "observed command failed");
            if args.format == OutputFormat::Table {
                out.push_str(&format!("Warning: {}\n", e));
            }
        }
    }
    let wall_time = start.elapsed().as_secs_f64();

    let registry = Registry::from_dump(host.collect(None).await?);

    let opts = FormatOptions::default();
    let overview = match normalize(require_snapshot(&registry, "overview")?, &opts) {
        NormalizedRecord::Overview(record) => record,
        _ => return Err(unexpected_shape("overview")),
    };
    let queries = match normalize(require_snapshot(&registry, "db_queries")?, &opts) {
        NormalizedRecord::DbQueries(record) => record,
        _ => return Err(unexpected_shape("db_queries")),
    };

    let summary = ProfileSummary {
        command: args.command.clone(),
        wall_time,
        current_memory: overview.current_memory,
        memory_limit: overview.memory_limit,
        total_queries: queries.total_queries,
        query_time: queries.total_time,
    };

    match args.format {
        OutputFormat::Json => out.push_str(&json::pretty(&summary)),
        _ => {
            out.push_str("=== Profile ===\n");
            if let Some(ref cmd) = summary.command {
                out.push_str(&format!("Command: {}\n", cmd));
            }
            out.push_str(&format!("Wall Time: {}\n", text::secs(summary.wall_time)));
            out.push_str(&format!(
                "Current Memory: {}\n",
                text::format_bytes(summary.current_memory)
            ));
            out.push_str(&format!(
                "Memory Limit: {}\n",
                text::format_bytes(summary.memory_limit)
            ));
            out.push_str(&format!("Total Queries: {}\n", summary.total_queries));
            out.push_str(&format!("Query Time: {}\n", text::secs(summary.query_time)));
        }
    }

    Ok(out)
}

/// Resolve the inspection target to a post (when addressed by id or slug)
/// and the URL the host should simulate loading.
pub async fn resolve_target(
    host: &dyn Host,
    post_id: Option<u64>,
    slug: Option<&str>,
    url: Option<&str>,
) -> Result<(Option<PostRef>, Option<String>)> {
    if post_id.is_none() && slug.is_none() && url.is_none() {
        return Err(ReportError::MissingRequiredParameter(
            "provide one of --post-id, --slug, or --url".into(),
        ));
    }

    let post = if let Some(id) = post_id {
        Some(host.post(id).await?.ok_or_else(|| {
            ReportError::ResourceNotFound(format!("Post with ID {} not found", id))
        })?)
    } else if let Some(slug) = slug {
        Some(host.resolve_slug(slug).await?.ok_or_else(|| {
            ReportError::ResourceNotFound(format!("Post with slug '{}' not found", slug))
        })?)
    } else {
        None
    };

    let url = url.map(str::to_string).or_else(|| {
        post.as_ref()
            .map(|p| p.permalink.clone())
            .filter(|u| !u.is_empty())
    });

    Ok((post, url))
}

pub async fn inspect(host: &dyn Host, args: &InspectArgs) -> Result<String> {
    reject_csv(args.format, "inspect")?;

    host.ping().await?;
    COLLECTOR_INIT.ensure(host).await?;

    let (post, url) =
        resolve_target(host, args.post_id, args.slug.as_deref(), args.url.as_deref()).await?;

    let ctx = InspectContext {
        post_id: post.as_ref().map(|p| p.id).or(args.post_id),
        url: url.clone(),
    };
    let dump = host.collect(Some(&ctx)).await?;
    let registry = Registry::from_dump(dump);

    let opts = FormatOptions {
        format: args.format,
        collectors: CollectorFilter::parse(args.collectors.as_deref()),
        ..FormatOptions::default()
    };
    let meta = ReportMeta {
        url,
        post_id: ctx.post_id,
        post,
        command: None,
    };
    let report = Report::assemble(&registry, &opts, meta);

    match args.format {
        OutputFormat::Json => Ok(json::pretty(&report.to_json())),
        _ => Ok(text::report_text(&report)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FixtureHost;
    use serde_json::json;

    fn fixture() -> FixtureHost {
        FixtureHost::from_value(json!({
            "collectors": {
                "environment": {
                    "php": {"version": "8.3.2", "memory_limit": "256M"},
                    "wp": {"version": "6.5"},
                },
                "db_queries": {
                    "rows": [
                        {"sql": "SELECT * FROM wp_posts", "ltime": 0.02,
                         "type": "SELECT", "caller": "get_posts()"},
                        {"sql": "UPDATE wp_options SET option_value = 'x'", "ltime": 0.09,
                         "type": "UPDATE", "caller": "update_option()"},
                    ],
                    "total_qs": 2,
                    "total_time": 0.11,
                },
                "http": {"http": [], "ltime": 0.0},
                "hooks": {"hooks": {"init": {}, "wp_loaded": {}}},
                "php_errors": {"errors": []},
                "overview": {"memory": 12582912, "memory_limit": 134217728},
            },
            "posts": [
                {"id": 42, "title": "Hello", "type": "post", "status": "publish",
                 "slug": "hello-world", "permalink": "https://example.test/hello-world/"}
            ],
            "failing_commands": ["fail hard"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_env_table_output() {
        let host = fixture();
        let out = env(&host, &FormatArgs { format: OutputFormat::Table })
            .await
            .unwrap();
        assert!(out.contains("=== PHP Information ==="));
        assert!(out.contains("Version: 8.3.2"));
    }

    #[tokio::test]
    async fn test_env_rejects_csv() {
        let host = fixture();
        let err = env(&host, &FormatArgs { format: OutputFormat::Csv })
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::MissingRequiredParameter(_)));
    }

    #[tokio::test]
    async fn test_db_slow_only_keeps_totals() {
        let host = fixture();
        let args = DbArgs {
            format: OutputFormat::Table,
            slow_only: true,
            threshold: 0.05,
            command: None,
        };
        let out = db(&host, &args).await.unwrap();
        // Totals reflect the full capture while the listing is filtered.
        assert!(out.contains("Total Queries: 2 | Total Time: 0.1100s"));
        assert!(out.contains("UPDATE wp_options"));
        assert!(!out.contains("SELECT * FROM wp_posts"));
        assert!(out.contains("Success: Found 1 queries."));
    }

    #[tokio::test]
    async fn test_failed_command_is_warning_not_abort() {
        let host = fixture();
        let args = DbArgs {
            format: OutputFormat::Table,
            slow_only: false,
            threshold: 0.05,
            command: Some("fail hard".into()),
        };
        let out = db(&host, &args).await.unwrap();
        assert!(out.starts_with("Warning:"));
        assert!(out.contains("Success: Found 2 queries."));
    }

    #[tokio::test]
    async fn test_missing_collector_is_not_found() {
        let host = FixtureHost::from_value(json!({"collectors": {}})).unwrap();
        let err = env(&host, &FormatArgs { format: OutputFormat::Table })
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::CollectorMissing { .. }));
        assert_eq!(err.to_string(), "environment collector not found");
    }

    #[tokio::test]
    async fn test_errors_reports_clean_run() {
        let host = fixture();
        let args = CommandArgs {
            format: OutputFormat::Table,
            command: None,
        };
        let out = errors(&host, &args).await.unwrap();
        assert_eq!(out, "Success: No PHP errors found.\n");
    }

    #[tokio::test]
    async fn test_profile_combines_overview_and_queries() {
        let host = fixture();
        let args = CommandArgs {
            format: OutputFormat::Table,
            command: None,
        };
        let out = profile(&host, &args).await.unwrap();
        assert!(out.contains("Current Memory: 12.00 MB"));
        assert!(out.contains("Memory Limit: 128.00 MB"));
        assert!(out.contains("Total Queries: 2"));
        assert!(out.contains("Query Time: 0.1100s"));
    }

    #[tokio::test]
    async fn test_inspect_requires_a_target() {
        let host = fixture();
        let args = InspectArgs {
            post_id: None,
            slug: None,
            url: None,
            collectors: None,
            format: OutputFormat::Table,
        };
        let err = inspect(&host, &args).await.unwrap_err();
        assert!(matches!(err, ReportError::MissingRequiredParameter(_)));
    }

    #[tokio::test]
    async fn test_inspect_resolves_slug() {
        let host = fixture();
        let args = InspectArgs {
            post_id: None,
            slug: Some("hello-world".into()),
            url: None,
            collectors: Some("db_queries".into()),
            format: OutputFormat::Table,
        };
        let out = inspect(&host, &args).await.unwrap();
        assert!(out.contains("=== Post Information ==="));
        assert!(out.contains("ID: 42"));
        assert!(out.contains("=== DB QUERIES ==="));
        assert!(!out.contains("=== HOOKS ==="));
    }

    #[tokio::test]
    async fn test_inspect_unknown_slug_is_not_found() {
        let host = fixture();
        let args = InspectArgs {
            post_id: None,
            slug: Some("missing".into()),
            url: None,
            collectors: None,
            format: OutputFormat::Table,
        };
        let err = inspect(&host, &args).await.unwrap_err();
        assert!(matches!(err, ReportError::ResourceNotFound(_)));
    }
}
