//! HTTP API surface.
//!
//! Exposes the same report operations as the CLI over a small JSON API.
//! Every success is `{"success": true, "data": ...}`; every failure is
//! `{"error_code": ..., "message": ...}` with the status code taken from
//! the error kind. Authentication is a single bearer token; a missing or
//! wrong token yields 403 before any routing happens.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming as IncomingBody;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cli::commands::resolve_target;
use crate::collector::{Registry, Snapshot, COLLECTOR_INIT};
use crate::config::ApiConfig;
use crate::error::{ReportError, Result};
use crate::host::{Host, InspectContext};
use crate::render::OutputFormat;
use crate::report::normalize::NormalizedRecord;
use crate::report::{
    normalize, CollectorFilter, FormatOptions, ProfileSummary, Report, ReportMeta,
};

/// Optional parameters accepted by the POST operations.
#[derive(Debug, Default, Deserialize)]
struct CommandBody {
    command: Option<String>,
    #[serde(default)]
    slow: bool,
    threshold: Option<f64>,
}

/// Run the API server until the task is cancelled.
pub async fn serve(
    config: ApiConfig,
    host: Arc<dyn Host>,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, host = host.name(), "API server listening");

    let config = Arc::new(config);
    loop {
        let (stream, _) = listener.accept().await?;
        let _ = stream.set_nodelay(true);
        let host = Arc::clone(&host);
        let config = Arc::clone(&config);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let host = Arc::clone(&host);
                let config = Arc::clone(&config);
                async move { handle(req, &*host, &config).await }
            });

            let io = TokioIo::new(stream);
            let _ = http1::Builder::new().serve_connection(io, service).await;
        });
    }
}

async fn handle(
    req: Request<IncomingBody>,
    host: &dyn Host,
    config: &ApiConfig,
) -> std::result::Result<Response<Full<Bytes>>, std::convert::Infallible> {
    if !authorized(&req, config) {
        return Ok(json_response(
            StatusCode::FORBIDDEN,
            json!({"error_code": "forbidden", "message": "invalid or missing token"}),
        ));
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let outcome = match (method, path.as_str()) {
        (Method::GET, "/environment") => handle_collector(host, None, "environment").await,
        (Method::POST, "/database") => handle_database(host, req).await,
        (Method::POST, "/profile") => handle_profile(host, req).await,
        (Method::POST, "/http") => handle_post_collector(host, req, "http").await,
        (Method::POST, "/hooks") => handle_post_collector(host, req, "hooks").await,
        (Method::POST, "/errors") => handle_post_collector(host, req, "php_errors").await,
        (Method::GET, "/inspect") => handle_inspect(host, query.as_deref()).await,
        _ => Err(ReportError::ResourceNotFound(format!(
            "unknown endpoint: {}",
            path
        ))),
    };

    Ok(match outcome {
        Ok(data) => json_response(StatusCode::OK, json!({"success": true, "data": data})),
        Err(e) => {
            warn!(path = %path, error = %e, "request failed");
            let status =
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            json_response(
                status,
                json!({"error_code": e.code(), "message": e.to_string()}),
            )
        }
    })
}

fn authorized(req: &Request<IncomingBody>, config: &ApiConfig) -> bool {
    let Some(ref token) = config.token else {
        return true;
    };

    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|presented| presented == token)
        .unwrap_or(false)
}

fn json_response(status: StatusCode, body: Value) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

async fn read_body(req: Request<IncomingBody>) -> Result<CommandBody> {
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| ReportError::PreconditionUnmet(format!("failed to read body: {}", e)))?
        .to_bytes();

    if bytes.is_empty() {
        return Ok(CommandBody::default());
    }
    serde_json::from_slice(&bytes).map_err(|e| {
        ReportError::MissingRequiredParameter(format!("request body must be JSON: {}", e))
    })
}

/// One collection cycle, shared by every endpoint.
async fn collect_registry(
    host: &dyn Host,
    command: Option<&str>,
    ctx: Option<&InspectContext>,
) -> Result<Registry> {
    host.ping().await?;
    COLLECTOR_INIT.ensure(host).await?;

    if let Some(cmd) = command {
        if let Err(e) = host.run_command(cmd).await {
            // Same policy as the CLI: a failed observed command does not
            // abort collection.
            warn!(command = cmd, error = %e, "observed command failed");
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

fn record_value(record: &NormalizedRecord) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}

async fn handle_collector(host: &dyn Host, command: Option<&str>, id: &str) -> Result<Value> {
    let registry = collect_registry(host, command, None).await?;
    let snapshot = require_snapshot(&registry, id)?;
    Ok(record_value(&normalize(snapshot, &FormatOptions::default())))
}

async fn handle_post_collector(
    host: &dyn Host,
    req: Request<IncomingBody>,
    id: &str,
) -> Result<Value> {
    let body = read_body(req).await?;
    handle_collector(host, body.command.as_deref(), id).await
}

async fn handle_database(host: &dyn Host, req: Request<IncomingBody>) -> Result<Value> {
    let body = read_body(req).await?;
    let opts = FormatOptions {
        format: OutputFormat::Json,
        threshold: body.threshold.unwrap_or(0.05).max(0.0),
        slow_only: body.slow,
        collectors: CollectorFilter::All,
    };

    let registry = collect_registry(host, body.command.as_deref(), None).await?;
    let snapshot = require_snapshot(&registry, "db_queries")?;
    Ok(record_value(&normalize(snapshot, &opts)))
}

async fn handle_profile(host: &dyn Host, req: Request<IncomingBody>) -> Result<Value> {
    let body = read_body(req).await?;

    host.ping().await?;
    COLLECTOR_INIT.ensure(host).await?;

    // The timer brackets the observed command alone; dump transfer and
    // parsing stay outside the measurement.
    let start = Instant::now();
    if let Some(cmd) = body.command.as_deref() {
        if let Err(e) = host.run_command(cmd).await {
            warn!(command = cmd, error = %e, "observed command failed");
        }
    }
    let wall_time = start.elapsed().as_secs_f64();

    let registry = Registry::from_dump(host.collect(None).await?);

    let opts = FormatOptions::default();
    let overview = match normalize(require_snapshot(&registry, "overview")?, &opts) {
        NormalizedRecord::Overview(record) => record,
        _ => {
            return Err(ReportError::PreconditionUnmet(
                "overview collector returned an unexpected shape".into(),
            ))
        }
    };
    let queries = match normalize(require_snapshot(&registry, "db_queries")?, &opts) {
        NormalizedRecord::DbQueries(record) => record,
        _ => {
            return Err(ReportError::PreconditionUnmet(
                "db_queries collector returned an unexpected shape".into(),
            ))
        }
    };

    let summary = ProfileSummary {
        command: body.command,
        wall_time,
        current_memory: overview.current_memory,
        memory_limit: overview.memory_limit,
        total_queries: queries.total_queries,
        query_time: queries.total_time,
    };
    Ok(serde_json::to_value(&summary).unwrap_or(Value::Null))
}

/// Parse a query string into decoded key/value pairs.
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (
                percent_decode_str(key).decode_utf8_lossy().into_owned(),
                percent_decode_str(&value.replace('+', " "))
                    .decode_utf8_lossy()
                    .into_owned(),
            )
        })
        .collect()
}

async fn handle_inspect(host: &dyn Host, query: Option<&str>) -> Result<Value> {
    let params = parse_query(query.unwrap_or(""));
    let get = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let post_id = match get("post_id") {
        Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
            ReportError::MissingRequiredParameter("post_id must be an integer".into())
        })?),
        None => None,
    };

    host.ping().await?;
    COLLECTOR_INIT.ensure(host).await?;

    let (post, url) = resolve_target(host, post_id, get("slug"), get("url")).await?;

    let ctx = InspectContext {
        post_id: post.as_ref().map(|p| p.id).or(post_id),
        url: url.clone(),
    };
    let dump = host.collect(Some(&ctx)).await?;
    let registry = Registry::from_dump(dump);

    let opts = FormatOptions {
        format: OutputFormat::Json,
        collectors: CollectorFilter::parse(get("collectors")),
        ..FormatOptions::default()
    };
    let meta = ReportMeta {
        url,
        post_id: ctx.post_id,
        post,
        command: None,
    };

    Ok(Report::assemble(&registry, &opts, meta).to_json())
}
