//! Production host bridge that shells out to WP-CLI.
//!
//! Relies on the companion `wp qm dump` command (provided by the Query
//! Monitor CLI plugin on the host side) to emit collector data as JSON.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{Host, HostDump, HostError, InspectContext, PostRef};
use crate::config::HostConfig;

/// Host bridge backed by the `wp` binary.
pub struct WpCliHost {
    wp_bin: String,
    wp_path: Option<String>,
}

impl WpCliHost {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            wp_bin: config.wp_bin.clone(),
            wp_path: config.wp_path.clone(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.wp_bin);
        if let Some(ref path) = self.wp_path {
            cmd.arg(format!("--path={}", path));
        }
        cmd
    }

    /// Run a wp-cli invocation and return stdout.
    async fn run(&self, args: &[&str]) -> Result<String, HostError> {
        let output = self
            .command()
            .args(args)
            .output()
            .await
            .map_err(|e| HostError::Unreachable(format!("{}: {}", self.wp_bin, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HostError::CommandFailed(format!(
                "wp {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Host for WpCliHost {
    async fn ping(&self) -> Result<(), HostError> {
        self.run(&["plugin", "is-active", "query-monitor"])
            .await
            .map_err(|_| {
                HostError::Unreachable("Query Monitor plugin is not active".to_string())
            })?;
        Ok(())
    }

    async fn init(&self) -> Result<(), HostError> {
        debug!("initializing Query Monitor collectors via wp-cli");
        self.run(&["qm", "init"]).await.map(|_| ()).map_err(|e| {
            HostError::Unreachable(format!("collector init failed: {}", e))
        })
    }

    async fn run_command(&self, command: &str) -> Result<(), HostError> {
        let args: Vec<&str> = command.split_whitespace().collect();
        if args.is_empty() {
            return Ok(());
        }
        debug!(command, "running command under observation");
        self.run(&args).await.map(|_| ())
    }

    async fn collect(&self, ctx: Option<&InspectContext>) -> Result<HostDump, HostError> {
        let mut args: Vec<String> = vec!["qm".into(), "dump".into(), "--format=json".into()];
        if let Some(ctx) = ctx {
            if let Some(post_id) = ctx.post_id {
                args.push(format!("--post_id={}", post_id));
            }
            if let Some(ref url) = ctx.url {
                args.push(format!("--url={}", url));
            }
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let stdout = self.run(&arg_refs).await?;
        let value = serde_json::from_str(&stdout)
            .map_err(|e| HostError::BadDump(e.to_string()))?;
        HostDump::from_value(value)
    }

    async fn resolve_slug(&self, slug: &str) -> Result<Option<PostRef>, HostError> {
        let stdout = self
            .run(&[
                "post",
                "list",
                &format!("--name={}", slug),
                "--post_type=post,page",
                "--format=json",
                "--fields=ID,post_title,post_type,post_status,post_name,url",
            ])
            .await?;

        let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout)
            .map_err(|e| HostError::BadDump(e.to_string()))?;

        Ok(rows.into_iter().next().map(post_from_wp_row))
    }

    async fn post(&self, id: u64) -> Result<Option<PostRef>, HostError> {
        let stdout = match self
            .run(&[
                "post",
                "get",
                &id.to_string(),
                "--format=json",
                "--fields=ID,post_title,post_type,post_status,post_name,url",
            ])
            .await
        {
            Ok(out) => out,
            // wp post get exits non-zero for unknown ids
            Err(HostError::CommandFailed(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let row: serde_json::Value = serde_json::from_str(&stdout)
            .map_err(|e| HostError::BadDump(e.to_string()))?;

        Ok(Some(post_from_wp_row(row)))
    }

    fn name(&self) -> &'static str {
        "wp-cli"
    }
}

/// Map a wp-cli post row (ID/post_title/... keys) onto [`PostRef`].
fn post_from_wp_row(row: serde_json::Value) -> PostRef {
    let get = |key: &str| {
        row.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    PostRef {
        id: row.get("ID").and_then(|v| v.as_u64()).unwrap_or(0),
        title: get("post_title"),
        post_type: get("post_type"),
        status: get("post_status"),
        slug: get("post_name"),
        permalink: get("url"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_from_wp_row() {
        let post = post_from_wp_row(json!({
            "ID": 42,
            "post_title": "Sample Page",
            "post_type": "page",
            "post_status": "publish",
            "post_name": "sample-page",
            "url": "https://example.test/sample-page/",
        }));

        assert_eq!(post.id, 42);
        assert_eq!(post.slug, "sample-page");
        assert_eq!(post.permalink, "https://example.test/sample-page/");
    }

    #[test]
    fn test_post_from_wp_row_defaults() {
        let post = post_from_wp_row(json!({}));
        assert_eq!(post.id, 0);
        assert!(post.title.is_empty());
    }
}
