//! Fixture host that replays a pre-recorded collector dump.
//!
//! Used for offline rendering of dumps exported from a host (`--input`)
//! and as the test double for the pipeline.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{Host, HostDump, HostError, InspectContext, PostRef};

/// Host backed by a single JSON document:
/// `{"collectors": {...}, "posts": [...], "reachable": bool,
/// "failing_commands": [...]}`.
pub struct FixtureHost {
    document: Value,
    reachable: bool,
    posts: Vec<PostRef>,
    failing: Vec<String>,
    commands: Mutex<Vec<String>>,
}

impl FixtureHost {
    pub fn from_value(document: Value) -> Result<Self, HostError> {
        let reachable = document
            .get("reachable")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        let posts = match document.get("posts") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| HostError::BadDump(format!("posts index: {}", e)))?,
            None => Vec::new(),
        };

        let failing = match document.get("failing_commands") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| HostError::BadDump(format!("failing_commands: {}", e)))?,
            None => Vec::new(),
        };

        Ok(Self {
            document,
            reachable,
            posts,
            failing,
            commands: Mutex::new(Vec::new()),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, HostError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HostError::Unreachable(format!("{}: {}", path.display(), e)))?;
        let document = serde_json::from_str(&raw)
            .map_err(|e| HostError::BadDump(format!("{}: {}", path.display(), e)))?;
        Self::from_value(document)
    }

    /// Commands that were run under observation, in order.
    pub fn commands_run(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl Host for FixtureHost {
    async fn ping(&self) -> Result<(), HostError> {
        if self.reachable {
            Ok(())
        } else {
            Err(HostError::Unreachable(
                "Query Monitor plugin is not active".to_string(),
            ))
        }
    }

    async fn init(&self) -> Result<(), HostError> {
        self.ping().await
    }

    async fn run_command(&self, command: &str) -> Result<(), HostError> {
        if self.failing.iter().any(|c| c == command) {
            return Err(HostError::CommandFailed(format!(
                "fixture command refused: {}",
                command
            )));
        }
        self.commands.lock().unwrap().push(command.to_string());
        Ok(())
    }

    async fn collect(&self, _ctx: Option<&InspectContext>) -> Result<HostDump, HostError> {
        HostDump::from_value(self.document.clone())
    }

    async fn resolve_slug(&self, slug: &str) -> Result<Option<PostRef>, HostError> {
        Ok(self.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn post(&self, id: u64) -> Result<Option<PostRef>, HostError> {
        Ok(self.posts.iter().find(|p| p.id == id).cloned())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
