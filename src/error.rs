//! Caller-visible error types for the report pipeline.
//!
//! Extraction defaults absorb missing-field problems inside the normalizer;
//! only the kinds below ever surface to a CLI or API caller. Each kind maps
//! to a stable machine-checkable code and an HTTP status.

use std::fmt;

use crate::host::HostError;

/// Errors surfaced by report-pipeline entry points.
#[derive(Debug)]
pub enum ReportError {
    /// The host or its collector subsystem is unreachable. Fatal.
    PreconditionUnmet(String),

    /// A requested collector id is not registered.
    CollectorMissing { collector: String },

    /// The optional observed command failed. Logged as a warning by
    /// callers; never aborts an invocation on its own.
    ActionExecutionIssue(String),

    /// None of post_id/slug/url was supplied.
    MissingRequiredParameter(String),

    /// A slug or post id did not resolve to a post.
    ResourceNotFound(String),
}

impl ReportError {
    /// Stable machine-checkable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ReportError::PreconditionUnmet(_) => "precondition_unmet",
            ReportError::CollectorMissing { .. } => "collector_not_found",
            ReportError::ActionExecutionIssue(_) => "action_execution_issue",
            ReportError::MissingRequiredParameter(_) => "missing_parameter",
            ReportError::ResourceNotFound(_) => "not_found",
        }
    }

    /// HTTP status the API maps this error to.
    pub fn http_status(&self) -> u16 {
        match self {
            ReportError::PreconditionUnmet(_) => 503,
            ReportError::CollectorMissing { .. } => 404,
            ReportError::ActionExecutionIssue(_) => 500,
            ReportError::MissingRequiredParameter(_) => 400,
            ReportError::ResourceNotFound(_) => 404,
        }
    }

    pub fn collector_missing(id: impl Into<String>) -> Self {
        ReportError::CollectorMissing {
            collector: id.into(),
        }
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::PreconditionUnmet(msg) => {
                write!(f, "precondition unmet: {}", msg)
            }
            ReportError::CollectorMissing { collector } => {
                write!(f, "{} collector not found", collector)
            }
            ReportError::ActionExecutionIssue(msg) => {
                write!(f, "command execution had issues: {}", msg)
            }
            ReportError::MissingRequiredParameter(msg) => write!(f, "{}", msg),
            ReportError::ResourceNotFound(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<HostError> for ReportError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::Unreachable(msg) => ReportError::PreconditionUnmet(msg),
            HostError::CommandFailed(msg) => ReportError::ActionExecutionIssue(msg),
            HostError::BadDump(msg) => {
                ReportError::PreconditionUnmet(format!("invalid collector dump: {}", msg))
            }
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReportError::PreconditionUnmet("Query Monitor plugin is not active".into());
        assert_eq!(
            err.to_string(),
            "precondition unmet: Query Monitor plugin is not active"
        );

        let err = ReportError::collector_missing("environment");
        assert_eq!(err.to_string(), "environment collector not found");
    }

    #[test]
    fn test_error_codes_and_status() {
        assert_eq!(
            ReportError::MissingRequiredParameter("x".into()).http_status(),
            400
        );
        assert_eq!(ReportError::collector_missing("http").http_status(), 404);
        assert_eq!(
            ReportError::collector_missing("http").code(),
            "collector_not_found"
        );
        assert_eq!(
            ReportError::PreconditionUnmet("down".into()).http_status(),
            503
        );
    }

    #[test]
    fn test_from_host_error() {
        let err: ReportError = HostError::Unreachable("no wp binary".into()).into();
        assert!(matches!(err, ReportError::PreconditionUnmet(_)));

        let err: ReportError = HostError::CommandFailed("exit 1".into()).into();
        assert!(matches!(err, ReportError::ActionExecutionIssue(_)));
    }
}
