//! Report rendering.
//!
//! Renderers serialize an assembled report to an output sink. They never
//! mutate report state. JSON mirrors the report structure with key order
//! equal to collector processing order; text applies per-collector layout
//! rules (truncation widths, sample caps, summary-line-first).

pub mod json;
pub mod text;

use std::fmt;
use std::str::FromStr;

/// Target output form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    /// Only honored by row-oriented collectors (queries, HTTP calls);
    /// other commands reject it at the CLI boundary.
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!(
                "invalid format '{}' (expected table, json, or csv)",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_round_trip() {
        for raw in ["table", "json", "csv"] {
            let format: OutputFormat = raw.parse().unwrap();
            assert_eq!(format.to_string(), raw);
        }
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
