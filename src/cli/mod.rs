//! Command-line interface.
//!
//! Every diagnostic subcommand follows the same shape: reach the host,
//! ensure the collector subsystem is bootstrapped, optionally run a
//! command under observation, collect a dump, and render the requested
//! collector. `--input` swaps the WP-CLI bridge for a pre-recorded dump
//! file, which keeps every command usable offline.

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::render::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "wpqm")]
#[command(version)]
#[command(about = "Query Monitor diagnostic reports for a WordPress installation")]
pub struct Cli {
    /// Read collector data from a pre-recorded dump file instead of WP-CLI
    #[arg(long, global = true, value_name = "FILE")]
    pub input: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show PHP, WordPress, and database environment information
    Env(FormatArgs),
    /// Report captured database queries
    Db(DbArgs),
    /// Measure wall time, memory, and query load, optionally around a command
    Profile(CommandArgs),
    /// Report outbound HTTP requests
    Http(CommandArgs),
    /// Report fired hooks
    Hooks(CommandArgs),
    /// Report captured PHP errors
    Errors(CommandArgs),
    /// Full inspection report for a post or URL
    Inspect(InspectArgs),
    /// Run the HTTP API server
    Serve,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Output format: table or json
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct DbArgs {
    /// Output format: table, json, or csv
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,

    /// Only show queries at or above the slow threshold
    #[arg(long)]
    pub slow_only: bool,

    /// Slow-query threshold in seconds
    #[arg(long, default_value_t = 0.05)]
    pub threshold: f64,

    /// Command to run under observation before collecting
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,
}

#[derive(Args, Debug)]
pub struct CommandArgs {
    /// Output format: table or json
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,

    /// Command to run under observation before collecting
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Post ID to inspect
    #[arg(long)]
    pub post_id: Option<u64>,

    /// Post slug to inspect
    #[arg(long)]
    pub slug: Option<String>,

    /// URL to inspect
    #[arg(long)]
    pub url: Option<String>,

    /// Comma-separated collector ids to include (default: all)
    #[arg(long)]
    pub collectors: Option<String>,

    /// Output format: table or json
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_db_flags() {
        let cli = Cli::parse_from([
            "wpqm",
            "db",
            "--slow-only",
            "--threshold",
            "0.1",
            "--format",
            "csv",
        ]);
        match cli.command {
            Command::Db(args) => {
                assert!(args.slow_only);
                assert!((args.threshold - 0.1).abs() < 1e-9);
                assert_eq!(args.format, OutputFormat::Csv);
                assert!(args.command.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_global_input() {
        let cli = Cli::parse_from(["wpqm", "env", "--input", "dump.json"]);
        assert_eq!(cli.input.as_deref(), Some(std::path::Path::new("dump.json")));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["wpqm", "env", "--format", "yaml"]).is_err());
    }

    #[test]
    fn test_db_rejects_bare_slow_flag() {
        assert!(Cli::try_parse_from(["wpqm", "db", "--slow"]).is_err());
    }

    #[test]
    fn test_inspect_args() {
        let cli = Cli::parse_from([
            "wpqm",
            "inspect",
            "--slug",
            "hello-world",
            "--collectors",
            "db_queries,http",
        ]);
        match cli.command {
            Command::Inspect(args) => {
                assert_eq!(args.slug.as_deref(), Some("hello-world"));
                assert_eq!(args.collectors.as_deref(), Some("db_queries,http"));
                assert!(args.post_id.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
