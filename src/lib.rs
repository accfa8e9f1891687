//! wpqm - Query Monitor diagnostic reports for WordPress.
//!
//! This crate turns raw Query Monitor collector dumps from a WordPress
//! host into normalized diagnostic reports, served over two surfaces: a
//! CLI with per-collector subcommands and a small JSON HTTP API.
//!
//! # Architecture
//!
//! The collectors themselves run inside WordPress; this crate talks to
//! them through the pluggable [`host::Host`] bridge:
//!
//! - `WpCliHost` - production bridge, shells out to WP-CLI
//! - `FixtureHost` - replays a pre-recorded dump for offline use and tests
//!
//! A collection cycle parses the dump into a [`collector::Registry`] of
//! typed snapshots, normalizes each snapshot into a flat record, and
//! assembles the records into a [`report::Report`] that the renderers
//! turn into tables, JSON, or CSV.
//!
//! # Example
//!
//! ```rust,ignore
//! use wpqm::host::{FixtureHost, Host};
//! use wpqm::collector::Registry;
//!
//! let host = FixtureHost::from_file("dump.json")?;
//! let registry = Registry::from_dump(host.collect(None).await?);
//! ```

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git commit hash (8 chars), empty when built outside a checkout
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");

/// Full version string: "0.1.0 (abc12345)"
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_VERSION"), ")");

pub mod api;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod host;
pub mod render;
pub mod report;

// Re-exports for convenience
pub use config::Config;
pub use error::{ReportError, Result};
