use std::sync::Arc;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wpqm::cli::{commands, Cli, Command};
use wpqm::config::Config;
use wpqm::host::{FixtureHost, Host, WpCliHost};

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Logs go to stderr so table and JSON output stay pipeable.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Invocations are sequential request/response cycles against one
    // host; a single-threaded runtime is enough.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli, config)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let host: Arc<dyn Host> = match cli.input {
        Some(ref path) => {
            debug!(path = %path.display(), "using fixture host");
            Arc::new(FixtureHost::from_file(path)?)
        }
        None => Arc::new(WpCliHost::new(&config.host)),
    };

    let output = match cli.command {
        Command::Env(args) => commands::env(&*host, &args).await?,
        Command::Db(args) => commands::db(&*host, &args).await?,
        Command::Profile(args) => commands::profile(&*host, &args).await?,
        Command::Http(args) => commands::http(&*host, &args).await?,
        Command::Hooks(args) => commands::hooks(&*host, &args).await?,
        Command::Errors(args) => commands::errors(&*host, &args).await?,
        Command::Inspect(args) => commands::inspect(&*host, &args).await?,
        Command::Serve => {
            config.log_summary();
            tokio::select! {
                result = wpqm::api::serve(config.api, host) => result?,
                _ = tokio::signal::ctrl_c() => {
                    debug!("shutting down");
                }
            }
            return Ok(());
        }
    };

    print!("{}", output);
    Ok(())
}
