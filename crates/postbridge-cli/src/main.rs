//! Postbridge CLI - inspect endpoint registries and run exchanges against
//! the in-process loopback host.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "postbridge")]
#[command(about = "One-shot cross-context transport tooling")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// JSON file mapping endpoint names to handler addresses
    #[arg(long, global = true, conflicts_with = "handler_host")]
    config: Option<PathBuf>,

    /// Handler host for the stock `mmdb` endpoint
    #[arg(long, global = true, default_value = commands::DEFAULT_HANDLER_HOST)]
    handler_host: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered endpoints
    Endpoints,

    /// Show the destination an endpoint name resolves to
    Resolve { name: String },

    /// Run one exchange against an echoing loopback surface
    Ping {
        /// Endpoint to target
        #[arg(default_value = "mmdb")]
        name: String,

        /// Request parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,

        /// Give up after this many milliseconds per phase (0 = wait forever)
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let registry = commands::load_registry(args.config.as_deref(), &args.handler_host)?;
    debug!("Loaded {} endpoint(s)", registry.len());

    let output = match args.command {
        Command::Endpoints => commands::list_endpoints(&registry),
        Command::Resolve { name } => commands::resolve(&registry, &name)?,
        Command::Ping {
            name,
            params,
            timeout_ms,
        } => commands::ping(registry, &name, &params, timeout_ms).await?,
    };

    println!("{}", output);
    Ok(())
}
