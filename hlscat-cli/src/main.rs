mod cli;
mod error;
mod params;

use std::process;

use clap::Parser;
use hlscat_engine::{CancellationToken, HlsCat};
use tracing::{Level, error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::cli::Args;
use crate::error::{AppError, Result};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet)?;

    let request = args.grab_request()?;
    let config = args.downloader_config()?;
    let cat = HlsCat::new(config)?;

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl-C, cancelling download");
            ctrl_c_token.cancel();
        }
    });

    let outcome = cat.run(request, &token).await?;
    info!(
        "Saved {} segments ({} bytes) to {}",
        outcome.segment_count,
        outcome.bytes_written,
        outcome.path.display()
    );
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_level(verbose))
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}
