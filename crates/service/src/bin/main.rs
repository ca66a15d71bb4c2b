// SPDX-License-Identifier: Apache-2.0
//! Coordinator process entry point.

use clap::Parser;
use eyre::Result;
use rdc_common::logging;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

/// Remote diagnostic computation coordinator.
#[derive(Parser, Debug)]
#[command(name = "rdc-service")]
#[command(about = "Coordinates diagnostic computation over a long-lived analyzer host")]
#[command(version)]
struct Args {
    /// Verbosity level (repeat for more: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    logging::init_logging("rdc-service", default_level)
        .map_err(|e| eyre::eyre!("failed to initialize logging: {e}"))?;

    let shutdown = CancellationToken::new();
    let serving = tokio::spawn(rdc_service::serve_stdio(shutdown.clone()));

    tokio::select! {
        result = serving => {
            result.map_err(|e| eyre::eyre!("request loop panicked: {e}"))??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
            shutdown.cancel();
        }
    }

    Ok(())
}
