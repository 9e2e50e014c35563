//! The girder inclusion prover daemon.
//!
//! For every finalized execution state root a destination chain accepts, the
//! daemon rediscovers the covered bridge deposits and dispatched messages on
//! the source chain, constructs the account/storage and beacon/receipt
//! inclusion proofs, and submits them to the destination's contracts.
//! Configuration is entirely environment-driven under the
//! `INCLUSION_PROVER` prefix.

use clap::Parser;
use tracing::info;

mod app;
mod config;
mod health;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = config::GlobalArgs::parse();
    let _guard = telemetry::init(&args.log_level, &args.log_file)?;

    info!(target: "girder", "Started girder inclusion prover");
    app::run(args).await
}
