//! Tracking-store provisioning

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use stroke_lib::tracking::TrackingStore;
use tracing::info;

#[derive(Args)]
pub struct InitDbArgs {
    /// The destination of the created database file
    #[arg(long, default_value = "db/store.db")]
    pub dest: PathBuf,
}

/// Create (or migrate) the tracking store at the destination. A failure
/// propagates a non-zero exit status.
pub fn run(args: InitDbArgs) -> Result<()> {
    TrackingStore::open(&args.dest).with_context(|| {
        format!(
            "failed to provision tracking store at {}",
            args.dest.display()
        )
    })?;
    info!(path = %args.dest.display(), "Tracking store ready");

    Ok(())
}
