//! Plain holdout training

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use stroke_lib::predictor::ForestParams;
use stroke_lib::{dataset, preprocess, trainer};
use tracing::info;

#[derive(Args)]
pub struct TrainArgs {
    /// Path to the raw stroke dataset
    #[arg(long, default_value = "data/healthcare-dataset-stroke-data.csv")]
    pub data: PathBuf,

    /// Where to write the trained model artifact
    #[arg(long, default_value = "models/model.bin")]
    pub output: PathBuf,
}

pub fn run(args: TrainArgs) -> Result<()> {
    let records = dataset::load_records(&args.data)?;
    let data = preprocess::clean_and_encode(&records)?;
    info!(
        rows = data.len(),
        features = data.feature_names.len(),
        "Dataset preprocessed"
    );

    let report = trainer::train_holdout(&data, ForestParams::default())?;
    info!(accuracy = report.accuracy, "Training complete");

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&args.output, report.model.to_bytes()?)
        .with_context(|| format!("failed to write model to {}", args.output.display()))?;
    info!(path = %args.output.display(), "Model saved");

    Ok(())
}
