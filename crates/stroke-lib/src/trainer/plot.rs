//! Optimization-history rendering

use crate::error::{Error, Result};
use crate::trainer::search::TrialRecord;
use plotters::prelude::*;
use std::path::Path;

/// Render the per-trial mean accuracies and the running best as an SVG
/// chart, one point per trial.
pub fn render_history(trials: &[TrialRecord], path: &Path) -> Result<()> {
    if trials.is_empty() {
        return Err(Error::training("no trials to plot"));
    }

    let (y_min, y_max) = trials.iter().fold((f64::MAX, f64::MIN), |(lo, hi), t| {
        (lo.min(t.mean_accuracy), hi.max(t.mean_accuracy))
    });
    let pad = ((y_max - y_min) * 0.1).max(0.01);
    let x_max = trials.len() as f64 - 0.5;

    let root = SVGBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Optimization History", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(-0.5f64..x_max, (y_min - pad)..(y_max + pad))
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("Trial")
        .y_desc("Mean CV accuracy")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(trials.iter().map(|t| {
            Circle::new((t.number as f64, t.mean_accuracy), 4, BLUE.filled())
        }))
        .map_err(plot_err)?;

    let mut running_best = f64::MIN;
    let best_line: Vec<(f64, f64)> = trials
        .iter()
        .map(|t| {
            running_best = running_best.max(t.mean_accuracy);
            (t.number as f64, running_best)
        })
        .collect();
    chart
        .draw_series(LineSeries::new(best_line, &RED))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

fn plot_err(e: impl std::fmt::Display) -> Error {
    Error::training(format!("failed to render optimization history: {e}"))
}
