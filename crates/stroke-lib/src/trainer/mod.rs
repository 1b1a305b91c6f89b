//! Model training
//!
//! Two modes: a plain holdout fit and a cross-validated random search over
//! forest hyperparameters.

mod holdout;
mod plot;
mod search;

pub use holdout::{train_holdout, HoldoutReport, HOLDOUT_SEED, TEST_FRACTION};
pub use plot::render_history;
pub use search::{
    run_search, stratified_folds, SearchConfig, SearchOutcome, TrialRecord, CV_FOLDS,
    MAX_DEPTH_RANGE, N_TREES_RANGE,
};
