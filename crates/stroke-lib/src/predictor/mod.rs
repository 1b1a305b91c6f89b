//! Model wrapping, persistence and load-once resolution

mod forest;
mod loader;

pub use forest::{fit_forest, Forest, ForestParams, StrokeForest};
pub use loader::{ModelLoader, ModelSource};
