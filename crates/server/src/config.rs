//! Server configuration

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use stroke_lib::predictor::ModelSource;

/// Prediction service configuration, overridable via `STROKE_*` environment
/// variables (`STROKE_PORT`, `STROKE_TRACKING_URI`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP port for the prediction API
    #[serde(default = "default_port")]
    pub port: u16,

    /// Tracking store the served model is resolved from
    #[serde(default = "default_tracking_uri")]
    pub tracking_uri: String,

    /// Registered model name to serve
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Plain artifact file override; bypasses the registry when set
    #[serde(default)]
    pub model_path: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_tracking_uri() -> String {
    "db/store.db".to_string()
}

fn default_model_name() -> String {
    "StrokePredictor".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            tracking_uri: default_tracking_uri(),
            model_name: default_model_name(),
            model_path: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("STROKE"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Model source the loader resolves from.
    pub fn model_source(&self) -> ModelSource {
        match &self.model_path {
            Some(path) => ModelSource::File(PathBuf::from(path)),
            None => ModelSource::Registry {
                store_path: PathBuf::from(&self.tracking_uri),
                name: self.model_name.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_local_layout() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.tracking_uri, "db/store.db");
        assert_eq!(config.model_name, "StrokePredictor");
        assert!(config.model_path.is_none());
    }

    #[test]
    fn model_path_overrides_the_registry() {
        let config = ServerConfig {
            model_path: Some("models/model.bin".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.model_source(), ModelSource::File(_)));

        let config = ServerConfig::default();
        assert!(matches!(
            config.model_source(),
            ModelSource::Registry { .. }
        ));
    }
}
