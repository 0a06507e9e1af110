use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use survival_classifiers::config::{ModelConfig, ModelFormat};
use survival_classifiers::encoding::FeatureSchema;

/// Settings shared by every subcommand; only `serve` reads the HTTP fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: String,
    pub model: ModelConfig,
    pub listen_addr: String,
    pub title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            version: clap::crate_version!().to_string(),
            model: ModelConfig::default(),
            listen_addr: String::from("127.0.0.1:8501"),
            title: String::from("Titanic Passenger Survival Prediction"),
        }
    }
}

impl AppConfig {
    /// Load `config_path` when given (defaults otherwise) and apply the
    /// command line overrides present in `matches`.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => load_config(path)?,
            None => {
                log::info!("No config provided; using defaults.");
                AppConfig::default()
            }
        };
        config.apply_overrides(matches)?;
        Ok(config)
    }

    fn apply_overrides(&mut self, matches: &ArgMatches) -> Result<()> {
        if let Some(path) = try_get::<PathBuf>(matches, "model_path") {
            self.model.path = path;
        }
        if let Some(format) = try_get::<String>(matches, "model_format") {
            self.model.format = format.parse::<ModelFormat>().map_err(anyhow::Error::msg)?;
        }
        if let Some(schema) = try_get::<String>(matches, "schema") {
            self.model.schema = schema.parse::<FeatureSchema>().map_err(anyhow::Error::msg)?;
        }
        if let Some(path) = try_get::<PathBuf>(matches, "label_encoders") {
            self.model.label_encoders = Some(path);
        }
        if let Some(threshold) = try_get::<f32>(matches, "threshold") {
            self.model.threshold = threshold;
        }
        if let Some(addr) = try_get::<String>(matches, "listen") {
            self.listen_addr = addr;
        }
        self.model.validate()
    }
}

/// Subcommands declare different flags; a flag that a subcommand lacks is
/// simply not an override.
fn try_get<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Option<T> {
    matches.try_get_one::<T>(id).ok().flatten().cloned()
}

/// Load an application configuration from a JSON file.
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> Result<AppConfig> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: AppConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    config
        .model
        .validate()
        .with_context(|| format!("Invalid config: {}", path.as_ref().display()))?;
    Ok(config)
}
