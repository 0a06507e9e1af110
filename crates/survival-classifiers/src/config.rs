use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::encoding::FeatureSchema;

/// Where the trained classifier lives and how to read it.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,

    pub format: ModelFormat,

    /// Objective handed to the XGBoost dump loader.
    pub objective: String,

    /// Feature layout the model was trained on.
    pub schema: FeatureSchema,

    /// Training columns of the model, in order. When present they must equal
    /// the schema's columns exactly.
    pub columns: Option<Vec<String>>,

    /// Per-column label encoder table for the `label_encoded` schema.
    pub label_encoders: Option<PathBuf>,

    /// Probability at or above which a passenger is predicted to survive.
    pub threshold: f32,
}

/// Supported artifact formats.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// Model written by `gbdt::gradient_boost::GBDT::save_model`.
    Gbdt,
    /// XGBoost JSON dump.
    Xgboost,
    /// JSON logistic-regression coefficients.
    Logistic,
}

impl Default for ModelFormat {
    fn default() -> Self {
        ModelFormat::Gbdt
    }
}

impl ModelFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ModelFormat::Gbdt => "gbdt",
            ModelFormat::Xgboost => "xgboost",
            ModelFormat::Logistic => "logistic",
        }
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gbdt" => Ok(ModelFormat::Gbdt),
            "xgboost" => Ok(ModelFormat::Xgboost),
            "logistic" => Ok(ModelFormat::Logistic),
            _ => Err(format!(
                "Unknown model format: {}. Expected one of gbdt, xgboost, logistic",
                s
            )),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("survival_model.json"),
            format: ModelFormat::default(),
            objective: "binary:logistic".to_string(),
            schema: FeatureSchema::default(),
            columns: None,
            label_encoders: None,
            threshold: 0.5,
        }
    }
}

impl ModelConfig {
    pub fn new<P: Into<PathBuf>>(path: P, format: ModelFormat, schema: FeatureSchema) -> Self {
        Self {
            path: path.into(),
            format,
            schema,
            ..Self::default()
        }
    }

    /// Reject settings that would load but make every prediction meaningless.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.threshold.is_finite() && (0.0..=1.0).contains(&self.threshold),
            "threshold must be within [0, 1], got {}",
            self.threshold
        );
        Ok(())
    }
}

/// Load a model configuration from a JSON file.
pub fn load_model_config<P: AsRef<Path>>(path: P) -> Result<ModelConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: ModelConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config: {}", path.as_ref().display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, r#"{"format": "logistic"}"#).unwrap();

        let config = load_model_config(&path).unwrap();
        assert_eq!(config.format, ModelFormat::Logistic);
        assert_eq!(config.schema, FeatureSchema::OneHot);
        assert!((config.threshold - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_outside_unit_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, r#"{"threshold": 5.0}"#).unwrap();
        assert!(load_model_config(&path).is_err());

        let mut config = ModelConfig::default();
        config.threshold = -0.1;
        assert!(config.validate().is_err());
        config.threshold = 1.0;
        assert!(config.validate().is_ok());
    }
}
