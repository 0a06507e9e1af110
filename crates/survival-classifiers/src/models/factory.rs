use crate::config::{ModelConfig, ModelFormat};
use crate::error::{PredictionFailure, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::gbdt::GBDTClassifier;
use crate::models::logistic::LogisticClassifier;

/// Load the classifier a `ModelConfig` points at and check its declared
/// training columns against the configured schema.
///
/// A missing file is reported before any loader runs.
pub fn load_model(config: &ModelConfig) -> Result<Box<dyn ClassifierModel>> {
    if !config.path.exists() {
        return Err(PredictionFailure::ModelNotFound {
            path: config.path.clone(),
        });
    }

    let model: Box<dyn ClassifierModel> = match config.format {
        ModelFormat::Gbdt => Box::new(GBDTClassifier::load(&config.path)?),
        ModelFormat::Xgboost => Box::new(GBDTClassifier::from_xgboost_dump(
            &config.path,
            &config.objective,
        )?),
        ModelFormat::Logistic => {
            let logistic = LogisticClassifier::load(&config.path)?;
            config.schema.check_columns(&logistic.columns)?;
            Box::new(logistic)
        }
    };

    match &config.columns {
        Some(columns) => config.schema.check_columns(columns)?,
        None if config.format != ModelFormat::Logistic => log::warn!(
            "No training columns configured for {}; assuming the {} layout",
            config.path.display(),
            config.schema
        ),
        None => {}
    }

    log::info!(
        "Loaded {} model from {} ({} schema)",
        model.name(),
        config.path.display(),
        config.schema
    );
    Ok(model)
}
