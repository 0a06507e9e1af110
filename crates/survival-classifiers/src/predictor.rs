//! Encoder + classifier wired together behind one explicit handle.
//!
//! The entry point builds a [`ModelSlot`] once at startup and shares it
//! read-only with every request; nothing here is global.
use std::fmt;

use serde::Serialize;

use crate::config::ModelConfig;
use crate::encoding::FeatureEncoder;
use crate::error::{PredictionFailure, Result};
use crate::models::factory;
use crate::models::ClassifierModel;
use crate::passenger::PassengerRequest;

pub const SURVIVED_LABEL: &str = "Survived";
pub const DID_NOT_SURVIVE_LABEL: &str = "Did not survive";

/// Binary outcome for one passenger.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Verdict {
    pub survived: bool,
    pub probability: f32,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        if self.survived {
            SURVIVED_LABEL
        } else {
            DID_NOT_SURVIVE_LABEL
        }
    }

    pub fn message(&self) -> &'static str {
        if self.survived {
            "Congratulations! The passenger would have survived."
        } else {
            "Sorry, the passenger would not have survived."
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (p = {:.3})", self.label(), self.probability)
    }
}

pub struct Predictor {
    encoder: FeatureEncoder,
    model: Box<dyn ClassifierModel>,
    threshold: f32,
}

impl Predictor {
    pub fn new(encoder: FeatureEncoder, model: Box<dyn ClassifierModel>, threshold: f32) -> Self {
        Self {
            encoder,
            model,
            threshold,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let encoder = FeatureEncoder::from_config(config)?;
        let model = factory::load_model(config)?;
        Ok(Self::new(encoder, model, config.threshold))
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn predict(&self, request: &PassengerRequest) -> Result<Verdict> {
        let verdicts = self.predict_batch(std::slice::from_ref(request))?;
        verdicts
            .into_iter()
            .next()
            .ok_or_else(|| PredictionFailure::Inference("model returned no prediction".to_string()))
    }

    pub fn predict_batch(&self, requests: &[PassengerRequest]) -> Result<Vec<Verdict>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.model.n_features() {
            if expected != self.encoder.width() {
                return Err(PredictionFailure::FeatureCount {
                    expected,
                    found: self.encoder.width(),
                });
            }
        }

        let x = self.encoder.encode_batch(requests);
        let probabilities = self.model.predict_proba(&x)?;
        if probabilities.len() != requests.len() {
            return Err(PredictionFailure::Inference(format!(
                "model returned {} predictions for {} rows",
                probabilities.len(),
                requests.len()
            )));
        }

        Ok(probabilities
            .into_iter()
            .map(|probability| Verdict {
                survived: probability >= self.threshold,
                probability,
            })
            .collect())
    }
}

/// The model handle as seen by a long-running process: either ready, or the
/// reason it could not be loaded. An unavailable slot answers every request
/// with that reason and never reaches a model.
pub enum ModelSlot {
    Ready(Predictor),
    Unavailable(PredictionFailure),
}

impl ModelSlot {
    pub fn load(config: &ModelConfig) -> Self {
        Self::from_loader(|| Predictor::from_config(config))
    }

    pub fn from_loader<F>(loader: F) -> Self
    where
        F: FnOnce() -> Result<Predictor>,
    {
        match loader() {
            Ok(predictor) => ModelSlot::Ready(predictor),
            Err(e) => {
                log::error!("Model unavailable: {}", e);
                ModelSlot::Unavailable(e)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelSlot::Ready(_))
    }

    pub fn predictor(&self) -> Result<&Predictor> {
        match self {
            ModelSlot::Ready(predictor) => Ok(predictor),
            ModelSlot::Unavailable(e) => Err(e.clone()),
        }
    }

    pub fn predict(&self, request: &PassengerRequest) -> Result<Verdict> {
        self.predictor()?.predict(request)
    }
}
