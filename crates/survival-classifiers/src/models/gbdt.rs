use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;

use crate::error::{PredictionFailure, Result};
use crate::models::classifier_trait::ClassifierModel;

/// Gradient Boosting Decision Tree (GBDT) classifier loaded from disk.
///
/// Both native `gbdt` models and XGBoost JSON dumps end up as the same tree
/// ensemble; only the loader differs.
///
/// Native models record their training feature size. XGBoost dumps do not,
/// so for those the width is only known through the configured columns.
pub struct GBDTClassifier {
    model: GBDT,
    source: PathBuf,
    feature_size: Option<usize>,
}

impl GBDTClassifier {
    /// Load a model written by `GBDT::save_model`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let model = GBDT::load_model(&path.to_string_lossy()).map_err(|e| {
            PredictionFailure::ModelLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            feature_size: trained_feature_size(&model),
            model,
            source: path.to_path_buf(),
        })
    }

    /// Load an XGBoost model dumped as JSON. `objective` must be the one the
    /// booster was trained with, e.g. `binary:logistic`.
    pub fn from_xgboost_dump<P: AsRef<Path>>(path: P, objective: &str) -> Result<Self> {
        let path = path.as_ref();
        let model = GBDT::from_xgboost_dump(&path.to_string_lossy(), objective).map_err(|e| {
            PredictionFailure::ModelLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            model,
            source: path.to_path_buf(),
            feature_size: None,
        })
    }

    pub fn from_model(model: GBDT) -> Self {
        Self {
            feature_size: trained_feature_size(&model),
            model,
            source: PathBuf::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// `GBDT` keeps its config private but serializes it; `feature_size` is read
/// back from there.
fn trained_feature_size(model: &GBDT) -> Option<usize> {
    let value = serde_json::to_value(model).ok()?;
    let size = value.get("conf")?.get("feature_size")?.as_u64()?;
    usize::try_from(size).ok().filter(|&n| n > 0)
}

impl ClassifierModel for GBDTClassifier {
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        if let Some(expected) = self.feature_size {
            if x.ncols() != expected {
                return Err(PredictionFailure::FeatureCount {
                    expected,
                    found: x.ncols(),
                });
            }
        }

        let mut test_x = DataVec::with_capacity(x.nrows());
        for row in x.rows() {
            test_x.push(Data::new_training_data(row.to_vec(), 1.0, 0.0, None));
        }
        // gbdt asserts on rows narrower than the trees expect.
        let predictions = catch_unwind(AssertUnwindSafe(|| self.model.predict(&test_x)))
            .map_err(|_| {
                PredictionFailure::Inference(format!(
                    "gbdt rejected rows of {} features",
                    x.ncols()
                ))
            })?;
        if let Some(bad) = predictions.iter().find(|p| !p.is_finite()) {
            return Err(PredictionFailure::Inference(format!(
                "gbdt produced a non-finite score: {}",
                bad
            )));
        }
        Ok(predictions)
    }

    fn n_features(&self) -> Option<usize> {
        self.feature_size
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbdt::config::Config;

    fn train_tiny_model() -> GBDT {
        let mut config = Config::new();
        config.set_feature_size(2);
        config.set_shrinkage(0.1);
        config.set_max_depth(3);
        config.set_iterations(3);
        config.set_debug(false);
        config.set_training_optimization_level(2);
        config.set_loss("LogLikelyhood");

        let rows = [
            ([1.0, 0.0], 1.0),
            ([0.0, 1.0], -1.0),
            ([1.0, 0.1], 1.0),
            ([0.0, 0.9], -1.0),
            ([1.1, 0.0], 1.0),
            ([0.0, 1.2], -1.0),
        ];
        let mut train_x = DataVec::new();
        for (features, label) in rows {
            train_x.push(Data::new_training_data(features.to_vec(), 1.0, label, None));
        }

        let mut gbdt = GBDT::new(&config);
        gbdt.fit(&mut train_x);
        gbdt
    }

    #[test]
    fn test_gbdt_classifier_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny_gbdt.json");
        train_tiny_model()
            .save_model(path.to_str().unwrap())
            .unwrap();

        let classifier = GBDTClassifier::load(&path).unwrap();
        assert_eq!(classifier.source(), path.as_path());

        let x = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let probs = classifier.predict_proba(&x).unwrap();
        assert_eq!(probs.len(), 2);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_gbdt_records_training_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny_gbdt.json");
        train_tiny_model()
            .save_model(path.to_str().unwrap())
            .unwrap();

        let classifier = GBDTClassifier::load(&path).unwrap();
        assert_eq!(classifier.n_features(), Some(2));

        let wide = Array2::<f32>::zeros((1, 7));
        match classifier.predict_proba(&wide) {
            Err(PredictionFailure::FeatureCount { expected, found }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 7);
            }
            other => panic!("expected FeatureCount, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_schema_is_reported_not_panicked() {
        use crate::config::{ModelConfig, ModelFormat};
        use crate::encoding::FeatureSchema;
        use crate::passenger::{PassengerClass, PassengerRequest, Port, Sex};
        use crate::predictor::Predictor;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny_gbdt.json");
        train_tiny_model()
            .save_model(path.to_str().unwrap())
            .unwrap();

        let config = ModelConfig::new(&path, ModelFormat::Gbdt, FeatureSchema::LabelEncoded);
        let predictor = Predictor::from_config(&config).unwrap();
        let request = PassengerRequest::new(
            PassengerClass::First,
            Sex::Female,
            29.0,
            100.0,
            0,
            0,
            Port::Cherbourg,
        )
        .unwrap();

        match predictor.predict(&request) {
            Err(PredictionFailure::FeatureCount { expected, found }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 7);
            }
            other => panic!("expected FeatureCount, got {:?}", other),
        }
    }

    #[test]
    fn test_gbdt_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        std::fs::write(&path, "not a model").unwrap();
        assert!(matches!(
            GBDTClassifier::load(&path),
            Err(PredictionFailure::ModelLoad { .. })
        ));
    }
}
