use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{PredictionFailure, Result};
use crate::models::classifier_trait::ClassifierModel;

/// Logistic regression exported as plain coefficients.
///
/// ```json
/// {"columns": ["Pclass", "Sex", ...], "coefficients": [-0.9, -2.6, ...], "intercept": 3.1}
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub columns: Vec<String>,
    pub coefficients: Vec<f32>,
    pub intercept: f32,
}

impl LogisticClassifier {
    pub fn new(columns: Vec<String>, coefficients: Vec<f32>, intercept: f32) -> Result<Self> {
        if columns.len() != coefficients.len() {
            return Err(PredictionFailure::FeatureCount {
                expected: columns.len(),
                found: coefficients.len(),
            });
        }
        Ok(Self {
            columns,
            coefficients,
            intercept,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |reason: String| PredictionFailure::ModelLoad {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let model: LogisticClassifier =
            serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))?;
        Self::new(model.columns, model.coefficients, model.intercept)
            .map_err(|e| load_error(e.to_string()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

impl ClassifierModel for LogisticClassifier {
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>> {
        if x.ncols() != self.coefficients.len() {
            return Err(PredictionFailure::FeatureCount {
                expected: self.coefficients.len(),
                found: x.ncols(),
            });
        }
        let weights = Array1::from_vec(self.coefficients.clone());
        let margins = x.dot(&weights) + self.intercept;
        Ok(margins.iter().map(|&z| sigmoid(z)).collect())
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_probabilities() {
        let model = LogisticClassifier::new(
            vec!["a".to_string(), "b".to_string()],
            vec![2.0, -1.0],
            0.0,
        )
        .unwrap();
        let x = Array2::from_shape_vec((3, 2), vec![0.0, 0.0, 1.0, 0.0, 0.0, 3.0]).unwrap();
        let probs = model.predict_proba(&x).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs[1] > 0.85);
        assert!(probs[2] < 0.1);
    }

    #[test]
    fn test_logistic_rejects_wrong_width() {
        let model = LogisticClassifier::new(vec!["a".to_string()], vec![1.0], 0.0).unwrap();
        let x = Array2::<f32>::zeros((1, 2));
        assert!(matches!(
            model.predict_proba(&x),
            Err(PredictionFailure::FeatureCount { expected: 1, found: 2 })
        ));
        assert!(LogisticClassifier::new(vec![], vec![1.0], 0.0).is_err());
    }
}
