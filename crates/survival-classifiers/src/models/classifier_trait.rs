use ndarray::Array2;

use crate::error::Result;

/// A pre-trained binary classifier loaded from an external artifact.
///
/// Inference is read-only: a loaded model is shared between request handlers
/// without locking, hence the `Send + Sync` bound.
pub trait ClassifierModel: Send + Sync {
    /// Probability of the positive class (survived) for each row of `x`.
    fn predict_proba(&self, x: &Array2<f32>) -> Result<Vec<f32>>;

    /// Number of input features, when the artifact records it.
    fn n_features(&self) -> Option<usize> {
        None
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
