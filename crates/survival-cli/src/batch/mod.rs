//! Score a whole passenger manifest in one pass.
use std::path::Path;

use anyhow::Result;

use survival_classifiers::io::{read_passengers_csv, write_predictions, BatchOutcome, PassengerRow};
use survival_classifiers::passenger::PassengerRequest;
use survival_classifiers::predictor::Predictor;
use survival_classifiers::PredictionFailure;

/// Counts reported after a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub survived: usize,
    pub failed: usize,
}

/// Predict every valid row with a single inference call. Invalid rows keep
/// their validation error; if inference itself fails, every valid row reports
/// that failure.
pub fn score_rows(rows: Vec<PassengerRow>, predictor: &Predictor) -> Vec<BatchOutcome> {
    let valid: Vec<PassengerRequest> = rows
        .iter()
        .filter_map(|row| row.request.as_ref().ok().cloned())
        .collect();
    let mut verdicts = match predictor.predict_batch(&valid) {
        Ok(verdicts) => verdicts.into_iter().map(Ok).collect::<Vec<_>>(),
        Err(e) => {
            log::error!("Batch inference failed: {}", e);
            vec![Err(e); valid.len()]
        }
    }
    .into_iter();

    rows.into_iter()
        .map(|row| {
            let verdict = match row.request {
                Ok(_) => verdicts.next().unwrap_or_else(|| {
                    Err(PredictionFailure::Inference("missing verdict for row".to_string()))
                }),
                Err(e) => Err(e),
            };
            BatchOutcome { id: row.id, verdict }
        })
        .collect()
}

pub fn summarize(outcomes: &[BatchOutcome]) -> BatchSummary {
    outcomes.iter().fold(
        BatchSummary {
            total: outcomes.len(),
            ..BatchSummary::default()
        },
        |mut summary, outcome| {
            match &outcome.verdict {
                Ok(verdict) if verdict.survived => summary.survived += 1,
                Ok(_) => {}
                Err(_) => summary.failed += 1,
            }
            summary
        },
    )
}

pub fn run_batch(input: &Path, output: Option<&Path>, predictor: &Predictor) -> Result<BatchSummary> {
    let start_time = std::time::Instant::now();
    let rows = read_passengers_csv(input)?;
    log::info!("Loaded {} passengers from {}", rows.len(), input.display());

    let outcomes = score_rows(rows, predictor);
    write_predictions(&outcomes, output)?;

    let summary = summarize(&outcomes);
    log::info!(
        "Scored {} passengers in {:?}: {} survived, {} failed",
        summary.total,
        start_time.elapsed(),
        summary.survived,
        summary.failed
    );
    Ok(summary)
}
