//! Passenger manifest CSV/TSV reader and prediction writer.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;

use crate::error::PredictionFailure;
use crate::passenger::{PassengerRecord, PassengerRequest};
use crate::predictor::Verdict;

const REQUIRED_COLUMNS: [&str; 7] = ["Pclass", "Sex", "Age", "Fare", "SibSp", "Parch", "Embarked"];

/// One manifest row. Rows that fail validation keep their error so the batch
/// can report them without stopping.
#[derive(Debug)]
pub struct PassengerRow {
    pub id: String,
    pub request: std::result::Result<PassengerRequest, PredictionFailure>,
}

/// Prediction (or failure) for one manifest row.
#[derive(Debug)]
pub struct BatchOutcome {
    pub id: String,
    pub verdict: std::result::Result<Verdict, PredictionFailure>,
}

struct ColumnIndex {
    required: [usize; 7],
    passenger_id: Option<usize>,
    title: Option<usize>,
    name: Option<usize>,
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Read a passenger manifest. The delimiter follows the extension (`.tsv` is
/// tab-separated, anything else comma-separated). Column names match
/// case-insensitively; `PassengerId`, `Title` and `Name` are optional.
pub fn read_passengers_csv<P: AsRef<Path>>(path: P) -> Result<Vec<PassengerRow>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_for(path))
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open passenger file: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read passenger header row")?
        .clone();
    let columns = resolve_columns(&headers)?;

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        let id = columns
            .passenger_id
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("row_{}", row_idx + 1));
        let request = parse_record(&record, &columns);
        if let Err(e) = &request {
            log::warn!("Passenger {}: {}", id, e);
        }
        rows.push(PassengerRow { id, request });
    }

    log::debug!("Read {} passengers from {}", rows.len(), path.display());
    Ok(rows)
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnIndex> {
    let mut required = [0usize; 7];
    for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = find_column(headers, name).ok_or_else(|| anyhow!("Missing column '{}'", name))?;
    }
    Ok(ColumnIndex {
        required,
        passenger_id: find_column(headers, "PassengerId"),
        title: find_column(headers, "Title"),
        name: find_column(headers, "Name"),
    })
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn parse_record(
    record: &StringRecord,
    columns: &ColumnIndex,
) -> std::result::Result<PassengerRequest, PredictionFailure> {
    let [pclass, sex, age, fare, sibsp, parch, embarked] = columns.required;
    let optional = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let passenger = PassengerRecord {
        pclass: Some(parse_field(record, pclass, "Pclass")?),
        sex: Some(parse_field(record, sex, "Sex")?),
        age: Some(parse_field(record, age, "Age")?),
        fare: Some(parse_field(record, fare, "Fare")?),
        sibsp: Some(parse_field(record, sibsp, "SibSp")?),
        parch: Some(parse_field(record, parch, "Parch")?),
        embarked: Some(parse_field(record, embarked, "Embarked")?),
        title: optional(columns.title),
        name: optional(columns.name),
    };
    PassengerRequest::try_from(passenger)
}

fn parse_field<T: FromStr>(
    record: &StringRecord,
    idx: usize,
    field: &'static str,
) -> std::result::Result<T, PredictionFailure> {
    let raw = record.get(idx).unwrap_or("").trim();
    if raw.is_empty() {
        return Err(PredictionFailure::invalid(field, "missing value"));
    }
    raw.parse::<T>()
        .map_err(|_| PredictionFailure::invalid(field, format!("cannot parse '{}'", raw)))
}

/// Write `PassengerId, Survived, Probability, Error` rows to `output`, or to
/// stdout when no path is given.
pub fn write_predictions(outcomes: &[BatchOutcome], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let writer = csv::WriterBuilder::new()
                .delimiter(delimiter_for(path))
                .from_writer(BufWriter::new(file));
            write_predictions_to(writer, outcomes)
        }
        None => {
            let stdout = std::io::stdout();
            let writer = csv::WriterBuilder::new().from_writer(stdout.lock());
            write_predictions_to(writer, outcomes)
        }
    }
}

pub fn write_predictions_to<W: Write>(mut writer: csv::Writer<W>, outcomes: &[BatchOutcome]) -> Result<()> {
    writer.write_record(["PassengerId", "Survived", "Probability", "Error"])?;
    for outcome in outcomes {
        match &outcome.verdict {
            Ok(verdict) => {
                let probability = format!("{:.4}", verdict.probability);
                let survived = if verdict.survived { "1" } else { "0" };
                writer.write_record([outcome.id.as_str(), survived, probability.as_str(), ""])?;
            }
            Err(e) => {
                let message = e.to_string();
                writer.write_record([outcome.id.as_str(), "", "", message.as_str()])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
