use std::str::FromStr;

use serde::{Deserialize, Serialize};

use survival_classifiers::passenger::{PassengerRecord, PassengerRequest, Port};
use survival_classifiers::PredictionFailure;

/// Raw form fields exactly as the browser posts them. Kept as text so a
/// rejected submission can be rendered back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PassengerForm {
    pub pclass: String,
    pub sex: String,
    pub age: String,
    pub fare: String,
    pub sibsp: String,
    pub parch: String,
    pub embarked: String,
    pub title: String,
    pub name: String,
}

impl Default for PassengerForm {
    fn default() -> Self {
        Self {
            pclass: "1".to_string(),
            sex: "Male".to_string(),
            age: "30".to_string(),
            fare: "50.0".to_string(),
            sibsp: "0".to_string(),
            parch: "0".to_string(),
            embarked: Port::Southampton.form_label(),
            title: String::new(),
            name: String::new(),
        }
    }
}

impl PassengerForm {
    pub fn to_record(&self) -> Result<PassengerRecord, PredictionFailure> {
        Ok(PassengerRecord {
            pclass: Some(parse_number(&self.pclass, "Pclass")?),
            sex: Some(self.sex.clone()),
            age: Some(parse_number(&self.age, "Age")?),
            fare: Some(parse_number(&self.fare, "Fare")?),
            sibsp: Some(parse_number(&self.sibsp, "SibSp")?),
            parch: Some(parse_number(&self.parch, "Parch")?),
            embarked: Some(self.embarked.clone()),
            title: non_empty(&self.title),
            name: non_empty(&self.name),
        })
    }

    pub fn to_request(&self) -> Result<PassengerRequest, PredictionFailure> {
        PassengerRequest::try_from(self.to_record()?)
    }
}

fn parse_number<T: FromStr>(raw: &str, field: &'static str) -> Result<T, PredictionFailure> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PredictionFailure::invalid(field, "missing value"));
    }
    raw.parse()
        .map_err(|_| PredictionFailure::invalid(field, format!("'{}' is not a number", raw)))
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
