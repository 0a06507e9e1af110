//! Passenger attributes as the form collects them.
//!
//! Every categorical field is a closed enum so that the encoders can map them
//! with an exhaustive `match`. Numeric fields are range-checked once, when a
//! [`PassengerRequest`] is built, and are read-only afterwards.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PredictionFailure, Result};

pub const AGE_RANGE: (f32, f32) = (0.0, 100.0);
pub const FARE_RANGE: (f32, f32) = (0.0, 600.0);
pub const MAX_RELATIVES: u8 = 10;

/// Ticket class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PassengerClass {
    First,
    Second,
    Third,
}

impl PassengerClass {
    pub const ALL: [PassengerClass; 3] = [
        PassengerClass::First,
        PassengerClass::Second,
        PassengerClass::Third,
    ];

    pub fn number(self) -> u8 {
        match self {
            PassengerClass::First => 1,
            PassengerClass::Second => 2,
            PassengerClass::Third => 3,
        }
    }
}

impl TryFrom<u8> for PassengerClass {
    type Error = PredictionFailure;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(PassengerClass::First),
            2 => Ok(PassengerClass::Second),
            3 => Ok(PassengerClass::Third),
            other => Err(PredictionFailure::invalid(
                "Pclass",
                format!("expected 1, 2 or 3, got {}", other),
            )),
        }
    }
}

impl From<PassengerClass> for u8 {
    fn from(value: PassengerClass) -> Self {
        value.number()
    }
}

impl FromStr for PassengerClass {
    type Err = PredictionFailure;

    fn from_str(s: &str) -> Result<Self> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| PredictionFailure::invalid("Pclass", format!("not a class number: '{}'", s)))?;
        PassengerClass::try_from(n)
    }
}

impl fmt::Display for PassengerClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// Value as it appears in the training data.
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl FromStr for Sex {
    type Err = PredictionFailure;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            _ => Err(PredictionFailure::invalid(
                "Sex",
                format!("expected male or female, got '{}'", s),
            )),
        }
    }
}

impl TryFrom<String> for Sex {
    type Error = PredictionFailure;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Sex> for String {
    fn from(value: Sex) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Port of embarkation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Port {
    Cherbourg,
    Queenstown,
    Southampton,
}

impl Port {
    pub const ALL: [Port; 3] = [Port::Cherbourg, Port::Queenstown, Port::Southampton];

    /// Single-letter code used in the passenger manifest.
    pub fn code(self) -> &'static str {
        match self {
            Port::Cherbourg => "C",
            Port::Queenstown => "Q",
            Port::Southampton => "S",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Port::Cherbourg => "Cherbourg",
            Port::Queenstown => "Queenstown",
            Port::Southampton => "Southampton",
        }
    }

    /// Label shown in the form select, e.g. `Cherbourg (C)`.
    pub fn form_label(self) -> String {
        format!("{} ({})", self.name(), self.code())
    }
}

impl FromStr for Port {
    type Err = PredictionFailure;

    /// Accepts `C`, `Cherbourg` and `Cherbourg (C)`, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let key = match (trimmed.rfind('('), trimmed.ends_with(')')) {
            (Some(open), true) => &trimmed[open + 1..trimmed.len() - 1],
            _ => trimmed,
        };
        match key.trim().to_lowercase().as_str() {
            "c" | "cherbourg" => Ok(Port::Cherbourg),
            "q" | "queenstown" => Ok(Port::Queenstown),
            "s" | "southampton" => Ok(Port::Southampton),
            _ => Err(PredictionFailure::invalid(
                "Embarked",
                format!("unknown port '{}'", s),
            )),
        }
    }
}

impl TryFrom<String> for Port {
    type Error = PredictionFailure;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Port> for String {
    fn from(value: Port) -> Self {
        value.code().to_string()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Honorific, grouped the way the one-hot model was trained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Title {
    Mr,
    Miss,
    Mrs,
    Master,
    Other,
}

impl Title {
    pub const ALL: [Title; 5] = [Title::Mr, Title::Miss, Title::Mrs, Title::Master, Title::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Title::Mr => "Mr",
            Title::Miss => "Miss",
            Title::Mrs => "Mrs",
            Title::Master => "Master",
            Title::Other => "Other",
        }
    }

    /// Group a raw honorific. French forms fold into their English
    /// equivalents; anything unrecognised is `Other`.
    pub fn from_honorific(honorific: &str) -> Title {
        match honorific.trim().trim_end_matches('.').to_lowercase().as_str() {
            "mr" => Title::Mr,
            "mrs" | "mme" => Title::Mrs,
            "miss" | "mlle" | "ms" => Title::Miss,
            "master" => Title::Master,
            _ => Title::Other,
        }
    }

    /// Extract the title from a manifest name such as
    /// `"Braund, Mr. Owen Harris"`. Returns `None` when the name has no
    /// `Surname, Honorific.` prefix.
    pub fn from_name(name: &str) -> Option<Title> {
        let (_, rest) = name.split_once(',')?;
        let (honorific, _) = rest.split_once('.')?;
        let honorific = honorific.trim();
        if honorific.is_empty() {
            return None;
        }
        Some(Title::from_honorific(honorific))
    }
}

impl FromStr for Title {
    type Err = PredictionFailure;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(PredictionFailure::invalid("Title", "empty title"));
        }
        Ok(Title::from_honorific(s))
    }
}

impl TryFrom<String> for Title {
    type Error = PredictionFailure;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Title> for String {
    fn from(value: Title) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated passenger row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PassengerRequest {
    pclass: PassengerClass,
    sex: Sex,
    age: f32,
    fare: f32,
    sibsp: u8,
    parch: u8,
    embarked: Port,
    title: Option<Title>,
}

impl PassengerRequest {
    pub fn new(
        pclass: PassengerClass,
        sex: Sex,
        age: f32,
        fare: f32,
        sibsp: u32,
        parch: u32,
        embarked: Port,
    ) -> Result<Self> {
        Ok(Self {
            pclass,
            sex,
            age: check_range("Age", age, AGE_RANGE)?,
            fare: check_range("Fare", fare, FARE_RANGE)?,
            sibsp: check_count("SibSp", sibsp)?,
            parch: check_count("Parch", parch)?,
            embarked,
            title: None,
        })
    }

    pub fn with_title(mut self, title: Option<Title>) -> Self {
        self.title = title;
        self
    }

    pub fn pclass(&self) -> PassengerClass {
        self.pclass
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn fare(&self) -> f32 {
        self.fare
    }

    pub fn sibsp(&self) -> u8 {
        self.sibsp
    }

    pub fn parch(&self) -> u8 {
        self.parch
    }

    pub fn embarked(&self) -> Port {
        self.embarked
    }

    pub fn title(&self) -> Option<Title> {
        self.title
    }

    /// Siblings/spouses plus parents/children aboard.
    pub fn family_size(&self) -> u8 {
        self.sibsp + self.parch
    }
}

fn check_range(field: &'static str, value: f32, (lo, hi): (f32, f32)) -> Result<f32> {
    if !value.is_finite() || value < lo || value > hi {
        return Err(PredictionFailure::invalid(
            field,
            format!("{} is outside [{}, {}]", value, lo, hi),
        ));
    }
    Ok(value)
}

fn check_count(field: &'static str, value: u32) -> Result<u8> {
    if value > MAX_RELATIVES as u32 {
        return Err(PredictionFailure::invalid(
            field,
            format!("{} is outside [0, {}]", value, MAX_RELATIVES),
        ));
    }
    Ok(value as u8)
}

/// Loosely-typed passenger fields as submitted by a form, a JSON client or a
/// CSV row. Converted into a [`PassengerRequest`] with `try_into`; an absent
/// field is reported as missing rather than filled in.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassengerRecord {
    #[serde(alias = "Pclass")]
    pub pclass: Option<u8>,
    #[serde(alias = "Sex")]
    pub sex: Option<String>,
    #[serde(alias = "Age")]
    pub age: Option<f32>,
    #[serde(alias = "Fare")]
    pub fare: Option<f32>,
    #[serde(alias = "SibSp")]
    pub sibsp: Option<u32>,
    #[serde(alias = "Parch")]
    pub parch: Option<u32>,
    #[serde(alias = "Embarked")]
    pub embarked: Option<String>,
    #[serde(alias = "Title")]
    pub title: Option<String>,
    #[serde(alias = "Name")]
    pub name: Option<String>,
}

impl PassengerRecord {
    /// An explicit title wins; otherwise it is derived from the name.
    fn resolve_title(&self) -> Result<Option<Title>> {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => Ok(Some(t.parse()?)),
            _ => Ok(self.name.as_deref().and_then(Title::from_name)),
        }
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or_else(|| PredictionFailure::invalid(field, "missing value"))
}

impl TryFrom<PassengerRecord> for PassengerRequest {
    type Error = PredictionFailure;

    fn try_from(record: PassengerRecord) -> Result<Self> {
        let title = record.resolve_title()?;
        let request = PassengerRequest::new(
            PassengerClass::try_from(required(record.pclass, "Pclass")?)?,
            required(record.sex, "Sex")?.parse()?,
            required(record.age, "Age")?,
            required(record.fare, "Fare")?,
            required(record.sibsp, "SibSp")?,
            required(record.parch, "Parch")?,
            required(record.embarked, "Embarked")?.parse()?,
        )?;
        Ok(request.with_title(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_accepts_form_labels() {
        assert_eq!("Cherbourg (C)".parse::<Port>().unwrap(), Port::Cherbourg);
        assert_eq!("q".parse::<Port>().unwrap(), Port::Queenstown);
        assert_eq!(" Southampton ".parse::<Port>().unwrap(), Port::Southampton);
        assert!("Belfast".parse::<Port>().is_err());
        for port in Port::ALL {
            assert_eq!(port.form_label().parse::<Port>().unwrap(), port);
        }
    }

    #[test]
    fn test_title_from_name() {
        assert_eq!(Title::from_name("Braund, Mr. Owen Harris"), Some(Title::Mr));
        assert_eq!(
            Title::from_name("Cumings, Mrs. John Bradley (Florence Briggs Thayer)"),
            Some(Title::Mrs)
        );
        assert_eq!(Title::from_name("Aubart, Mme. Leontine Pauline"), Some(Title::Mrs));
        assert_eq!(Title::from_name("Sagesser, Mlle. Emma"), Some(Title::Miss));
        assert_eq!(Title::from_name("Palsson, Master. Gosta Leonard"), Some(Title::Master));
        assert_eq!(Title::from_name("Byles, Rev. Thomas Roussel Davids"), Some(Title::Other));
        assert_eq!(Title::from_name("nobody"), None);
    }

    #[test]
    fn test_request_rejects_out_of_range() {
        let build = |age: f32, fare: f32, sibsp: u32| {
            PassengerRequest::new(
                PassengerClass::Third,
                Sex::Male,
                age,
                fare,
                sibsp,
                0,
                Port::Southampton,
            )
        };
        assert!(build(30.0, 50.0, 0).is_ok());
        assert!(build(100.0, 600.0, 10).is_ok());
        assert!(build(-1.0, 50.0, 0).unwrap_err().is_input_error());
        assert!(build(101.0, 50.0, 0).is_err());
        assert!(build(f32::NAN, 50.0, 0).is_err());
        assert!(build(30.0, 600.5, 0).is_err());
        assert!(build(30.0, 50.0, 11).is_err());
    }

    #[test]
    fn test_record_prefers_explicit_title() {
        let record = PassengerRecord {
            pclass: Some(2),
            sex: Some("female".to_string()),
            age: Some(40.0),
            fare: Some(20.0),
            sibsp: Some(1),
            parch: Some(2),
            embarked: Some("S".to_string()),
            title: Some("Miss".to_string()),
            name: Some("Doe, Mrs. Jane".to_string()),
        };
        let request = PassengerRequest::try_from(record.clone()).unwrap();
        assert_eq!(request.title(), Some(Title::Miss));
        assert_eq!(request.family_size(), 3);

        let without_title = PassengerRecord {
            title: Some(String::new()),
            ..record
        };
        let request = PassengerRequest::try_from(without_title).unwrap();
        assert_eq!(request.title(), Some(Title::Mrs));
    }

    #[test]
    fn test_record_missing_fields_are_not_filled_in() {
        let record: PassengerRecord =
            serde_json::from_str(r#"{"pclass": 1, "sex": "female", "embarked": "C"}"#).unwrap();
        match PassengerRequest::try_from(record) {
            Err(PredictionFailure::InvalidInput { field, reason }) => {
                assert_eq!(field, "Age");
                assert_eq!(reason, "missing value");
            }
            other => panic!("expected missing Age, got {:?}", other),
        }

        let record: PassengerRecord = serde_json::from_str(
            r#"{"Pclass": 3, "Sex": "male", "Age": 22, "Fare": 7.25, "SibSp": 1, "Embarked": "S"}"#,
        )
        .unwrap();
        assert!(matches!(
            PassengerRequest::try_from(record),
            Err(PredictionFailure::InvalidInput { field: "Parch", .. })
        ));
    }
}
