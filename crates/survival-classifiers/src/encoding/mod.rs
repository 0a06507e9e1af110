//! Passenger → feature row encoding.
//!
//! Two column layouts exist. `one_hot` is the canonical one; `label_encoded`
//! is kept for models trained against per-column label encoders. The layout is
//! always chosen explicitly and checked against the model's declared columns,
//! never guessed.
pub mod encoder;
pub mod label;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PredictionFailure, Result};

pub use encoder::FeatureEncoder;
pub use label::LabelEncoders;

pub const ONE_HOT_COLUMNS: [&str; 13] = [
    "Pclass",
    "Sex",
    "Age",
    "Fare",
    "FamilySize",
    "Embarked_1",
    "Embarked_2",
    "Embarked_3",
    "Title_1",
    "Title_2",
    "Title_3",
    "Title_4",
    "Title_5",
];

pub const LABEL_ENCODED_COLUMNS: [&str; 7] =
    ["Pclass", "Sex", "Age", "Fare", "SibSp", "Parch", "Embarked"];

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSchema {
    #[default]
    OneHot,
    LabelEncoded,
}

impl FeatureSchema {
    pub fn name(self) -> &'static str {
        match self {
            FeatureSchema::OneHot => "one_hot",
            FeatureSchema::LabelEncoded => "label_encoded",
        }
    }

    /// Column names in the order the encoder writes them.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            FeatureSchema::OneHot => &ONE_HOT_COLUMNS,
            FeatureSchema::LabelEncoded => &LABEL_ENCODED_COLUMNS,
        }
    }

    pub fn width(self) -> usize {
        self.columns().len()
    }

    /// Verify that a model's training columns are exactly this schema's,
    /// including order.
    pub fn check_columns<S: AsRef<str>>(self, found: &[S]) -> Result<()> {
        let expected = self.columns();
        let matches = expected.len() == found.len()
            && expected
                .iter()
                .zip(found)
                .all(|(e, f)| *e == f.as_ref());
        if matches {
            return Ok(());
        }
        Err(PredictionFailure::SchemaMismatch {
            expected: expected.iter().map(|c| c.to_string()).collect(),
            found: found.iter().map(|c| c.as_ref().to_string()).collect(),
        })
    }
}

impl FromStr for FeatureSchema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "one_hot" | "onehot" => Ok(FeatureSchema::OneHot),
            "label_encoded" | "label" => Ok(FeatureSchema::LabelEncoded),
            _ => Err(format!(
                "Unknown feature schema: {}. Expected one_hot or label_encoded",
                s
            )),
        }
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_columns_is_order_sensitive() {
        let schema = FeatureSchema::LabelEncoded;
        assert!(schema.check_columns(&LABEL_ENCODED_COLUMNS).is_ok());

        let mut swapped: Vec<&str> = LABEL_ENCODED_COLUMNS.to_vec();
        swapped.swap(0, 1);
        match schema.check_columns(&swapped) {
            Err(PredictionFailure::SchemaMismatch { expected, found }) => {
                assert_eq!(expected[0], "Pclass");
                assert_eq!(found[0], "Sex");
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }

        assert!(FeatureSchema::OneHot
            .check_columns(&LABEL_ENCODED_COLUMNS)
            .is_err());
    }

    #[test]
    fn test_schema_from_str() {
        assert_eq!("one-hot".parse::<FeatureSchema>().unwrap(), FeatureSchema::OneHot);
        assert_eq!(
            "LABEL_ENCODED".parse::<FeatureSchema>().unwrap(),
            FeatureSchema::LabelEncoded
        );
        assert!("dummies".parse::<FeatureSchema>().is_err());
    }
}
