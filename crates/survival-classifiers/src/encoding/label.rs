//! Per-column label encoder tables.
//!
//! A table lists the classes an external encoder was fitted on; a value's
//! code is its position in that list. Tables are resolved against every enum
//! variant when loaded so that encoding a request can never miss a key.
use std::collections::HashMap;
use std::path::Path;

use crate::error::{PredictionFailure, Result};
use crate::passenger::{Port, Sex};

pub const SEX_COLUMN: &str = "Sex";
pub const EMBARKED_COLUMN: &str = "Embarked";

#[derive(Clone, Debug, PartialEq)]
pub struct LabelEncoders {
    /// Indexed like `Sex::ALL`.
    sex: [f32; 2],
    /// Indexed like `Port::ALL`.
    embarked: [f32; 3],
}

impl Default for LabelEncoders {
    /// Classes as a fitted encoder sorts them: `female, male` and `C, Q, S`.
    fn default() -> Self {
        Self {
            sex: [1.0, 0.0],
            embarked: [0.0, 1.0, 2.0],
        }
    }
}

impl LabelEncoders {
    /// Read a JSON table such as `{"Sex": ["female", "male"], "Embarked": ["C", "Q", "S"]}`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PredictionFailure::Encoder(format!("failed to read {}: {}", path.display(), e))
        })?;
        let table: HashMap<String, Vec<String>> = serde_json::from_str(&content).map_err(|e| {
            PredictionFailure::Encoder(format!("failed to parse {}: {}", path.display(), e))
        })?;
        let encoders = Self::from_classes(&table)?;
        log::debug!("Loaded label encoders from {}", path.display());
        Ok(encoders)
    }

    pub fn from_classes(table: &HashMap<String, Vec<String>>) -> Result<Self> {
        let sex_classes = find_column(table, SEX_COLUMN)?;
        let port_classes = find_column(table, EMBARKED_COLUMN)?;

        let mut sex = [0.0; 2];
        for (slot, value) in sex.iter_mut().zip(Sex::ALL) {
            *slot = class_code(SEX_COLUMN, sex_classes, value.label())?;
        }

        let mut embarked = [0.0; 3];
        for (slot, value) in embarked.iter_mut().zip(Port::ALL) {
            *slot = class_code(EMBARKED_COLUMN, port_classes, value.code())?;
        }

        Ok(Self { sex, embarked })
    }

    pub fn sex_code(&self, sex: Sex) -> f32 {
        match sex {
            Sex::Male => self.sex[0],
            Sex::Female => self.sex[1],
        }
    }

    pub fn embarked_code(&self, port: Port) -> f32 {
        match port {
            Port::Cherbourg => self.embarked[0],
            Port::Queenstown => self.embarked[1],
            Port::Southampton => self.embarked[2],
        }
    }
}

fn find_column<'a>(table: &'a HashMap<String, Vec<String>>, column: &str) -> Result<&'a [String]> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(column))
        .map(|(_, classes)| classes.as_slice())
        .ok_or_else(|| PredictionFailure::Encoder(format!("no encoder for column '{}'", column)))
}

fn class_code(column: &str, classes: &[String], label: &str) -> Result<f32> {
    classes
        .iter()
        .position(|class| class.trim().eq_ignore_ascii_case(label))
        .map(|idx| idx as f32)
        .ok_or_else(|| {
            PredictionFailure::Encoder(format!(
                "encoder for '{}' has no class '{}' (classes: {:?})",
                column, label, classes
            ))
        })
}
