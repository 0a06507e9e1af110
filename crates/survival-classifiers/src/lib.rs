//! survival-classifiers: feature encoding and inference for passenger survival
//! prediction.
//!
//! This crate turns a validated passenger record into the fixed-order feature
//! row a pre-trained classifier expects, loads that classifier from a static
//! artifact (gbdt model, XGBoost dump, or a JSON logistic model), and maps its
//! output to a binary verdict. Training happens elsewhere; nothing here fits
//! a model.
pub mod config;
pub mod encoding;
pub mod error;
pub mod io;
pub mod models;
pub mod passenger;
pub mod predictor;

pub use error::{PredictionFailure, Result};
