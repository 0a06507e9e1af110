//! One-shot prediction from command line flags.
use anyhow::Result;
use clap::ArgMatches;

use survival_classifiers::passenger::{PassengerRecord, PassengerRequest};
use survival_classifiers::predictor::{Predictor, Verdict};

/// Build a passenger from the `predict` subcommand flags.
pub fn passenger_from_matches(matches: &ArgMatches) -> Result<PassengerRequest> {
    let record = PassengerRecord {
        pclass: matches.get_one::<u8>("pclass").copied(),
        sex: matches.get_one::<String>("sex").cloned(),
        age: matches.get_one::<f32>("age").copied(),
        fare: matches.get_one::<f32>("fare").copied(),
        sibsp: matches.get_one::<u32>("sibsp").copied(),
        parch: matches.get_one::<u32>("parch").copied(),
        embarked: matches.get_one::<String>("embarked").cloned(),
        title: matches.get_one::<String>("title").cloned(),
        name: matches.get_one::<String>("name").cloned(),
    };
    Ok(PassengerRequest::try_from(record)?)
}

pub fn run_predict(predictor: &Predictor, request: &PassengerRequest) -> Result<Verdict> {
    let verdict = predictor.predict(request)?;
    log::debug!("Encoded passenger {:?} -> {}", request, verdict);
    Ok(verdict)
}
