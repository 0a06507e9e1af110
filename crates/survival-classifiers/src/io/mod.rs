pub mod passenger_csv;

pub use passenger_csv::{read_passengers_csv, write_predictions, BatchOutcome, PassengerRow};
