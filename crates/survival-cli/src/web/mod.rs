//! Single-page passenger form served over HTTP.
pub mod form;
pub mod pages;
pub mod server;

pub use server::{build_router, serve, AppState};
