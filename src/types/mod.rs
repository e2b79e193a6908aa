use thiserror::Error;

mod domain_types;
mod params;

pub use domain_types::*;
pub use params::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Unsupported scheme: {scheme} (expected http or https)")]
    UnsupportedScheme { scheme: String },

    #[error("Value out of bounds for {name}: {value}, expected {min}..={max}")]
    OutOfBounds {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid filter argument: {input} - {reason}")]
    InvalidFilter { input: String, reason: String },

    #[error("Invalid reference argument: {input} - {reason}")]
    InvalidReference { input: String, reason: String },

    #[error("Invalid API token: {reason}")]
    InvalidToken { reason: String },
}
