use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Invalid numeric value for field '{field}': {value}")]
    InvalidNumber { field: String, value: String },

    #[error("Field '{0}' must be a string")]
    ExpectedString(String),

    #[error("Patient payload must be a JSON object")]
    NotAnObject,
}
