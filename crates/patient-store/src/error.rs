use stroke_risk::ScoringError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Patient not found.")]
    PatientNotFound,

    #[error("Invalid patient ID format.")]
    InvalidPatientId,

    #[error("{0}")]
    Validation(String),

    #[error("Username already exists.")]
    DuplicateUsername,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ScoringError> for StoreError {
    fn from(err: ScoringError) -> Self {
        StoreError::Validation(err.to_string())
    }
}
