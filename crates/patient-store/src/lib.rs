pub mod dataset;
pub mod db;
pub mod error;
pub mod models;
pub mod patients;
pub mod sessions;
pub mod users;

pub use dataset::{DatasetImporter, DatasetSummary, ImportOutcome, ReloadOutcome};
pub use db::PatientDb;
pub use error::{StoreError, StoreResult};
pub use models::*;
pub use patients::PatientRepository;
pub use sessions::SessionStore;
pub use users::UserRepository;
