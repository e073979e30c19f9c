//! Import of the public healthcare stroke dataset (CSV).
//!
//! The CSV carries an `id` column that is dropped in favor of generated ids,
//! and marks missing BMI values as `N/A`.

use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

use crate::error::StoreResult;
use crate::models::{NewPatient, SortField};
use crate::patients::PatientRepository;

pub const DEFAULT_DATASET_PATH: &str = "healthcare-dataset-stroke-data.csv";

#[derive(Debug, Deserialize)]
struct CsvRow {
    gender: String,
    age: f64,
    hypertension: i64,
    heart_disease: i64,
    ever_married: String,
    work_type: String,
    #[serde(rename = "Residence_type")]
    residence_type: String,
    avg_glucose_level: f64,
    #[serde(deserialize_with = "bmi_cell")]
    bmi: Option<f64>,
    smoking_status: String,
    stroke: i64,
}

fn bmi_cell<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    stroke_risk::coerce::bmi_from_str(&raw).map_err(serde::de::Error::custom)
}

impl From<CsvRow> for NewPatient {
    fn from(row: CsvRow) -> Self {
        NewPatient {
            gender: row.gender,
            age: row.age,
            hypertension: row.hypertension,
            heart_disease: row.heart_disease,
            ever_married: row.ever_married,
            work_type: row.work_type,
            residence_type: row.residence_type,
            avg_glucose_level: row.avg_glucose_level,
            bmi: row.bmi,
            smoking_status: row.smoking_status,
            stroke: row.stroke,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The collection already had records; nothing was imported.
    Skipped { existing: i64 },
    Imported { inserted: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub deleted: u64,
    pub inserted: u64,
}

/// Snapshot of what is loaded, for the verification report.
#[derive(Debug, Clone)]
pub struct DatasetSummary {
    pub total: i64,
    pub gender: Vec<(String, i64)>,
    pub stroke: Vec<(String, i64)>,
    pub hypertension: Vec<(String, i64)>,
    pub work_type: Vec<(String, i64)>,
    pub smoking_status: Vec<(String, i64)>,
    /// (min, mean, max)
    pub age: Option<(f64, f64, f64)>,
}

impl DatasetSummary {
    /// Share of `count` in the whole collection, as a percentage.
    pub fn percent(&self, count: i64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

pub struct DatasetImporter {
    patients: PatientRepository,
}

impl DatasetImporter {
    pub fn new(patients: PatientRepository) -> Self {
        Self { patients }
    }

    /// Parse CSV records from any reader.
    pub fn parse<R: Read>(reader: R) -> StoreResult<Vec<NewPatient>> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = Vec::new();
        for row in csv_reader.deserialize::<CsvRow>() {
            records.push(row?.into());
        }
        Ok(records)
    }

    pub fn read_file(path: impl AsRef<Path>) -> StoreResult<Vec<NewPatient>> {
        let file = std::fs::File::open(path)?;
        Self::parse(file)
    }

    /// Load the CSV unless patients are already present.
    pub async fn import_if_empty(&self, path: impl AsRef<Path>) -> StoreResult<ImportOutcome> {
        let existing = self.patients.count(&Default::default()).await?;
        if existing > 0 {
            tracing::info!("Dataset already loaded ({} records). Skipping.", existing);
            return Ok(ImportOutcome::Skipped { existing });
        }

        let records = Self::read_file(path)?;
        let inserted = self.patients.insert_many(&records).await?;
        tracing::info!("Loaded {} anonymized patient records", inserted);
        Ok(ImportOutcome::Imported { inserted })
    }

    /// Clear all patients and import the CSV again. The file is parsed
    /// first and the swap is atomic, so a bad file or failed insert keeps
    /// the current data.
    pub async fn force_reload(&self, path: impl AsRef<Path>) -> StoreResult<ReloadOutcome> {
        let records = Self::read_file(path)?;
        let (deleted, inserted) = self.patients.replace_all(&records).await?;
        tracing::info!("Dataset reloaded: {} deleted, {} inserted", deleted, inserted);
        Ok(ReloadOutcome { deleted, inserted })
    }

    pub async fn summary(&self) -> StoreResult<DatasetSummary> {
        Ok(DatasetSummary {
            total: self.patients.count(&Default::default()).await?,
            gender: self.patients.distribution(SortField::Gender).await?,
            stroke: self.patients.distribution(SortField::Stroke).await?,
            hypertension: self.patients.distribution(SortField::Hypertension).await?,
            work_type: self.patients.distribution(SortField::WorkType).await?,
            smoking_status: self.patients.distribution(SortField::SmokingStatus).await?,
            age: self.patients.age_range().await?,
        })
    }
}
