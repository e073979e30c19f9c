use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stroke_risk::{coerce, PatientAttributes, StrokeRecord};

use crate::error::{StoreError, StoreResult};

/// Fields a new patient record must carry, in payload spelling.
pub const REQUIRED_FIELDS: &[&str] = &[
    "gender",
    "age",
    "hypertension",
    "heart_disease",
    "ever_married",
    "work_type",
    "Residence_type",
    "avg_glucose_level",
    "bmi",
    "smoking_status",
    "stroke",
];

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// A stored, anonymized patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Patient {
    pub id: String,
    pub gender: String,
    pub age: f64,
    pub hypertension: i64,
    pub heart_disease: i64,
    pub ever_married: String,
    pub work_type: String,
    #[serde(rename = "Residence_type")]
    pub residence_type: String,
    pub avg_glucose_level: f64,
    pub bmi: Option<f64>,
    pub smoking_status: String,
    pub stroke: i64,
}

impl Patient {
    pub fn attributes(&self) -> PatientAttributes {
        PatientAttributes {
            age: self.age,
            hypertension: self.hypertension,
            heart_disease: self.heart_disease,
            avg_glucose_level: self.avg_glucose_level,
            bmi: self.bmi,
            smoking_status: self.smoking_status.clone(),
        }
    }

    pub fn stroke_record(&self) -> StrokeRecord {
        StrokeRecord {
            attributes: self.attributes(),
            stroke: self.stroke,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPatient {
    pub gender: String,
    pub age: f64,
    pub hypertension: i64,
    pub heart_disease: i64,
    pub ever_married: String,
    pub work_type: String,
    #[serde(rename = "Residence_type")]
    pub residence_type: String,
    pub avg_glucose_level: f64,
    pub bmi: Option<f64>,
    pub smoking_status: String,
    pub stroke: i64,
}

fn missing(field: &str) -> StoreError {
    StoreError::Validation(format!("Missing required field: {}", field))
}

fn required_text(map: &Map<String, Value>, field: &str) -> StoreResult<String> {
    coerce::text(map, field)?
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing(field))
}

fn required_number(map: &Map<String, Value>, field: &str) -> StoreResult<f64> {
    coerce::number(map, field)?.ok_or_else(|| missing(field))
}

fn required_flag(map: &Map<String, Value>, field: &str) -> StoreResult<i64> {
    coerce::flag(map, field)?.ok_or_else(|| missing(field))
}

impl NewPatient {
    /// Validate a sanitized request payload. Every field in
    /// [`REQUIRED_FIELDS`] must be present; `bmi` may be null or "N/A".
    pub fn from_payload(map: &Map<String, Value>) -> StoreResult<Self> {
        if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !map.contains_key(**f)) {
            return Err(missing(field));
        }

        Ok(Self {
            gender: required_text(map, "gender")?,
            age: required_number(map, "age")?,
            hypertension: required_flag(map, "hypertension")?,
            heart_disease: required_flag(map, "heart_disease")?,
            ever_married: required_text(map, "ever_married")?,
            work_type: required_text(map, "work_type")?,
            residence_type: required_text(map, "Residence_type")?,
            avg_glucose_level: required_number(map, "avg_glucose_level")?,
            bmi: coerce::bmi(map, "bmi")?,
            smoking_status: required_text(map, "smoking_status")?,
            stroke: required_flag(map, "stroke")?,
        })
    }
}

/// Partial update. `bmi: Some(None)` clears the measurement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatientUpdate {
    pub gender: Option<String>,
    pub age: Option<f64>,
    pub hypertension: Option<i64>,
    pub heart_disease: Option<i64>,
    pub ever_married: Option<String>,
    pub work_type: Option<String>,
    pub residence_type: Option<String>,
    pub avg_glucose_level: Option<f64>,
    pub bmi: Option<Option<f64>>,
    pub smoking_status: Option<String>,
    pub stroke: Option<i64>,
}

impl PatientUpdate {
    pub fn from_payload(map: &Map<String, Value>) -> StoreResult<Self> {
        let mut update = Self::default();

        for key in map.keys() {
            match key.as_str() {
                // Clients echo the record id back on edit.
                "id" | "_id" => {}
                "gender" => update.gender = Some(required_text(map, key)?),
                "age" => update.age = Some(required_number(map, key)?),
                "hypertension" => update.hypertension = Some(required_flag(map, key)?),
                "heart_disease" => update.heart_disease = Some(required_flag(map, key)?),
                "ever_married" => update.ever_married = Some(required_text(map, key)?),
                "work_type" => update.work_type = Some(required_text(map, key)?),
                "Residence_type" | "residence_type" => {
                    update.residence_type = Some(required_text(map, key)?)
                }
                "avg_glucose_level" => {
                    update.avg_glucose_level = Some(required_number(map, key)?)
                }
                "bmi" => update.bmi = Some(coerce::bmi(map, key)?),
                "smoking_status" => update.smoking_status = Some(required_text(map, key)?),
                "stroke" => update.stroke = Some(required_flag(map, key)?),
                other => {
                    return Err(StoreError::Validation(format!("Unknown field: {}", other)))
                }
            }
        }

        if update == Self::default() {
            return Err(StoreError::Validation(
                "No updatable fields provided".to_string(),
            ));
        }

        Ok(update)
    }
}

/// Equality filters for listing and counting.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PatientFilter {
    pub gender: Option<String>,
    pub stroke: Option<i64>,
    pub hypertension: Option<i64>,
    pub heart_disease: Option<i64>,
    pub smoking_status: Option<String>,
    pub work_type: Option<String>,
}

/// Columns patients may be sorted or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Age,
    Gender,
    Hypertension,
    HeartDisease,
    EverMarried,
    WorkType,
    ResidenceType,
    AvgGlucoseLevel,
    Bmi,
    SmokingStatus,
    Stroke,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "age" => Some(SortField::Age),
            "gender" => Some(SortField::Gender),
            "hypertension" => Some(SortField::Hypertension),
            "heart_disease" => Some(SortField::HeartDisease),
            "ever_married" => Some(SortField::EverMarried),
            "work_type" => Some(SortField::WorkType),
            "Residence_type" | "residence_type" => Some(SortField::ResidenceType),
            "avg_glucose_level" => Some(SortField::AvgGlucoseLevel),
            "bmi" => Some(SortField::Bmi),
            "smoking_status" => Some(SortField::SmokingStatus),
            "stroke" => Some(SortField::Stroke),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::Age => "age",
            SortField::Gender => "gender",
            SortField::Hypertension => "hypertension",
            SortField::HeartDisease => "heart_disease",
            SortField::EverMarried => "ever_married",
            SortField::WorkType => "work_type",
            SortField::ResidenceType => "residence_type",
            SortField::AvgGlucoseLevel => "avg_glucose_level",
            SortField::Bmi => "bmi",
            SortField::SmokingStatus => "smoking_status",
            SortField::Stroke => "stroke",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// `1` is ascending, `-1` descending.
    pub fn from_sign(sign: i64) -> Option<Self> {
        match sign {
            1 => Some(SortOrder::Ascending),
            -1 => Some(SortOrder::Descending),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl PageRequest {
    /// Clamp page to at least 1 and page size to `1..=MAX_PER_PAGE`.
    pub fn new(page: u32, per_page: u32, sort_field: SortField, sort_order: SortOrder) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            sort_field,
            sort_order,
        }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientPage {
    pub patients: Vec<Patient>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: i64,
}

impl PatientPage {
    pub fn new(patients: Vec<Patient>, total: i64, request: &PageRequest) -> Self {
        let per_page = i64::from(request.per_page);
        Self {
            patients,
            total,
            page: request.page,
            per_page: request.per_page,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

/// Authenticated account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
}
