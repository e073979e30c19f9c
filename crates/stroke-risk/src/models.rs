use serde::{Deserialize, Serialize};

use crate::coerce;
use crate::error::ScoringError;

/// Attributes the scorer reads from a patient record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatientAttributes {
    pub age: f64,
    pub hypertension: i64,
    pub heart_disease: i64,
    pub avg_glucose_level: f64,
    /// `None` when the dataset had no measurement ("N/A").
    pub bmi: Option<f64>,
    pub smoking_status: String,
}

impl PatientAttributes {
    /// Build attributes from a loosely typed JSON object.
    ///
    /// Numbers may arrive as JSON numbers or numeric strings. Missing age,
    /// glucose and condition flags default to 0; a missing or unreadable BMI
    /// is treated as absent.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ScoringError> {
        let map = value.as_object().ok_or(ScoringError::NotAnObject)?;

        Ok(Self {
            age: coerce::number(map, "age")?.unwrap_or(0.0),
            hypertension: coerce::flag(map, "hypertension")?.unwrap_or(0),
            heart_disease: coerce::flag(map, "heart_disease")?.unwrap_or(0),
            avg_glucose_level: coerce::number(map, "avg_glucose_level")?.unwrap_or(0.0),
            bmi: coerce::bmi(map, "bmi")?,
            smoking_status: coerce::text(map, "smoking_status")?.unwrap_or_default(),
        })
    }

    /// BMI usable for scoring. NaN and zero count as missing.
    pub fn valid_bmi(&self) -> Option<f64> {
        self.bmi.filter(|b| !b.is_nan() && *b != 0.0)
    }

    pub fn smoking(&self) -> SmokingStatus {
        SmokingStatus::parse(&self.smoking_status)
    }
}

/// Smoking categories that carry points. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmokingStatus {
    Smokes,
    FormerlySmoked,
    Other,
}

impl SmokingStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "smokes" => SmokingStatus::Smokes,
            "formerly smoked" => SmokingStatus::FormerlySmoked,
            _ => SmokingStatus::Other,
        }
    }
}

/// Coarse risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "VERY LOW")]
    VeryLow,
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MODERATE")]
    Moderate,
    #[serde(rename = "HIGH")]
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 60.0 => RiskLevel::High,
            s if s >= 40.0 => RiskLevel::Moderate,
            s if s >= 20.0 => RiskLevel::Low,
            _ => RiskLevel::VeryLow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "VERY LOW",
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::High => {
                "Immediate medical consultation recommended. Multiple high-risk factors detected."
            }
            RiskLevel::Moderate => {
                "Schedule a check-up with your doctor. Consider lifestyle modifications."
            }
            RiskLevel::Low => "Maintain healthy lifestyle. Regular check-ups recommended.",
            RiskLevel::VeryLow => "Continue healthy habits. Annual check-ups sufficient.",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-factor breakdown shown next to the score.
///
/// `glucose_risk` and `bmi_risk` are proportional formulas and do not
/// always agree with the stepped points added to `risk_score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub age_risk: f64,
    pub hypertension_risk: u32,
    pub heart_disease_risk: u32,
    pub glucose_risk: f64,
    pub bmi_risk: f64,
    pub smoking_risk: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub recommendation: String,
    pub analysis: RiskAnalysis,
}

pub const NO_RISK_FACTORS: &str = "No significant risk factors identified";
