use serde::{Deserialize, Serialize};

/// Relative weight of each factor. A weight times 100 is the maximum number
/// of points the factor can add to the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub age: f64,
    pub hypertension: f64,
    pub heart_disease: f64,
    pub glucose: f64,
    pub bmi: f64,
    pub smoking: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            age: 0.25,
            hypertension: 0.20,
            heart_disease: 0.20,
            glucose: 0.15,
            bmi: 0.10,
            smoking: 0.10,
        }
    }
}

/// Clinical cut-offs (age in years, glucose in mg/dL, BMI in kg/m²).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub age_high: f64,
    pub age_medium: f64,
    pub glucose_high: f64,
    pub glucose_medium: f64,
    pub bmi_obese: f64,
    pub bmi_overweight: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            age_high: 65.0,
            age_medium: 45.0,
            glucose_high: 200.0,
            glucose_medium: 140.0,
            bmi_obese: 30.0,
            bmi_overweight: 25.0,
        }
    }
}

/// Static weight and threshold table consumed by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    pub weights: RiskWeights,
    pub thresholds: RiskThresholds,
}

impl RiskConfig {
    pub(crate) fn max_points(weight: f64) -> f64 {
        (weight * 100.0).round()
    }
}
