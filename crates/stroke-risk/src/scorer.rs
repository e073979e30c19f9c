use crate::config::RiskConfig;
use crate::models::*;

/// Points for crossing the middle-age threshold.
const MIDDLE_AGE_POINTS: f64 = 15.0;
/// Ceiling of the smooth age contribution below the middle-age threshold.
const YOUNG_AGE_SCALE: f64 = 10.0;
const ELEVATED_GLUCOSE_POINTS: f64 = 10.0;
const SLIGHT_GLUCOSE_THRESHOLD: f64 = 100.0;
const SLIGHT_GLUCOSE_POINTS: f64 = 5.0;
const OVERWEIGHT_POINTS: f64 = 5.0;
const FORMER_SMOKER_POINTS: f64 = 5.0;
const SCORE_CEILING: f64 = 100.0;

/// Rule-based stroke risk scorer.
///
/// Holds only an immutable [`RiskConfig`], so a single instance can be built
/// at startup and shared across requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer {
    config: RiskConfig,
}

impl RiskScorer {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Score one patient. Factors are evaluated in a fixed order (age,
    /// hypertension, heart disease, glucose, BMI, smoking) and the messages
    /// keep that order.
    pub fn score(&self, patient: &PatientAttributes) -> RiskAssessment {
        let t = &self.config.thresholds;
        let w = &self.config.weights;
        let mut score = 0.0;
        let mut risk_factors = Vec::new();

        let age = patient.age;
        let age_score = if age >= t.age_high {
            risk_factors.push(format!(
                "High age ({} years) - Major risk factor",
                format_years(age)
            ));
            RiskConfig::max_points(w.age)
        } else if age >= t.age_medium {
            risk_factors.push(format!(
                "Middle age ({} years) - Moderate risk factor",
                format_years(age)
            ));
            MIDDLE_AGE_POINTS
        } else {
            (age / t.age_medium) * YOUNG_AGE_SCALE
        };
        score += age_score;

        let hypertension_points = RiskConfig::max_points(w.hypertension);
        if patient.hypertension == 1 {
            score += hypertension_points;
            risk_factors.push("Hypertension - Major risk factor".to_string());
        }

        let heart_disease_points = RiskConfig::max_points(w.heart_disease);
        if patient.heart_disease == 1 {
            score += heart_disease_points;
            risk_factors.push("Heart disease - Major risk factor".to_string());
        }

        let glucose = patient.avg_glucose_level;
        let glucose_cap = RiskConfig::max_points(w.glucose);
        if glucose >= t.glucose_high {
            score += glucose_cap;
            risk_factors.push(format!(
                "Very high glucose level ({:.1} mg/dL) - High risk",
                glucose
            ));
        } else if glucose >= t.glucose_medium {
            score += ELEVATED_GLUCOSE_POINTS;
            risk_factors.push(format!(
                "Elevated glucose level ({:.1} mg/dL) - Moderate risk",
                glucose
            ));
        } else if glucose >= SLIGHT_GLUCOSE_THRESHOLD {
            score += SLIGHT_GLUCOSE_POINTS;
            risk_factors.push(format!(
                "Slightly elevated glucose ({:.1} mg/dL) - Low risk",
                glucose
            ));
        }

        let bmi = patient.valid_bmi();
        let bmi_cap = RiskConfig::max_points(w.bmi);
        if let Some(bmi) = bmi {
            if bmi >= t.bmi_obese {
                score += bmi_cap;
                risk_factors.push(format!("Obese (BMI: {:.1}) - Increased risk", bmi));
            } else if bmi >= t.bmi_overweight {
                score += OVERWEIGHT_POINTS;
                risk_factors.push(format!("Overweight (BMI: {:.1}) - Slight risk", bmi));
            }
        }

        let smoking_points = match patient.smoking() {
            SmokingStatus::Smokes => {
                risk_factors.push("Current smoker - Increased risk".to_string());
                RiskConfig::max_points(w.smoking)
            }
            SmokingStatus::FormerlySmoked => {
                risk_factors.push("Former smoker - Slight increased risk".to_string());
                FORMER_SMOKER_POINTS
            }
            SmokingStatus::Other => 0.0,
        };
        score += smoking_points;

        // Level uses the uncapped sum; the reported score is capped.
        let risk_level = RiskLevel::from_score(score);

        if risk_factors.is_empty() {
            risk_factors.push(NO_RISK_FACTORS.to_string());
        }

        let analysis = RiskAnalysis {
            age_risk: round1(age_score),
            hypertension_risk: if patient.hypertension != 0 {
                hypertension_points as u32
            } else {
                0
            },
            heart_disease_risk: if patient.heart_disease != 0 {
                heart_disease_points as u32
            } else {
                0
            },
            glucose_risk: round1(glucose_cap.min(glucose / t.glucose_high * glucose_cap)),
            bmi_risk: bmi
                .map(|b| round1(bmi_cap.min(b / t.bmi_obese * bmi_cap)))
                .unwrap_or(0.0),
            smoking_risk: smoking_points as u32,
        };

        RiskAssessment {
            risk_score: round1(score.min(SCORE_CEILING)),
            risk_level,
            risk_factors,
            recommendation: risk_level.recommendation().to_string(),
            analysis,
        }
    }
}

/// Score a patient against an explicit configuration.
pub fn calculate_risk_score(patient: &PatientAttributes, config: &RiskConfig) -> RiskAssessment {
    RiskScorer::new(*config).score(patient)
}

/// Round half away from zero to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Render an age the way the dataset stores it: whole years keep a trailing
/// `.0`, fractional ages (infants) print their shortest form.
fn format_years(age: f64) -> String {
    if age.is_finite() && age.fract() == 0.0 {
        format!("{:.1}", age)
    } else {
        age.to_string()
    }
}
