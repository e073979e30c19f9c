//! Population statistics used to put an individual score in context.

use serde::{Deserialize, Serialize};

use crate::models::PatientAttributes;

/// A stored record with its stroke outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeRecord {
    pub attributes: PatientAttributes,
    pub stroke: i64,
}

/// Raw aggregates over the stroke-positive subgroup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubgroupTotals {
    pub avg_age: Option<f64>,
    pub avg_glucose: Option<f64>,
    /// Mean over records with a usable BMI (see
    /// [`PatientAttributes::valid_bmi`]); `None` when none have one.
    pub avg_bmi: Option<f64>,
    pub hypertension_count: i64,
    pub heart_disease_count: i64,
}

/// Counts plus subgroup totals, as produced by a store-side aggregate or by
/// folding records in memory. `subgroup` is `None` when no record has a
/// stroke.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrokeAggregate {
    pub total: i64,
    pub stroke_cases: i64,
    pub subgroup: Option<SubgroupTotals>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeProfile {
    pub stroke_patient_avg_age: Option<f64>,
    pub stroke_patient_avg_glucose: Option<f64>,
    pub stroke_patient_avg_bmi: Option<f64>,
    pub stroke_with_hypertension: i64,
    pub stroke_with_heart_disease: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub total_patients: i64,
    pub stroke_cases: i64,
    pub stroke_rate: f64,
    /// Omitted entirely when there are no stroke cases.
    #[serde(flatten)]
    pub stroke_profile: Option<StrokeProfile>,
}

impl PopulationStats {
    pub fn from_aggregate(aggregate: &StrokeAggregate) -> Self {
        let stroke_rate = if aggregate.total > 0 {
            round2(aggregate.stroke_cases as f64 / aggregate.total as f64 * 100.0)
        } else {
            0.0
        };

        let stroke_profile = aggregate.subgroup.map(|s| StrokeProfile {
            stroke_patient_avg_age: s.avg_age.filter(|v| v.is_finite()).map(round1),
            stroke_patient_avg_glucose: s.avg_glucose.filter(|v| v.is_finite()).map(round1),
            stroke_patient_avg_bmi: s.avg_bmi.filter(|v| v.is_finite()).map(round1),
            stroke_with_hypertension: s.hypertension_count,
            stroke_with_heart_disease: s.heart_disease_count,
        });

        Self {
            total_patients: aggregate.total,
            stroke_cases: aggregate.stroke_cases,
            stroke_rate,
            stroke_profile,
        }
    }
}

impl StrokeAggregate {
    /// Fold records into an aggregate in a single pass.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a StrokeRecord>,
    {
        let mut total = 0i64;
        let mut cases = 0i64;
        let mut age_sum = 0.0;
        let mut glucose_sum = 0.0;
        let mut bmi_sum = 0.0;
        let mut bmi_count = 0i64;
        let mut hypertension = 0i64;
        let mut heart_disease = 0i64;

        for record in records {
            total += 1;
            if record.stroke != 1 {
                continue;
            }
            let a = &record.attributes;
            cases += 1;
            age_sum += a.age;
            glucose_sum += a.avg_glucose_level;
            if let Some(bmi) = a.valid_bmi() {
                bmi_sum += bmi;
                bmi_count += 1;
            }
            hypertension += a.hypertension;
            heart_disease += a.heart_disease;
        }

        let subgroup = (cases > 0).then(|| SubgroupTotals {
            avg_age: Some(age_sum / cases as f64),
            avg_glucose: Some(glucose_sum / cases as f64),
            avg_bmi: (bmi_count > 0).then(|| bmi_sum / bmi_count as f64),
            hypertension_count: hypertension,
            heart_disease_count: heart_disease,
        });

        Self {
            total,
            stroke_cases: cases,
            subgroup,
        }
    }
}

/// Summarize an in-memory record set.
pub fn summarize<'a, I>(records: I) -> PopulationStats
where
    I: IntoIterator<Item = &'a StrokeRecord>,
{
    PopulationStats::from_aggregate(&StrokeAggregate::from_records(records))
}

fn round1(value: f64) -> f64 {
    crate::scorer::round1(value)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
