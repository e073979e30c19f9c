#[cfg(test)]
mod scorer_tests {
    use crate::*;

    fn patient(
        age: f64,
        hypertension: i64,
        heart_disease: i64,
        glucose: f64,
        bmi: Option<f64>,
        smoking: &str,
    ) -> PatientAttributes {
        PatientAttributes {
            age,
            hypertension,
            heart_disease,
            avg_glucose_level: glucose,
            bmi,
            smoking_status: smoking.to_string(),
        }
    }

    fn score(p: &PatientAttributes) -> RiskAssessment {
        RiskScorer::default().score(p)
    }

    #[test]
    fn young_age_is_smooth_and_silent() {
        for age in [0.0, 12.0, 30.0, 44.9] {
            let result = score(&patient(age, 0, 0, 80.0, None, "never smoked"));
            let expected = ((age / 45.0) * 10.0 * 10.0_f64).round() / 10.0;
            assert_eq!(result.analysis.age_risk, expected, "age {age}");
            assert!(result.risk_factors.iter().all(|f| !f.contains("age (")));
        }
    }

    #[test]
    fn age_45_is_middle_age() {
        let result = score(&patient(45.0, 0, 0, 80.0, None, "never smoked"));
        assert_eq!(result.analysis.age_risk, 15.0);
        assert_eq!(
            result.risk_factors,
            vec!["Middle age (45.0 years) - Moderate risk factor".to_string()]
        );
    }

    #[test]
    fn age_65_is_high_age() {
        let result = score(&patient(65.0, 0, 0, 80.0, None, "never smoked"));
        assert_eq!(result.analysis.age_risk, 25.0);
        assert_eq!(result.risk_factors[0], "High age (65.0 years) - Major risk factor");
        assert!(result.risk_factors.iter().all(|f| !f.starts_with("Middle age")));
    }

    #[test]
    fn fractional_age_renders_shortest_form() {
        let result = score(&patient(52.5, 0, 0, 80.0, None, ""));
        assert_eq!(result.risk_factors[0], "Middle age (52.5 years) - Moderate risk factor");
    }

    #[test]
    fn saturated_input_caps_at_100() {
        let result = score(&patient(80.0, 1, 1, 250.0, Some(40.0), "smokes"));
        assert_eq!(result.risk_score, 100.0);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.risk_factors.len(), 6);
    }

    #[test]
    fn score_above_ceiling_is_capped_but_level_uses_raw_sum() {
        let mut config = RiskConfig::default();
        config.weights.age = 0.60;
        let result = calculate_risk_score(&patient(90.0, 1, 1, 250.0, Some(40.0), "smokes"), &config);
        assert_eq!(result.risk_score, 100.0);
        assert_eq!(result.analysis.age_risk, 60.0);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn clean_patient_has_no_factors() {
        let result = score(&patient(20.0, 0, 0, 80.0, Some(22.0), "never smoked"));
        assert_eq!(result.risk_factors, vec![NO_RISK_FACTORS.to_string()]);
        assert_eq!(result.risk_level, RiskLevel::VeryLow);
        assert_eq!(result.risk_score, 4.4);
        assert_eq!(result.analysis.glucose_risk, 6.0);
        assert_eq!(result.analysis.bmi_risk, 7.3);
        assert_eq!(result.recommendation, "Continue healthy habits. Annual check-ups sufficient.");
    }

    #[test]
    fn glucose_step_and_proportional_disagree() {
        let result = score(&patient(20.0, 0, 0, 150.0, None, ""));
        assert_eq!(
            result.risk_factors,
            vec!["Elevated glucose level (150.0 mg/dL) - Moderate risk".to_string()]
        );
        // 4.444 from age plus the stepped 10
        assert_eq!(result.risk_score, 14.4);
        assert_eq!(result.analysis.glucose_risk, 11.3);
    }

    #[test]
    fn glucose_tiers() {
        let high = score(&patient(0.0, 0, 0, 200.0, None, ""));
        assert_eq!(high.risk_score, 15.0);
        assert_eq!(high.risk_factors[0], "Very high glucose level (200.0 mg/dL) - High risk");
        assert_eq!(high.analysis.glucose_risk, 15.0);

        let slight = score(&patient(0.0, 0, 0, 100.0, None, ""));
        assert_eq!(slight.risk_score, 5.0);
        assert_eq!(slight.risk_factors[0], "Slightly elevated glucose (100.0 mg/dL) - Low risk");

        let normal = score(&patient(0.0, 0, 0, 99.9, None, ""));
        assert_eq!(normal.risk_score, 0.0);
        assert_eq!(normal.risk_factors, vec![NO_RISK_FACTORS.to_string()]);
    }

    #[test]
    fn end_to_end_example() {
        let result = score(&patient(70.0, 1, 0, 210.0, Some(32.0), "smokes"));
        assert_eq!(result.risk_score, 80.0);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(
            result.risk_factors,
            vec![
                "High age (70.0 years) - Major risk factor",
                "Hypertension - Major risk factor",
                "Very high glucose level (210.0 mg/dL) - High risk",
                "Obese (BMI: 32.0) - Increased risk",
                "Current smoker - Increased risk",
            ]
        );
        assert_eq!(
            result.analysis,
            RiskAnalysis {
                age_risk: 25.0,
                hypertension_risk: 20,
                heart_disease_risk: 0,
                glucose_risk: 15.0,
                bmi_risk: 10.0,
                smoking_risk: 10,
            }
        );
    }

    #[test]
    fn missing_and_nan_bmi_are_skipped() {
        for bmi in [None, Some(f64::NAN), Some(0.0)] {
            let result = score(&patient(20.0, 0, 0, 80.0, bmi, ""));
            assert_eq!(result.analysis.bmi_risk, 0.0);
            assert_eq!(result.risk_factors, vec![NO_RISK_FACTORS.to_string()]);
        }
    }

    #[test]
    fn overweight_bmi() {
        let result = score(&patient(0.0, 0, 0, 0.0, Some(27.35), ""));
        assert_eq!(result.risk_score, 5.0);
        assert_eq!(result.risk_factors[0], "Overweight (BMI: 27.4) - Slight risk");
        assert_eq!(result.analysis.bmi_risk, 9.1);
    }

    #[test]
    fn smoking_status_is_case_insensitive() {
        let current = score(&patient(0.0, 0, 0, 0.0, None, "SMOKES"));
        assert_eq!(current.analysis.smoking_risk, 10);
        assert_eq!(current.risk_factors[0], "Current smoker - Increased risk");

        let former = score(&patient(0.0, 0, 0, 0.0, None, "Formerly Smoked"));
        assert_eq!(former.analysis.smoking_risk, 5);
        assert_eq!(former.risk_factors[0], "Former smoker - Slight increased risk");

        for other in ["never smoked", "Unknown", ""] {
            assert_eq!(score(&patient(0.0, 0, 0, 0.0, None, other)).analysis.smoking_risk, 0);
        }
    }

    #[test]
    fn level_boundaries_are_inclusive() {
        // 25 + 20 + 10 + 5
        let high = score(&patient(65.0, 1, 0, 150.0, None, "formerly smoked"));
        assert_eq!(high.risk_score, 60.0);
        assert_eq!(high.risk_level, RiskLevel::High);

        let moderate = score(&patient(65.0, 0, 0, 200.0, None, ""));
        assert_eq!(moderate.risk_score, 40.0);
        assert_eq!(moderate.risk_level, RiskLevel::Moderate);

        let low = score(&patient(0.0, 1, 0, 0.0, None, ""));
        assert_eq!(low.risk_score, 20.0);
        assert_eq!(low.risk_level, RiskLevel::Low);
        assert_eq!(low.recommendation, "Maintain healthy lifestyle. Regular check-ups recommended.");

        // 10 + 5 + 5 from three minor factors
        let stacked = score(&patient(0.0, 0, 0, 140.0, Some(29.9), "formerly smoked"));
        assert_eq!(stacked.risk_score, 20.0);
        assert_eq!(stacked.risk_level, RiskLevel::Low);

        let very_low = score(&patient(44.0, 0, 0, 99.0, Some(24.9), "never smoked"));
        assert_eq!(very_low.risk_level, RiskLevel::VeryLow);
    }

    #[test]
    fn out_of_range_values_are_taken_at_face_value() {
        let result = score(&patient(150.0, 0, 0, -5.0, None, ""));
        assert_eq!(result.risk_score, 25.0);
        assert_eq!(result.analysis.glucose_risk, -0.4);
    }

    #[test]
    fn non_binary_flag_only_shows_in_analysis() {
        let result = score(&patient(0.0, 2, 0, 0.0, None, ""));
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.analysis.hypertension_risk, 20);
    }

    #[test]
    fn risk_level_serializes_with_spaces() {
        let json = serde_json::to_value(RiskLevel::VeryLow).unwrap();
        assert_eq!(json, serde_json::json!("VERY LOW"));
        assert_eq!(RiskLevel::Moderate.to_string(), "MODERATE");
    }

    #[test]
    fn attributes_from_loose_json() {
        let payload = serde_json::json!({
            "age": "70",
            "hypertension": "1",
            "avg_glucose_level": 210,
            "bmi": "N/A",
            "smoking_status": "smokes",
        });
        let attrs = PatientAttributes::from_json(&payload).unwrap();
        assert_eq!(attrs.heart_disease, 0);
        assert_eq!(attrs.bmi, None);
        assert_eq!(score(&attrs).risk_score, 70.0);
    }

    #[test]
    fn attributes_reject_garbage() {
        let payload = serde_json::json!({"age": "old"});
        assert!(PatientAttributes::from_json(&payload).is_err());
        assert_eq!(
            PatientAttributes::from_json(&serde_json::json!([1, 2])),
            Err(ScoringError::NotAnObject)
        );
    }

    #[test]
    fn attributes_reject_non_finite_numbers() {
        let payload = serde_json::json!({"age": "NaN", "avg_glucose_level": "inf"});
        assert!(matches!(
            PatientAttributes::from_json(&payload),
            Err(ScoringError::InvalidNumber { ref field, .. }) if field == "age"
        ));
        let payload = serde_json::json!({"age": 50, "avg_glucose_level": "-inf"});
        assert!(PatientAttributes::from_json(&payload).is_err());
    }

    #[test]
    fn empty_payload_defaults_to_zero() {
        let attrs = PatientAttributes::from_json(&serde_json::json!({})).unwrap();
        let result = score(&attrs);
        assert_eq!(result.risk_score, 0.0);
        assert_eq!(result.risk_level, RiskLevel::VeryLow);
    }
}

#[cfg(test)]
mod statistics_tests {
    use crate::*;

    fn record(
        age: f64,
        hypertension: i64,
        heart_disease: i64,
        glucose: f64,
        bmi: Option<f64>,
        stroke: i64,
    ) -> StrokeRecord {
        StrokeRecord {
            attributes: PatientAttributes {
                age,
                hypertension,
                heart_disease,
                avg_glucose_level: glucose,
                bmi,
                smoking_status: String::new(),
            },
            stroke,
        }
    }

    #[test]
    fn empty_store_is_degenerate() {
        let stats = summarize(&Vec::<StrokeRecord>::new());
        assert_eq!(stats.total_patients, 0);
        assert_eq!(stats.stroke_cases, 0);
        assert_eq!(stats.stroke_rate, 0.0);
        assert!(stats.stroke_profile.is_none());

        let json = serde_json::to_value(&stats).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(json.get("stroke_patient_avg_age").is_none());
    }

    #[test]
    fn no_stroke_cases_omits_profile() {
        let records = vec![record(30.0, 0, 0, 90.0, Some(22.0), 0)];
        let stats = summarize(&records);
        assert_eq!(stats.total_patients, 1);
        assert_eq!(stats.stroke_rate, 0.0);
        assert!(stats.stroke_profile.is_none());
    }

    #[test]
    fn subgroup_averages() {
        let records = vec![
            record(70.0, 1, 1, 200.0, Some(30.0), 1),
            record(80.0, 0, 1, 100.0, None, 1),
            record(20.0, 1, 1, 300.0, Some(50.0), 0),
            record(40.0, 0, 0, 90.0, Some(20.0), 0),
        ];
        let stats = summarize(&records);
        assert_eq!(stats.total_patients, 4);
        assert_eq!(stats.stroke_cases, 2);
        assert_eq!(stats.stroke_rate, 50.0);

        let profile = stats.stroke_profile.unwrap();
        assert_eq!(profile.stroke_patient_avg_age, Some(75.0));
        assert_eq!(profile.stroke_patient_avg_glucose, Some(150.0));
        // the record without BMI is excluded, not zero-filled
        assert_eq!(profile.stroke_patient_avg_bmi, Some(30.0));
        assert_eq!(profile.stroke_with_hypertension, 1);
        assert_eq!(profile.stroke_with_heart_disease, 2);
    }

    #[test]
    fn stroke_rate_rounds_to_two_decimals() {
        let records = vec![
            record(70.0, 0, 0, 100.0, None, 1),
            record(50.0, 0, 0, 100.0, None, 0),
            record(50.0, 0, 0, 100.0, None, 0),
        ];
        let stats = summarize(&records);
        assert_eq!(stats.stroke_rate, 33.33);
    }

    #[test]
    fn avg_bmi_is_null_when_absent_everywhere() {
        let records = vec![
            record(70.0, 0, 0, 100.0, None, 1),
            record(60.0, 0, 0, 120.0, Some(f64::NAN), 1),
        ];
        let stats = summarize(&records);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["stroke_patient_avg_bmi"], serde_json::Value::Null);
        assert_eq!(json["stroke_patient_avg_age"], serde_json::json!(65.0));
        assert_eq!(json["stroke_with_hypertension"], serde_json::json!(0));
    }

    #[test]
    fn zero_bmi_is_excluded_from_average() {
        let records = vec![
            record(70.0, 0, 0, 100.0, Some(30.0), 1),
            record(60.0, 0, 0, 120.0, Some(0.0), 1),
        ];
        assert_eq!(records[1].attributes.valid_bmi(), None);
        let profile = summarize(&records).stroke_profile.unwrap();
        assert_eq!(profile.stroke_patient_avg_bmi, Some(30.0));
    }

    #[test]
    fn aggregate_path_matches_fold() {
        let aggregate = StrokeAggregate {
            total: 5110,
            stroke_cases: 249,
            subgroup: Some(SubgroupTotals {
                avg_age: Some(67.72819277108434),
                avg_glucose: Some(132.54473895582328),
                avg_bmi: Some(30.471291866028707),
                hypertension_count: 66,
                heart_disease_count: 47,
            }),
        };
        let stats = PopulationStats::from_aggregate(&aggregate);
        assert_eq!(stats.stroke_rate, 4.87);
        let profile = stats.stroke_profile.unwrap();
        assert_eq!(profile.stroke_patient_avg_age, Some(67.7));
        assert_eq!(profile.stroke_patient_avg_glucose, Some(132.5));
        assert_eq!(profile.stroke_patient_avg_bmi, Some(30.5));
    }
}
