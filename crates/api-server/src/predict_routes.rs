//! Risk prediction routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use patient_store::Patient;
use serde::Serialize;
use serde_json::Value;
use stroke_risk::{PatientAttributes, PopulationStats, RiskAssessment};

use crate::sanitize::SanitizedPayload;
use crate::{ApiResponse, AppError, AppState};

#[derive(Serialize)]
pub struct PatientPrediction {
    pub patient_id: String,
    pub patient: Patient,
    pub prediction: RiskAssessment,
}

pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/api/predict", post(predict_adhoc))
        .route("/api/predict/patient/:id", get(predict_patient))
        .route("/api/predict/statistics", get(population_statistics))
}

/// Score a stored patient
async fn predict_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PatientPrediction>>, AppError> {
    let patient = state.patients.get(&id).await?;
    let prediction = state.scorer.score(&patient.attributes());
    tracing::debug!(
        "Scored patient {}: {} ({})",
        patient.id,
        prediction.risk_score,
        prediction.risk_level
    );

    Ok(Json(ApiResponse::success(PatientPrediction {
        patient_id: patient.id.clone(),
        patient,
        prediction,
    })))
}

/// Score attributes that are not stored
async fn predict_adhoc(
    State(state): State<AppState>,
    payload: SanitizedPayload,
) -> Result<Json<ApiResponse<RiskAssessment>>, AppError> {
    let attributes = PatientAttributes::from_json(&Value::Object(payload.0))?;
    Ok(Json(ApiResponse::success(state.scorer.score(&attributes))))
}

async fn population_statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PopulationStats>>, AppError> {
    let aggregate = state.patients.stroke_aggregate().await?;
    Ok(Json(ApiResponse::success(PopulationStats::from_aggregate(
        &aggregate,
    ))))
}
