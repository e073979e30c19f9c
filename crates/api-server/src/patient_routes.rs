//! Patient record routes.
//!
//! All routes require a session. Ids are UUIDs; anything else is rejected
//! before it reaches the store.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use patient_store::{
    NewPatient, PageRequest, Patient, PatientFilter, PatientPage, PatientUpdate, SortField,
    SortOrder, DEFAULT_PER_PAGE,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::sanitize::SanitizedPayload;
use crate::{ApiResponse, AppError, AppState};

/// Query params for listing patients
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_field: Option<String>,
    pub sort_order: Option<i64>,
    pub gender: Option<String>,
    pub stroke: Option<i64>,
    pub hypertension: Option<i64>,
    pub heart_disease: Option<i64>,
    pub smoking_status: Option<String>,
    pub work_type: Option<String>,
}

impl ListQuery {
    fn page_request(&self) -> Result<PageRequest, AppError> {
        let sort_field = match self.sort_field.as_deref().map(str::trim) {
            None | Some("") => SortField::default(),
            Some(name) => SortField::parse(name)
                .ok_or_else(|| AppError::bad_request(format!("Invalid sort field: {}", name)))?,
        };
        let sort_order = match self.sort_order {
            None => SortOrder::default(),
            Some(sign) => SortOrder::from_sign(sign)
                .ok_or_else(|| AppError::bad_request("sort_order must be 1 or -1"))?,
        };

        Ok(PageRequest::new(
            clamp_u32(self.page.unwrap_or(1)),
            clamp_u32(self.per_page.unwrap_or(i64::from(DEFAULT_PER_PAGE))),
            sort_field,
            sort_order,
        ))
    }

    fn filter(&self) -> PatientFilter {
        let non_empty = |v: &Option<String>| {
            v.as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        PatientFilter {
            gender: non_empty(&self.gender),
            stroke: self.stroke,
            hypertension: self.hypertension,
            heart_disease: self.heart_disease,
            smoking_status: non_empty(&self.smoking_status),
            work_type: non_empty(&self.work_type),
        }
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Serialize)]
pub struct ModifiedResponse {
    pub modified: u64,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub message: String,
}

pub fn patient_routes() -> Router<AppState> {
    Router::new()
        .route("/api/patients", get(list_patients).post(create_patient))
        .route(
            "/api/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
}

async fn list_patients(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PatientPage>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;
    let request = query.page_request()?;
    let page = state.patients.page(&query.filter(), &request).await?;
    Ok(Json(ApiResponse::success(page)))
}

async fn create_patient(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: SanitizedPayload,
) -> Result<(StatusCode, Json<ApiResponse<CreatedResponse>>), AppError> {
    let patient = NewPatient::from_payload(&payload.0)?;
    let id = state.patients.create(&patient).await?;
    tracing::info!("Patient {} created by {}", id, user.username);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedResponse { id })),
    ))
}

async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Patient>>, AppError> {
    let patient = state.patients.get(&id).await?;
    Ok(Json(ApiResponse::success(patient)))
}

async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: SanitizedPayload,
) -> Result<Json<ApiResponse<ModifiedResponse>>, AppError> {
    let update = PatientUpdate::from_payload(&payload.0)?;
    let modified = state.patients.update(&id, &update).await?;
    tracing::info!("Patient {} updated by {}", id.trim(), user.username);
    Ok(Json(ApiResponse::success(ModifiedResponse { modified })))
}

async fn delete_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<DeletedResponse>>, AppError> {
    state.patients.delete(&id).await?;
    tracing::info!("Patient {} deleted by {}", id.trim(), user.username);
    Ok(Json(ApiResponse::success(DeletedResponse {
        message: "Patient deleted.".to_string(),
    })))
}
