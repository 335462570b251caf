//! REST routes and the JSON 404 fallback.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use patientdata_lib::tools::{AllergyArgs, BloodTypeArgs, PatientIdArgs, SearchArgs};
use patientdata_lib::ToolCall;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::chat::{self, ChatRequest};
use crate::error::ApiError;
use crate::metrics::{metrics_handler, record_chat_turn};
use crate::middleware::{propagate_request_id, track_metrics};
use crate::response::{ApiResponse, ChatReply, HealthStatus, NotFoundBody};
use crate::state::AppState;

pub const SERVICE_NAME: &str = "patientdata-gateway";

pub const AVAILABLE_ENDPOINTS: [&str; 7] = [
    "GET /api/health",
    "GET /api/patients",
    "GET /api/patients/:id",
    "GET /api/patients/search/:query",
    "GET /api/patients/blood-type/:bloodType",
    "GET /api/patients/allergy/:allergy",
    "POST /api/chat",
];

/// Build the gateway router with all layers applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/patients", get(list_patients))
        .route("/api/patients/{id}", get(patient_by_id))
        .route("/api/patients/search/{query}", get(search_patients))
        .route("/api/patients/blood-type/{blood_type}", get(patients_by_blood_type))
        .route("/api/patients/allergy/{allergy}", get(patients_by_allergy))
        .route("/api/chat", post(chat))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_metrics))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(middleware::from_fn(propagate_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok(SERVICE_NAME, env!("CARGO_PKG_VERSION")))
}

/// Run a collection tool; any tool-reported error is a 500.
async fn list(state: &AppState, call: ToolCall) -> Result<Json<ApiResponse>, ApiError> {
    let outcome = state.call_tool(&call).await?;
    if outcome.is_error {
        return Err(ApiError::ToolFailed(outcome.error_message()));
    }
    Ok(Json(ApiResponse::list(outcome.data)))
}

async fn list_patients(State(state): State<AppState>) -> Result<Json<ApiResponse>, ApiError> {
    list(&state, ToolCall::GetAllPatients).await
}

async fn patient_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let call = ToolCall::GetPatientById(PatientIdArgs { patient_id: id });
    let outcome = state.call_tool(&call).await?;
    if outcome.is_error {
        return Err(ApiError::NotFound(outcome.error_message()));
    }
    Ok(Json(ApiResponse::data(outcome.data)))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    field: Option<String>,
}

async fn search_patients(
    State(state): State<AppState>,
    Path(query): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse>, ApiError> {
    let field = params.field.filter(|f| !f.is_empty());
    list(&state, ToolCall::SearchPatients(SearchArgs { query, field })).await
}

async fn patients_by_blood_type(
    State(state): State<AppState>,
    Path(blood_type): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    list(
        &state,
        ToolCall::GetPatientsByBloodType(BloodTypeArgs { blood_type }),
    )
    .await
}

async fn patients_by_allergy(
    State(state): State<AppState>,
    Path(allergy): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    list(&state, ToolCall::GetPatientsByAllergy(AllergyArgs { allergy })).await
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let result = chat::respond(&state, request).await;
    match &result {
        Ok(reply) => record_chat_turn(reply.tool_calls.len(), "ok"),
        Err(_) => record_chat_turn(0, "error"),
    }
    result.map(Json)
}

async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<NotFoundBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundBody {
            success: false,
            error: format!("Endpoint not found: {} {}", method, uri.path()),
            available_endpoints: AVAILABLE_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
        }),
    )
}
