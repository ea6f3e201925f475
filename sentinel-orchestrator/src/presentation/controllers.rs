//! API controllers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::info;

use sentinel_core::domain::RedTeamReport;
use sentinel_graph::GraphStore;
use sentinel_redteam::AttackResultRepository;

use crate::application::scoring::ScoringEngine;
use crate::application::use_cases::{GetDashboardUseCase, RunRedTeamUseCase};
use crate::domain::ScanError;
use crate::infrastructure::scan_queue::ScanQueueHandle;
use crate::infrastructure::scan_store::ScanRepository;
use crate::presentation::models::{
    DashboardResponse, ErrorResponse, RedTeamRequest, ScanListResponse, SubmitScanRequest,
    SubmitScanResponse,
};

/// Shared state for every controller
#[derive(Clone)]
pub struct ApiState {
    pub queue: ScanQueueHandle,
    pub scans: Arc<dyn ScanRepository>,
    pub graph_store: Arc<dyn GraphStore>,
    pub scoring: Arc<ScoringEngine>,
    pub attack_results: Arc<dyn AttackResultRepository>,
    pub dashboard: Arc<GetDashboardUseCase>,
    pub redteam: Arc<RunRedTeamUseCase>,
}

/// Controller failure mapped onto an HTTP status
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "internal_error",
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "invalid_request",
            message: message.into(),
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        Self::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.error.to_string(),
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// GET /health - liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// POST /api/v1/scans - queue a revision for scanning
#[utoipa::path(
    post,
    path = "/api/v1/scans",
    request_body = SubmitScanRequest,
    responses(
        (status = 202, description = "Scan queued", body = SubmitScanResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "scans"
)]
pub async fn submit_scan(
    State(state): State<ApiState>,
    Json(request): Json<SubmitScanRequest>,
) -> Result<(StatusCode, Json<SubmitScanResponse>), ApiError> {
    if request.repo_id.trim().is_empty() {
        return Err(ApiError::bad_request("repo_id must not be empty"));
    }
    if request.revision_sha.trim().is_empty() {
        return Err(ApiError::bad_request("revision_sha must not be empty"));
    }

    let revision = request.into_revision();
    info!(
        repo_id = %revision.repo_id,
        revision_sha = %revision.revision_sha,
        files = revision.files.len(),
        "Scan submitted"
    );

    let scan_id = state.queue.submit(revision).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitScanResponse {
            scan_id,
            status: "queued".to_string(),
        }),
    ))
}

/// GET /api/v1/scans/{repo_id} - scan history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/scans/{repo_id}",
    params(("repo_id" = String, Path, description = "Repository identifier")),
    responses(
        (status = 200, description = "Scan history", body = ScanListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "scans"
)]
pub async fn list_scans(
    State(state): State<ApiState>,
    Path(repo_id): Path<String>,
) -> Result<Json<ScanListResponse>, ApiError> {
    let scans = state.scans.list(&repo_id).await?;
    Ok(Json(ScanListResponse { repo_id, scans }))
}

/// GET /api/v1/dashboard/{repo_id} - integrity dashboard
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/{repo_id}",
    params(("repo_id" = String, Path, description = "Repository identifier")),
    responses(
        (status = 200, description = "Dashboard state", body = DashboardResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<ApiState>,
    Path(repo_id): Path<String>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let data = state.dashboard.execute(&repo_id).await?;
    Ok(Json(DashboardResponse {
        repo_id: data.repo_id,
        score: data.score,
        severity_band: data.severity_band,
        drift_events_in_window: data.drift_events_in_window,
        window_hours: data.window_hours,
        exploits_prevented_count: data.exploits_prevented,
        total_scans: data.total_scans,
        last_scan: data.last_scan,
    }))
}

/// POST /api/v1/redteam - simulate attacks against latest findings
#[utoipa::path(
    post,
    path = "/api/v1/redteam",
    request_body = RedTeamRequest,
    responses(
        (status = 200, description = "Red-team report", body = RedTeamReport),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "redteam"
)]
pub async fn run_redteam(
    State(state): State<ApiState>,
    Json(request): Json<RedTeamRequest>,
) -> Result<Json<RedTeamReport>, ApiError> {
    if request.repo_id.trim().is_empty() {
        return Err(ApiError::bad_request("repo_id must not be empty"));
    }
    let report = state
        .redteam
        .execute(&request.repo_id, request.model_scope)
        .await?;
    Ok(Json(report))
}

/// DELETE /api/v1/repos/{repo_id} - destroy all state for a repository
#[utoipa::path(
    delete,
    path = "/api/v1/repos/{repo_id}",
    params(("repo_id" = String, Path, description = "Repository identifier")),
    responses(
        (status = 204, description = "Repository state destroyed"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "repos"
)]
pub async fn reset_repo(
    State(state): State<ApiState>,
    Path(repo_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!(repo_id = %repo_id, "Resetting repository state");
    state.graph_store.reset(&repo_id).await;
    state.scans.reset(&repo_id).await?;
    state.scoring.reset(&repo_id).await;
    state
        .attack_results
        .reset(&repo_id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}
