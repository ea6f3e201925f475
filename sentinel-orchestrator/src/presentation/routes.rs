//! Route definitions and router assembly

use std::time::Duration;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::presentation::controllers::{
    ApiState, get_dashboard, health_check, list_scans, reset_repo, run_redteam, submit_scan,
};
use crate::presentation::models::*;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::health_check,
        crate::presentation::controllers::submit_scan,
        crate::presentation::controllers::list_scans,
        crate::presentation::controllers::get_dashboard,
        crate::presentation::controllers::run_redteam,
        crate::presentation::controllers::reset_repo,
    ),
    components(schemas(
        SubmitScanRequest,
        SourceFileModel,
        SubmitScanResponse,
        ScanListResponse,
        DashboardResponse,
        RedTeamRequest,
        ErrorResponse,
        sentinel_core::domain::ScanRecord,
        sentinel_core::domain::RedTeamReport,
        sentinel_core::domain::ModelScope,
        sentinel_core::domain::SeverityBand,
    )),
    tags(
        (name = "scans", description = "Scan submission and history"),
        (name = "dashboard", description = "Auth integrity dashboard"),
        (name = "redteam", description = "Attack simulation"),
        (name = "repos", description = "Repository lifecycle"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "Sentinel API",
        description = "Authorization drift detection and multi-model consensus scanning"
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/scans", post(submit_scan))
        .route("/api/v1/scans/{repo_id}", get(list_scans))
        .route("/api/v1/dashboard/{repo_id}", get(get_dashboard))
        .route("/api/v1/redteam", post(run_redteam))
        .route("/api/v1/repos/{repo_id}", delete(reset_repo))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(120)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
