use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use continuing_education::admissions::{
    admission_router, AdmissionNotifier, AdmissionRepository, AdmissionService, FileRepository,
    FileStorage,
};
use continuing_education::prospects::{prospect_router, ProspectRepository, ProspectService};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Admission and prospect APIs plus the operational endpoints.
pub(crate) fn app_router<R, F, S, N, P>(
    admissions: Arc<AdmissionService<R, F, S, N>>,
    prospects: Arc<ProspectService<P>>,
) -> Router
where
    R: AdmissionRepository + 'static,
    F: FileRepository + 'static,
    S: FileStorage + 'static,
    N: AdmissionNotifier + 'static,
    P: ProspectRepository + 'static,
{
    admission_router(admissions)
        .merge(prospect_router(prospects))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Acquire) {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
