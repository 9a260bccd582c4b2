use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use serde_json::json;
use signup_wizard::accounts::{
    registration_router, LocationCatalog, PhotoStore, RegistrationService, UserRepository,
};
use std::sync::Arc;

pub(crate) fn with_registration_routes<R, P>(
    service: Arc<RegistrationService<R, P>>,
    catalog: Arc<LocationCatalog>,
) -> axum::Router
where
    R: UserRepository + 'static,
    P: PhotoStore + 'static,
{
    registration_router(service, catalog)
        .route("/", get(service_description))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .fallback(not_found)
}

pub(crate) async fn service_description() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Registration API",
        "endpoints": {
            "users": "/api/users",
            "locations": "/api/location/countries",
        },
    }))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": "Endpoint not found" })),
    )
}
