use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryPhotoStore, InMemoryUserRepository};
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use signup_wizard::accounts::{LocationCatalog, RegistrationService};
use signup_wizard::config::AppConfig;
use signup_wizard::error::AppError;
use signup_wizard::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let registration_service = Arc::new(RegistrationService::new(
        Arc::new(InMemoryUserRepository::default()),
        Arc::new(InMemoryPhotoStore::default()),
    ));
    let catalog = Arc::new(LocationCatalog::standard());

    let app = with_registration_routes(registration_service, catalog)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "registration api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
