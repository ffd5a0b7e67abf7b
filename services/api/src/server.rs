use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryAdmissionRepository, InMemoryFileRepository, InMemoryProspectRepository,
    LocalFileStorage, TracingNotifier,
};
use crate::routes::app_router;
use axum::extract::DefaultBodyLimit;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use continuing_education::admissions::AdmissionService;
use continuing_education::auth::RoleRegistry;
use continuing_education::config::AppConfig;
use continuing_education::error::AppError;
use continuing_education::prospects::ProspectService;
use continuing_education::seed::SeedData;
use continuing_education::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let roles = Arc::new(RoleRegistry::standard());
    let admissions = AdmissionService::new(
        Arc::new(InMemoryAdmissionRepository::default()),
        Arc::new(InMemoryFileRepository::default()),
        Arc::new(LocalFileStorage::new(config.storage.media_root.clone())),
        Arc::new(TracingNotifier),
        roles.clone(),
    )
    .with_locale(config.locale);
    let prospects = ProspectService::new(Arc::new(InMemoryProspectRepository::default()), roles)
        .with_locale(config.locale);

    if let Some(path) = args.seed.take() {
        SeedData::from_path(&path)?.load_into(&admissions, &prospects)?;
    }

    let app = app_router(Arc::new(admissions), Arc::new(prospects))
        .layer(DefaultBodyLimit::max(config.storage.max_upload_bytes))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        locale = %config.locale,
        media_root = %config.storage.media_root.display(),
        "continuing education admissions ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
