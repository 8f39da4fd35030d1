use crate::cli::ServeArgs;
use crate::infra::{
    default_algorithm_config, demo_catalog, demo_comparables, AppState,
    InMemoryAlgorithmConfigStore, InMemoryValuationSink, InMemoryVehicleCatalog,
};
use crate::routes::with_valuation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use moto_valuation::config::AppConfig;
use moto_valuation::error::AppError;
use moto_valuation::telemetry;
use moto_valuation::valuation::{CatalogImporter, ValuationService};
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

    let vehicles = match args.catalog.take() {
        Some(path) => CatalogImporter::from_path(&path)?,
        None => demo_catalog(),
    };
    let catalog = Arc::new(InMemoryVehicleCatalog::new(vehicles));
    let configs = Arc::new(InMemoryAlgorithmConfigStore::default());
    configs.activate(default_algorithm_config());
    let valuation_service = Arc::new(ValuationService::new(
        catalog.clone(),
        configs,
        Arc::new(InMemoryValuationSink::default()),
        Arc::new(demo_comparables()),
        config.valuation.clone(),
    ));

    let app = with_valuation_routes(valuation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        catalog_size = catalog.len(),
        "motorcycle valuation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
