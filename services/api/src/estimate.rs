use crate::infra::{
    default_algorithm_config, demo_catalog, demo_comparables, InMemoryAlgorithmConfigStore,
    InMemoryValuationSink, InMemoryVehicleCatalog, StaticMarketData,
};
use clap::Args;
use moto_valuation::config::ValuationSettings;
use moto_valuation::error::AppError;
use moto_valuation::valuation::{
    AlgorithmConfig, AuditStatus, CatalogImporter, DealerId, NoopObserver, ValuationClock,
    ValuationOutcome, ValuationRequest, ValuationService,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// JSON valuation request (same shape as the HTTP body)
    #[arg(long)]
    pub(crate) request: PathBuf,
    /// Price as of this model year (defaults to the current year)
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// Blend against this market average instead of the demo comparables
    #[arg(long)]
    pub(crate) market_average: Option<u64>,
    /// Vehicle catalog CSV export (defaults to the demo catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

pub(crate) async fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.request)?;
    let request: ValuationRequest = serde_json::from_str(&raw)?;

    let outcome = estimate_request(request, &args).await?;

    println!("{}", outcome.report.render_text());
    if let AuditStatus::Failed { reason } = &outcome.audit {
        eprintln!("warning: valuation was not recorded ({reason})");
    }
    Ok(())
}

async fn estimate_request(
    request: ValuationRequest,
    args: &EstimateArgs,
) -> Result<ValuationOutcome, AppError> {
    let vehicles = match &args.catalog {
        Some(path) => CatalogImporter::from_path(path)?,
        None => demo_catalog(),
    };
    let market = match args.market_average {
        Some(average) => StaticMarketData::uniform(&vehicles, average),
        None => demo_comparables(),
    };

    // The CLI prices with the demo coefficients under whichever dealer the request names.
    let configs = Arc::new(InMemoryAlgorithmConfigStore::default());
    configs.activate(AlgorithmConfig {
        dealer_id: DealerId(request.dealer_id.trim().to_string()),
        ..default_algorithm_config()
    });

    let clock = args
        .year
        .map(ValuationClock::Fixed)
        .unwrap_or(ValuationClock::System);
    let service = ValuationService::new(
        Arc::new(InMemoryVehicleCatalog::new(vehicles)),
        configs,
        Arc::new(InMemoryValuationSink::default()),
        Arc::new(market),
        ValuationSettings::default(),
    )
    .with_observer(Arc::new(NoopObserver))
    .with_clock(clock);

    Ok(service.estimate(request).await?)
}
