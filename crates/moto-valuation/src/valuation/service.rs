use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, Utc};
use serde::Serialize;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;
use tracing::{debug, info, warn};

use crate::config::ValuationSettings;

use super::domain::{DealerId, ValuationInput, ValuationRequest, VehicleRecord};
use super::intake::{RequestGuard, ValidationError};
use super::market::{BlendedEstimate, MarketBlender};
use super::observer::{TracingObserver, ValuationObserver};
use super::pricing::{
    calculate_price, CalculationResult, ConfigInvalid, PricingError, ValuationContext,
};
use super::report::ValuationReport;
use super::repository::{
    AlgorithmConfigStore, MarketDataSource, RepositoryError, ValuationRecord, ValuationSink,
    VehicleCatalog,
};

/// Where the calculation's notion of "this year" comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuationClock {
    System,
    Fixed(i32),
}

impl ValuationClock {
    pub fn current_year(self) -> i32 {
        match self {
            ValuationClock::System => Local::now().year(),
            ValuationClock::Fixed(year) => year,
        }
    }
}

/// External collaborators the service waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    VehicleCatalog,
    AlgorithmConfig,
    MarketData,
    AuditLog,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Dependency::VehicleCatalog => "vehicle catalog",
            Dependency::AlgorithmConfig => "algorithm config store",
            Dependency::MarketData => "market data source",
            Dependency::AuditLog => "valuation audit log",
        };
        f.write_str(label)
    }
}

/// Outcome of the audit write, which never fails the valuation itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditStatus {
    Recorded,
    Failed { reason: String },
}

/// Everything produced for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationOutcome {
    pub vehicle: VehicleRecord,
    pub result: CalculationResult,
    pub estimate: BlendedEstimate,
    pub report: ValuationReport,
    #[serde(skip)]
    pub audit: AuditStatus,
}

/// Service composing intake validation, the collaborators and the pricing engine.
pub struct ValuationService<C, K, S, M> {
    guard: RequestGuard,
    catalog: Arc<C>,
    configs: Arc<K>,
    sink: Arc<S>,
    market: Arc<M>,
    observer: Arc<dyn ValuationObserver>,
    settings: ValuationSettings,
    clock: ValuationClock,
}

impl<C, K, S, M> ValuationService<C, K, S, M>
where
    C: VehicleCatalog + 'static,
    K: AlgorithmConfigStore + 'static,
    S: ValuationSink + 'static,
    M: MarketDataSource + 'static,
{
    pub fn new(
        catalog: Arc<C>,
        configs: Arc<K>,
        sink: Arc<S>,
        market: Arc<M>,
        settings: ValuationSettings,
    ) -> Self {
        Self {
            guard: RequestGuard,
            catalog,
            configs,
            sink,
            market,
            observer: Arc::new(TracingObserver),
            settings,
            clock: ValuationClock::System,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ValuationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_clock(mut self, clock: ValuationClock) -> Self {
        self.clock = clock;
        self
    }

    /// Validate, price, blend and audit a single request.
    pub async fn estimate(
        &self,
        request: ValuationRequest,
    ) -> Result<ValuationOutcome, ValuationServiceError> {
        let input = self.guard.input_from_request(request)?;
        debug!(
            motorcycle = %input.motorcycle_id,
            dealer = %input.dealer_id,
            "valuation request accepted"
        );

        let (vehicle, config) = tokio::join!(
            self.bounded(
                Dependency::VehicleCatalog,
                self.catalog.vehicle(&input.motorcycle_id)
            ),
            self.bounded(
                Dependency::AlgorithmConfig,
                self.configs.active_config(&input.dealer_id)
            ),
        );
        let vehicle = found(vehicle, || {
            ValuationServiceError::VehicleNotFound(input.motorcycle_id.0.clone())
        })?;
        let config = found(config, || {
            ValuationServiceError::ConfigNotFound(input.dealer_id.0.clone())
        })?;

        let context = ValuationContext {
            current_year: self.clock.current_year(),
        };
        let result = calculate_price(&vehicle, &config, &input, context, self.observer.as_ref())?;

        let market_average = self.market_average(&vehicle).await;
        let estimate = MarketBlender.blend(result.final_price, market_average);
        let report = ValuationReport::build(&vehicle, &input.damage, &result, &estimate);

        let audit = self.record_audit(audit_record(&input, &result)).await;

        info!(
            motorcycle = %vehicle.id,
            dealer = %input.dealer_id,
            final_price = result.final_price,
            displayed_estimate = estimate.displayed_estimate,
            "valuation estimated"
        );

        Ok(ValuationOutcome {
            vehicle,
            result,
            estimate,
            report,
            audit,
        })
    }

    /// Audit history for a dealer, most recent first.
    pub async fn history(
        &self,
        dealer_id: &DealerId,
        limit: usize,
    ) -> Result<Vec<ValuationRecord>, ValuationServiceError> {
        self.bounded(Dependency::AuditLog, self.sink.history(dealer_id, limit))
            .await
    }

    async fn bounded<T>(
        &self,
        dependency: Dependency,
        call: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, ValuationServiceError> {
        match tokio::time::timeout(self.settings.fetch_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(ValuationServiceError::Unavailable { dependency, source }),
            Err(_) => Err(ValuationServiceError::Timeout { dependency }),
        }
    }

    async fn market_average(&self, vehicle: &VehicleRecord) -> Option<u64> {
        match self
            .bounded(
                Dependency::MarketData,
                self.market.comparables_average(vehicle),
            )
            .await
        {
            Ok(average) => average,
            Err(err) => {
                warn!(motorcycle = %vehicle.id, error = %err, "market average unavailable, skipping blend");
                None
            }
        }
    }

    async fn record_audit(&self, record: ValuationRecord) -> AuditStatus {
        let outcome = Retry::spawn(audit_backoff(&self.settings), || {
            let record = record.clone();
            async move {
                let result = self.sink.record(record).await;
                if let Err(err) = &result {
                    debug!(error = %err, "audit write attempt failed");
                }
                result
            }
        })
        .await;

        match outcome {
            Ok(()) => AuditStatus::Recorded,
            Err(err) => {
                warn!(
                    motorcycle = %record.motorcycle_id,
                    dealer = %record.dealer_id,
                    calculated_price = record.calculated_price,
                    error = %err,
                    "valuation computed but audit record could not be persisted"
                );
                AuditStatus::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

/// Delays between audit write attempts. The n-th retry waits
/// `persist_backoff_ms * 2^n`, capped at `persist_max_delay`.
pub(super) fn audit_backoff(settings: &ValuationSettings) -> impl Iterator<Item = Duration> {
    // tokio-retry yields factor * base^n, so the base stays fixed at 2.
    ExponentialBackoff::from_millis(2)
        .factor(settings.persist_backoff_ms.max(1))
        .max_delay(settings.persist_max_delay)
        .take(settings.persist_attempts.saturating_sub(1))
}

/// Collapses "absent" and "not found" into the caller's not-found error.
fn found<T>(
    lookup: Result<Option<T>, ValuationServiceError>,
    missing: impl FnOnce() -> ValuationServiceError,
) -> Result<T, ValuationServiceError> {
    match lookup {
        Ok(Some(value)) => Ok(value),
        Ok(None)
        | Err(ValuationServiceError::Unavailable {
            source: RepositoryError::NotFound,
            ..
        }) => Err(missing()),
        Err(err) => Err(err),
    }
}

fn audit_record(input: &ValuationInput, result: &CalculationResult) -> ValuationRecord {
    ValuationRecord {
        motorcycle_id: input.motorcycle_id.clone(),
        dealer_id: input.dealer_id.clone(),
        user_id: input.user_id.clone(),
        mileage: input.mileage,
        condition: input.condition,
        calculated_price: result.final_price,
        created_at: Utc::now(),
    }
}

/// Error raised by the valuation service. Audit failures are not represented
/// here; they surface through [`AuditStatus`].
#[derive(Debug, thiserror::Error)]
pub enum ValuationServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    ConfigInvalid(#[from] ConfigInvalid),
    #[error("valuation cannot be priced: {0}")]
    Unpriceable(#[source] PricingError),
    #[error("motorcycle '{0}' not found in catalog")]
    VehicleNotFound(String),
    #[error("no active algorithm config for dealer '{0}'")]
    ConfigNotFound(String),
    #[error("{dependency} did not respond in time")]
    Timeout { dependency: Dependency },
    #[error("{dependency} unavailable: {source}")]
    Unavailable {
        dependency: Dependency,
        #[source]
        source: RepositoryError,
    },
}

impl From<PricingError> for ValuationServiceError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::ConfigInvalid(invalid) => Self::ConfigInvalid(invalid),
            other => Self::Unpriceable(other),
        }
    }
}
