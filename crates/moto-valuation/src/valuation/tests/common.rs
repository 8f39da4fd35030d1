use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::config::ValuationSettings;
use crate::valuation::domain::{
    DamagePart, DealerId, PartConditionRequest, TechnicalSpecRequest, ValuationRequest,
    VehicleId, VehicleRecord,
};
use crate::valuation::observer::ValuationObserver;
use crate::valuation::pricing::{AlgorithmConfig, CalculationResult, FactorKind};
use crate::valuation::repository::{
    AlgorithmConfigStore, MarketDataSource, RepositoryError, ValuationRecord, ValuationSink,
    VehicleCatalog,
};
use crate::valuation::service::{ValuationClock, ValuationService};

pub(super) const MOTORCYCLE: &str = "yamaha-mt07-2023";
pub(super) const DEALER: &str = "dealer-1";
/// 500000 x 0.9025 x 0.81 x 0.85 x 1.10 for the fixtures below in 2025.
pub(super) const EXPECTED_PRICE: u64 = 341_754;

pub(super) fn vehicle() -> VehicleRecord {
    VehicleRecord {
        id: VehicleId(MOTORCYCLE.to_string()),
        brand: "Yamaha".to_string(),
        model: "MT-07".to_string(),
        year: 2023,
        engine_cc: 689,
        engine_power_hp: 73,
        category: "naked".to_string(),
        base_price: 500_000,
    }
}

pub(super) fn config() -> AlgorithmConfig {
    AlgorithmConfig {
        dealer_id: DealerId(DEALER.to_string()),
        age_factor: 0.95,
        mileage_factor: 0.9,
        condition_factor: 1.0,
        market_trend_factor: 1.0,
    }
}

pub(super) fn pristine_damage() -> BTreeMap<String, PartConditionRequest> {
    DamagePart::ALL
        .into_iter()
        .map(|part| {
            (
                part.key().to_string(),
                PartConditionRequest {
                    condition_category: "original".to_string(),
                    status_severity: "excellent".to_string(),
                },
            )
        })
        .collect()
}

pub(super) fn request() -> ValuationRequest {
    ValuationRequest {
        motorcycle_id: MOTORCYCLE.to_string(),
        dealer_id: DEALER.to_string(),
        user_id: "appraiser-7".to_string(),
        mileage: 20_000,
        condition: "good".to_string(),
        technical_specs: TechnicalSpecRequest {
            vehicle_condition: "new".to_string(),
            engine_power_range: None,
            cooling: None,
            exchange_available: false,
        },
        safety_features: BTreeMap::new(),
        accessories: BTreeMap::new(),
        damage_report: pristine_damage(),
    }
}

pub(super) fn settings() -> ValuationSettings {
    ValuationSettings {
        fetch_timeout: Duration::from_millis(100),
        persist_attempts: 3,
        persist_backoff_ms: 1,
        persist_max_delay: Duration::from_millis(5),
    }
}

pub(super) type MemoryService =
    ValuationService<MemoryCatalog, MemoryConfigs, MemorySink, FixedMarket>;

pub(super) fn build_service(
    market: Option<u64>,
) -> (MemoryService, Arc<MemorySink>, Arc<RecordingObserver>) {
    let sink = Arc::new(MemorySink::default());
    let observer = Arc::new(RecordingObserver::default());
    let service = ValuationService::new(
        Arc::new(MemoryCatalog::with(vec![vehicle()])),
        Arc::new(MemoryConfigs::with(vec![config()])),
        sink.clone(),
        Arc::new(FixedMarket(market)),
        settings(),
    )
    .with_observer(observer.clone())
    .with_clock(ValuationClock::Fixed(2025));
    (service, sink, observer)
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    vehicles: HashMap<VehicleId, VehicleRecord>,
}

impl MemoryCatalog {
    pub(super) fn with(vehicles: Vec<VehicleRecord>) -> Self {
        Self {
            vehicles: vehicles
                .into_iter()
                .map(|vehicle| (vehicle.id.clone(), vehicle))
                .collect(),
        }
    }
}

impl VehicleCatalog for MemoryCatalog {
    async fn vehicle(&self, id: &VehicleId) -> Result<Option<VehicleRecord>, RepositoryError> {
        Ok(self.vehicles.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryConfigs {
    configs: HashMap<DealerId, AlgorithmConfig>,
}

impl MemoryConfigs {
    pub(super) fn with(configs: Vec<AlgorithmConfig>) -> Self {
        Self {
            configs: configs
                .into_iter()
                .map(|config| (config.dealer_id.clone(), config))
                .collect(),
        }
    }
}

impl AlgorithmConfigStore for MemoryConfigs {
    async fn active_config(
        &self,
        dealer_id: &DealerId,
    ) -> Result<Option<AlgorithmConfig>, RepositoryError> {
        Ok(self.configs.get(dealer_id).cloned())
    }
}

/// Fails the first `failures` writes, then stores records.
#[derive(Default)]
pub(super) struct MemorySink {
    records: Mutex<Vec<ValuationRecord>>,
    failures: AtomicUsize,
    attempts: AtomicUsize,
}

impl MemorySink {
    pub(super) fn failing(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            ..Self::default()
        }
    }

    pub(super) fn records(&self) -> Vec<ValuationRecord> {
        self.records.lock().expect("sink mutex poisoned").clone()
    }

    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ValuationSink for MemorySink {
    async fn record(&self, record: ValuationRecord) -> Result<(), RepositoryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable("audit table locked".to_string()));
        }
        self.records
            .lock()
            .expect("sink mutex poisoned")
            .push(record);
        Ok(())
    }

    async fn history(
        &self,
        dealer_id: &DealerId,
        limit: usize,
    ) -> Result<Vec<ValuationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("sink mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|record| &record.dealer_id == dealer_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

pub(super) struct FixedMarket(pub(super) Option<u64>);

impl MarketDataSource for FixedMarket {
    async fn comparables_average(
        &self,
        _vehicle: &VehicleRecord,
    ) -> Result<Option<u64>, RepositoryError> {
        Ok(self.0)
    }
}

pub(super) struct OfflineMarket;

impl MarketDataSource for OfflineMarket {
    async fn comparables_average(
        &self,
        _vehicle: &VehicleRecord,
    ) -> Result<Option<u64>, RepositoryError> {
        Err(RepositoryError::Unavailable("listing feed offline".to_string()))
    }
}

pub(super) struct SlowCatalog(pub(super) Duration);

impl VehicleCatalog for SlowCatalog {
    async fn vehicle(&self, _id: &VehicleId) -> Result<Option<VehicleRecord>, RepositoryError> {
        tokio::time::sleep(self.0).await;
        Ok(Some(vehicle()))
    }
}

pub(super) struct UnavailableConfigs;

impl AlgorithmConfigStore for UnavailableConfigs {
    async fn active_config(
        &self,
        _dealer_id: &DealerId,
    ) -> Result<Option<AlgorithmConfig>, RepositoryError> {
        Err(RepositoryError::Unavailable("config database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingObserver {
    factors: Mutex<Vec<FactorKind>>,
    completed: Mutex<Vec<u64>>,
}

impl RecordingObserver {
    pub(super) fn factors(&self) -> Vec<FactorKind> {
        self.factors.lock().expect("observer mutex poisoned").clone()
    }

    pub(super) fn completed(&self) -> Vec<u64> {
        self.completed.lock().expect("observer mutex poisoned").clone()
    }
}

impl ValuationObserver for RecordingObserver {
    fn factor_computed(&self, kind: FactorKind, _multiplier: f64) {
        self.factors.lock().expect("observer mutex poisoned").push(kind);
    }

    fn valuation_completed(&self, result: &CalculationResult) {
        self.completed
            .lock()
            .expect("observer mutex poisoned")
            .push(result.final_price);
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
