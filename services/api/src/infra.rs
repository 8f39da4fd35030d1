use metrics_exporter_prometheus::PrometheusHandle;
use moto_valuation::valuation::{
    market_average, AlgorithmConfig, AlgorithmConfigStore, ComparableListing, DealerId,
    MarketDataSource, RepositoryError, ValuationRecord, ValuationSink, VehicleCatalog, VehicleId,
    VehicleRecord,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

pub(crate) const DEMO_DEALER: &str = "demo-dealer";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryVehicleCatalog {
    vehicles: Arc<HashMap<VehicleId, VehicleRecord>>,
}

impl InMemoryVehicleCatalog {
    pub(crate) fn new(vehicles: Vec<VehicleRecord>) -> Self {
        let vehicles = vehicles
            .into_iter()
            .map(|vehicle| (vehicle.id.clone(), vehicle))
            .collect();
        Self {
            vehicles: Arc::new(vehicles),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.vehicles.len()
    }
}

impl VehicleCatalog for InMemoryVehicleCatalog {
    async fn vehicle(&self, id: &VehicleId) -> Result<Option<VehicleRecord>, RepositoryError> {
        Ok(self.vehicles.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAlgorithmConfigStore {
    configs: Arc<Mutex<HashMap<DealerId, AlgorithmConfig>>>,
}

impl InMemoryAlgorithmConfigStore {
    /// Replaces the dealer's active config.
    pub(crate) fn activate(&self, config: AlgorithmConfig) {
        let mut guard = self.configs.lock().expect("config mutex poisoned");
        guard.insert(config.dealer_id.clone(), config);
    }
}

impl AlgorithmConfigStore for InMemoryAlgorithmConfigStore {
    async fn active_config(
        &self,
        dealer_id: &DealerId,
    ) -> Result<Option<AlgorithmConfig>, RepositoryError> {
        let guard = self.configs.lock().expect("config mutex poisoned");
        Ok(guard.get(dealer_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryValuationSink {
    records: Arc<Mutex<Vec<ValuationRecord>>>,
}

impl ValuationSink for InMemoryValuationSink {
    async fn record(&self, record: ValuationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("valuation log mutex poisoned");
        guard.push(record);
        Ok(())
    }

    async fn history(
        &self,
        dealer_id: &DealerId,
        limit: usize,
    ) -> Result<Vec<ValuationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("valuation log mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|record| &record.dealer_id == dealer_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
impl InMemoryValuationSink {
    pub(crate) fn records(&self) -> Vec<ValuationRecord> {
        self.records
            .lock()
            .expect("valuation log mutex poisoned")
            .clone()
    }
}

/// Fixed comparables keyed by catalog id. No live scraping.
#[derive(Default, Clone)]
pub(crate) struct StaticMarketData {
    listings: Arc<HashMap<VehicleId, Vec<ComparableListing>>>,
}

impl StaticMarketData {
    pub(crate) fn new(listings: HashMap<VehicleId, Vec<ComparableListing>>) -> Self {
        Self {
            listings: Arc::new(listings),
        }
    }

    /// Uses `average` as the only comparable for every vehicle id in `vehicles`.
    pub(crate) fn uniform(vehicles: &[VehicleRecord], average: u64) -> Self {
        let listings = vehicles
            .iter()
            .map(|vehicle| {
                (
                    vehicle.id.clone(),
                    vec![ComparableListing {
                        price: average,
                        mileage: 0,
                        year: vehicle.year,
                    }],
                )
            })
            .collect();
        Self::new(listings)
    }
}

impl MarketDataSource for StaticMarketData {
    async fn comparables_average(
        &self,
        vehicle: &VehicleRecord,
    ) -> Result<Option<u64>, RepositoryError> {
        Ok(self
            .listings
            .get(&vehicle.id)
            .and_then(|listings| market_average(listings)))
    }
}

pub(crate) fn default_algorithm_config() -> AlgorithmConfig {
    AlgorithmConfig {
        dealer_id: DealerId(DEMO_DEALER.to_string()),
        age_factor: 0.95,
        mileage_factor: 0.9,
        condition_factor: 1.0,
        market_trend_factor: 1.0,
    }
}

pub(crate) fn demo_catalog() -> Vec<VehicleRecord> {
    vec![
        VehicleRecord {
            id: VehicleId("yamaha-mt07-2023".to_string()),
            brand: "Yamaha".to_string(),
            model: "MT-07".to_string(),
            year: 2023,
            engine_cc: 689,
            engine_power_hp: 73,
            category: "naked".to_string(),
            base_price: 500_000,
        },
        VehicleRecord {
            id: VehicleId("honda-cb500x-2021".to_string()),
            brand: "Honda".to_string(),
            model: "CB500X".to_string(),
            year: 2021,
            engine_cc: 471,
            engine_power_hp: 47,
            category: "adventure".to_string(),
            base_price: 320_000,
        },
        VehicleRecord {
            id: VehicleId("ducati-monster-2022".to_string()),
            brand: "Ducati".to_string(),
            model: "Monster".to_string(),
            year: 2022,
            engine_cc: 937,
            engine_power_hp: 111,
            category: "naked".to_string(),
            base_price: 600_000,
        },
        VehicleRecord {
            id: VehicleId("bmw-r1250gs-2020".to_string()),
            brand: "BMW".to_string(),
            model: "R 1250 GS".to_string(),
            year: 2020,
            engine_cc: 1254,
            engine_power_hp: 136,
            category: "adventure".to_string(),
            base_price: 850_000,
        },
        VehicleRecord {
            id: VehicleId("kawasaki-z900-2024".to_string()),
            brand: "Kawasaki".to_string(),
            model: "Z900".to_string(),
            year: 2024,
            engine_cc: 948,
            engine_power_hp: 125,
            category: "naked".to_string(),
            base_price: 540_000,
        },
    ]
}

pub(crate) fn demo_comparables() -> StaticMarketData {
    let listing = |price, mileage, year| ComparableListing {
        price,
        mileage,
        year,
    };
    let listings = HashMap::from([
        (
            VehicleId("yamaha-mt07-2023".to_string()),
            vec![
                listing(455_000, 8_000, 2023),
                listing(430_000, 15_500, 2023),
                listing(410_000, 22_000, 2022),
            ],
        ),
        (
            VehicleId("ducati-monster-2022".to_string()),
            vec![listing(540_000, 12_000, 2022), listing(515_000, 19_000, 2022)],
        ),
        (
            VehicleId("bmw-r1250gs-2020".to_string()),
            vec![listing(690_000, 41_000, 2020)],
        ),
    ]);
    StaticMarketData::new(listings)
}
