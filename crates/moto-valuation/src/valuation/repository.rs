use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Condition, DealerId, UserId, VehicleId, VehicleRecord};
use super::pricing::AlgorithmConfig;

/// Source of immutable catalog records.
pub trait VehicleCatalog: Send + Sync {
    fn vehicle(
        &self,
        id: &VehicleId,
    ) -> impl Future<Output = Result<Option<VehicleRecord>, RepositoryError>> + Send;
}

/// Source of the single active config per dealer.
pub trait AlgorithmConfigStore: Send + Sync {
    fn active_config(
        &self,
        dealer_id: &DealerId,
    ) -> impl Future<Output = Result<Option<AlgorithmConfig>, RepositoryError>> + Send;
}

/// Write-once audit log of computed valuations.
pub trait ValuationSink: Send + Sync {
    fn record(
        &self,
        record: ValuationRecord,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Most recent records first.
    fn history(
        &self,
        dealer_id: &DealerId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ValuationRecord>, RepositoryError>> + Send;
}

/// Average price of comparable listings for a vehicle, if any are known.
pub trait MarketDataSource: Send + Sync {
    fn comparables_average(
        &self,
        vehicle: &VehicleRecord,
    ) -> impl Future<Output = Result<Option<u64>, RepositoryError>> + Send;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Persisted audit row. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRecord {
    pub motorcycle_id: VehicleId,
    pub dealer_id: DealerId,
    pub user_id: UserId,
    pub mileage: u64,
    pub condition: Condition,
    pub calculated_price: u64,
    pub created_at: DateTime<Utc>,
}
