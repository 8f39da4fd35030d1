//! Motorcycle valuation: request intake, the pricing engine, market blending,
//! and the service and HTTP surface that tie them to their collaborators.

pub mod catalog;
pub mod domain;
pub(crate) mod intake;
pub mod market;
pub mod observer;
pub mod pricing;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogImportError, CatalogImporter};
pub use domain::{
    Accessory, AccessorySet, Condition, ConditionCategory, Cooling, DamagePart, DamageReport,
    DealerId, PartCondition, PartConditionRequest, PowerRange, SafetyFeature, SafetyFeatureSet,
    StatusSeverity, TechnicalSpecInput, TechnicalSpecRequest, UserId, ValuationInput,
    ValuationRequest, VehicleCondition, VehicleId, VehicleRecord,
};
pub use intake::{RequestGuard, ValidationError, MAX_MILEAGE_KM};
pub use market::{market_average, BlendedEstimate, ComparableListing, MarketBlender};
pub use observer::{NoopObserver, TracingObserver, ValuationObserver};
pub use pricing::{
    calculate_price, AlgorithmConfig, CalculationResult, ConfigInvalid, FactorKind,
    PriceBreakdownEntry, PriceFactors, PricingError, ValuationContext,
};
pub use report::{DamageRow, FactorRow, ValuationReport};
pub use repository::{
    AlgorithmConfigStore, MarketDataSource, RepositoryError, ValuationRecord, ValuationSink,
    VehicleCatalog,
};
pub use router::{valuation_router, ValuationView};
pub use service::{
    AuditStatus, Dependency, ValuationClock, ValuationOutcome, ValuationService,
    ValuationServiceError,
};
