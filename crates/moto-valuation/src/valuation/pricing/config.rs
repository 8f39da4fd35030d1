use serde::{Deserialize, Serialize};

use crate::valuation::domain::DealerId;

/// Per-dealer tunable coefficients. Treated as an immutable snapshot for the
/// duration of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmConfig {
    pub dealer_id: DealerId,
    /// Per-year base: below 1.0 depreciates, above 1.0 appreciates.
    pub age_factor: f64,
    /// Per-10,000 km base.
    pub mileage_factor: f64,
    pub condition_factor: f64,
    pub market_trend_factor: f64,
}

impl AlgorithmConfig {
    /// All coefficients at 1.0, so only the fixed tables move the price.
    pub fn neutral(dealer_id: DealerId) -> Self {
        Self {
            dealer_id,
            age_factor: 1.0,
            mileage_factor: 1.0,
            condition_factor: 1.0,
            market_trend_factor: 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigInvalid> {
        let coefficients = [
            ("ageFactor", self.age_factor),
            ("mileageFactor", self.mileage_factor),
            ("conditionFactor", self.condition_factor),
            ("marketTrendFactor", self.market_trend_factor),
        ];

        for (field, value) in coefficients {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigInvalid {
                    dealer_id: self.dealer_id.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// A dealer coefficient outside its domain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("algorithm config for dealer '{dealer_id}': {field} must be a positive number (found {value})")]
pub struct ConfigInvalid {
    pub dealer_id: DealerId,
    pub field: &'static str,
    pub value: f64,
}
