use tracing::{debug, info};

use super::pricing::{CalculationResult, FactorKind};

/// Instrumentation hook passed explicitly into each calculation.
pub trait ValuationObserver: Send + Sync {
    fn factor_computed(&self, kind: FactorKind, multiplier: f64);
    fn valuation_completed(&self, result: &CalculationResult);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ValuationObserver for NoopObserver {
    fn factor_computed(&self, _kind: FactorKind, _multiplier: f64) {}

    fn valuation_completed(&self, _result: &CalculationResult) {}
}

/// Emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ValuationObserver for TracingObserver {
    fn factor_computed(&self, kind: FactorKind, multiplier: f64) {
        debug!(factor = kind.label(), multiplier, "valuation factor computed");
    }

    fn valuation_completed(&self, result: &CalculationResult) {
        info!(
            final_price = result.final_price,
            total_effect = result.factors.total(),
            entries = result.breakdown.len(),
            "valuation completed"
        );
    }
}
