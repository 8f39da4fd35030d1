mod breakdown;
mod config;
mod damage;
mod factors;

pub use breakdown::{effect_display, percent_display, PriceBreakdownEntry};
pub use config::{AlgorithmConfig, ConfigInvalid};
pub use damage::{assess_damage, part_multiplier, part_weight, DamageAssessment, PartImpact};
pub use factors::{
    age_effect, condition_effect, equipment_effect, equipment_scores, mileage_effect,
    technical_effect, EquipmentScores, FactorKind, FactorOutcome,
};

use breakdown::{round_currency, PriceWalk};
use serde::{Deserialize, Serialize};

use super::domain::{ValuationInput, VehicleRecord};
use super::observer::ValuationObserver;

/// Inputs that vary by call but do not come from the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuationContext {
    pub current_year: i32,
}

/// One multiplier per category, each strictly positive for valid inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFactors {
    pub year_effect: f64,
    pub mileage_effect: f64,
    pub condition_effect: f64,
    pub technical_effect: f64,
    pub features_effect: f64,
    pub damage_effect: f64,
}

impl PriceFactors {
    pub fn total(&self) -> f64 {
        self.year_effect
            * self.mileage_effect
            * self.condition_effect
            * self.technical_effect
            * self.features_effect
            * self.damage_effect
    }
}

/// Reasons a calculation stops without producing a price.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error(transparent)]
    ConfigInvalid(#[from] ConfigInvalid),
    #[error("{} multiplier {value} is not a positive finite number", .kind.label())]
    DegenerateFactor { kind: FactorKind, value: f64 },
    #[error("combined multiplier {0} is not a positive finite number")]
    DegenerateTotal(f64),
}

fn priceable(multiplier: f64) -> bool {
    multiplier.is_finite() && multiplier > 0.0
}

/// Immutable output of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub final_price: u64,
    pub factors: PriceFactors,
    pub breakdown: Vec<PriceBreakdownEntry>,
}

/// Runs every factor calculator and aggregates them into a final price.
///
/// The dealer config is validated first; nothing is computed for an invalid
/// config, and a multiplier that collapses to zero or overflows to infinity
/// aborts the calculation. Breakdown entries follow the fixed factor order, with the damage
/// factor itemized per damaged part.
pub fn calculate_price(
    vehicle: &VehicleRecord,
    config: &AlgorithmConfig,
    input: &ValuationInput,
    context: ValuationContext,
    observer: &dyn ValuationObserver,
) -> Result<CalculationResult, PricingError> {
    config.validate()?;

    let year = age_effect(vehicle.year, context.current_year, config.age_factor);
    let mileage = mileage_effect(input.mileage, config.mileage_factor);
    let condition = condition_effect(input.condition, config.condition_factor);
    let technical = technical_effect(&input.technical, vehicle.engine_power_hp);
    let equipment = equipment_effect(&input.safety, &input.accessories);
    let damage = assess_damage(&input.damage);

    for (kind, value) in [
        (year.kind, year.multiplier),
        (mileage.kind, mileage.multiplier),
        (condition.kind, condition.multiplier),
        (technical.kind, technical.multiplier),
        (equipment.kind, equipment.multiplier),
        (FactorKind::Damage, damage.effect),
    ] {
        if !priceable(value) {
            return Err(PricingError::DegenerateFactor { kind, value });
        }
    }

    for outcome in [&year, &mileage, &condition, &technical, &equipment] {
        observer.factor_computed(outcome.kind, outcome.multiplier);
    }
    observer.factor_computed(FactorKind::Damage, damage.effect);
    observer.factor_computed(FactorKind::MarketTrend, config.market_trend_factor);

    let factors = PriceFactors {
        year_effect: year.multiplier,
        mileage_effect: mileage.multiplier,
        condition_effect: condition.multiplier,
        technical_effect: technical.multiplier,
        features_effect: equipment.multiplier,
        damage_effect: damage.effect,
    };

    let combined = factors.total() * config.market_trend_factor;
    if !priceable(combined) {
        return Err(PricingError::DegenerateTotal(combined));
    }
    let raw_price = vehicle.base_price as f64 * combined;
    let final_price = round_currency(raw_price).max(0) as u64;

    let mut walk = PriceWalk::new(vehicle.base_price);
    for outcome in [&year, &mileage, &condition, &technical, &equipment] {
        walk.multiply(outcome.kind.label(), &outcome.description, outcome.multiplier);
    }

    let before_damage = walk.price();
    for impact in damage.parts.iter().filter(|impact| impact.multiplier < 1.0) {
        let description = format!(
            "{} ({:.0}% weight, x{})",
            impact.condition.status_label(),
            impact.weight * 100.0,
            impact.multiplier
        );
        walk.shift(
            &format!("Damage: {}", impact.part.label()),
            &description,
            before_damage * impact.impact(),
            impact.impact(),
        );
    }

    walk.multiply(
        FactorKind::MarketTrend.label(),
        &format!("dealer market trend x{}", config.market_trend_factor),
        config.market_trend_factor,
    );

    let result = CalculationResult {
        final_price,
        factors,
        breakdown: walk.finish(),
    };
    observer.valuation_completed(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::domain::{
        AccessorySet, Condition, ConditionCategory, DamagePart, DamageReport, DealerId,
        PartCondition, SafetyFeature, SafetyFeatureSet, StatusSeverity, TechnicalSpecInput,
        UserId, VehicleCondition, VehicleId,
    };
    use crate::valuation::observer::NoopObserver;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    fn vehicle() -> VehicleRecord {
        VehicleRecord {
            id: VehicleId("moto-1".to_string()),
            brand: "Yamaha".to_string(),
            model: "MT-07".to_string(),
            year: 2023,
            engine_cc: 689,
            engine_power_hp: 73,
            category: "naked".to_string(),
            base_price: 500_000,
        }
    }

    fn config() -> AlgorithmConfig {
        AlgorithmConfig {
            dealer_id: DealerId("dealer-1".to_string()),
            age_factor: 0.95,
            mileage_factor: 0.9,
            condition_factor: 1.0,
            market_trend_factor: 1.0,
        }
    }

    fn input() -> ValuationInput {
        ValuationInput {
            motorcycle_id: VehicleId("moto-1".to_string()),
            dealer_id: DealerId("dealer-1".to_string()),
            user_id: UserId("user-1".to_string()),
            mileage: 20_000,
            condition: Condition::Good,
            technical: TechnicalSpecInput {
                vehicle_condition: VehicleCondition::New,
                engine_power_range: None,
                cooling: None,
                exchange_available: false,
            },
            safety: SafetyFeatureSet::default(),
            accessories: AccessorySet::default(),
            damage: DamageReport::pristine(),
        }
    }

    fn context() -> ValuationContext {
        ValuationContext { current_year: 2025 }
    }

    fn reconciled(result: &CalculationResult, base_price: u64) -> i64 {
        base_price as i64
            + result
                .breakdown
                .iter()
                .map(|entry| entry.amount)
                .sum::<i64>()
    }

    #[derive(Default)]
    struct RecordingObserver {
        factors: Mutex<Vec<FactorKind>>,
        completed: Mutex<Vec<u64>>,
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

    #[test]
    fn reference_scenario_matches_the_product_formula() {
        let result = calculate_price(&vehicle(), &config(), &input(), context(), &NoopObserver)
            .expect("valid config");

        assert!((result.factors.year_effect - 0.9025).abs() < 1e-9);
        assert!((result.factors.mileage_effect - 0.81).abs() < 1e-9);
        assert!((result.factors.condition_effect - 0.85).abs() < 1e-9);
        assert!((result.factors.technical_effect - 1.10).abs() < 1e-9);
        assert!((result.factors.features_effect - 1.0).abs() < 1e-9);
        assert!((result.factors.damage_effect - 1.0).abs() < 1e-9);

        let expected = (500_000.0_f64 * 0.9025 * 0.81 * 0.85 * 1.10).round() as u64;
        assert_eq!(result.final_price, expected);
        assert_eq!(result.final_price, 341_754);
    }

    #[test]
    fn breakdown_reconciles_with_final_price() {
        let mut input = input();
        input.safety = SafetyFeatureSet(BTreeSet::from([SafetyFeature::Abs]));
        input.damage = DamageReport::pristine()
            .with_part(
                DamagePart::Engine,
                PartCondition {
                    condition_category: ConditionCategory::Replaced,
                    status_severity: StatusSeverity::Good,
                },
            )
            .with_part(
                DamagePart::RearPanel,
                PartCondition {
                    condition_category: ConditionCategory::Damaged,
                    status_severity: StatusSeverity::Fair,
                },
            );
        let mut config = config();
        config.market_trend_factor = 1.037;

        let result =
            calculate_price(&vehicle(), &config, &input, context(), &NoopObserver).expect("valid");

        let rebuilt = reconciled(&result, vehicle().base_price);
        assert!((rebuilt - result.final_price as i64).abs() <= 1);
    }

    #[test]
    fn damaged_parts_get_their_own_entries() {
        let mut input = input();
        input.damage = DamageReport::pristine().with_part(
            DamagePart::Chassis,
            PartCondition {
                condition_category: ConditionCategory::Damaged,
                status_severity: StatusSeverity::Poor,
            },
        );

        let result = calculate_price(&vehicle(), &config(), &input, context(), &NoopObserver)
            .expect("valid");

        let damage_entries: Vec<_> = result
            .breakdown
            .iter()
            .filter(|entry| entry.name.starts_with("Damage:"))
            .collect();
        assert_eq!(damage_entries.len(), 1);
        assert_eq!(damage_entries[0].name, "Damage: Chassis");
        assert_eq!(damage_entries[0].effect_display, "-10.0%");
        assert!(damage_entries[0].amount < 0);
        assert!((result.factors.damage_effect - 0.9).abs() < 1e-9);
    }

    #[test]
    fn named_factors_always_appear_in_order() {
        let result = calculate_price(&vehicle(), &config(), &input(), context(), &NoopObserver)
            .expect("valid");

        let names: Vec<&str> = result
            .breakdown
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Model year",
                "Mileage",
                "Condition",
                "Technical specs",
                "Safety & accessories",
                "Market trend"
            ]
        );
    }

    #[test]
    fn identical_inputs_yield_identical_results() {
        let first = calculate_price(&vehicle(), &config(), &input(), context(), &NoopObserver);
        let second = calculate_price(&vehicle(), &config(), &input(), context(), &NoopObserver);
        assert_eq!(first, second);
    }

    #[test]
    fn factors_stay_positive_in_the_worst_case() {
        let worst = PartCondition {
            condition_category: ConditionCategory::Damaged,
            status_severity: StatusSeverity::Poor,
        };
        let mut input = input();
        input.mileage = 900_000;
        input.condition = Condition::Poor;
        input.technical.vehicle_condition = VehicleCondition::GreyImport;
        input.technical.exchange_available = true;
        input.damage = DamagePart::ALL
            .into_iter()
            .fold(DamageReport::pristine(), |report, part| {
                report.with_part(part, worst)
            });
        let mut vehicle = vehicle();
        vehicle.year = 1975;

        let result =
            calculate_price(&vehicle, &config(), &input, context(), &NoopObserver).expect("valid");

        let factors = result.factors;
        for value in [
            factors.year_effect,
            factors.mileage_effect,
            factors.condition_effect,
            factors.technical_effect,
            factors.features_effect,
            factors.damage_effect,
        ] {
            assert!(value > 0.0);
        }
        let rebuilt = reconciled(&result, vehicle.base_price);
        assert!((rebuilt - result.final_price as i64).abs() <= 1);
    }

    #[test]
    fn invalid_config_stops_before_any_factor_runs() {
        let mut config = config();
        config.mileage_factor = -0.5;
        let observer = RecordingObserver::default();

        let err = calculate_price(&vehicle(), &config, &input(), context(), &observer)
            .expect_err("negative mileage factor rejected");

        match err {
            PricingError::ConfigInvalid(invalid) => assert_eq!(invalid.field, "mileageFactor"),
            other => panic!("expected config rejection, got {other:?}"),
        }
        assert!(observer.factors.lock().expect("lock").is_empty());
        assert!(observer.completed.lock().expect("lock").is_empty());
    }

    #[test]
    fn observer_sees_every_factor_once() {
        let observer = RecordingObserver::default();

        let result = calculate_price(&vehicle(), &config(), &input(), context(), &observer)
            .expect("valid");

        let seen = observer.factors.lock().expect("lock").clone();
        assert_eq!(seen.len(), 7);
        assert_eq!(seen.first(), Some(&FactorKind::Year));
        assert_eq!(seen.last(), Some(&FactorKind::MarketTrend));
        assert_eq!(
            observer.completed.lock().expect("lock").as_slice(),
            &[result.final_price]
        );
    }

    #[test]
    fn mileage_decay_that_underflows_is_rejected() {
        let mut input = input();
        input.mileage = 100_000_000;
        let observer = RecordingObserver::default();

        let err = calculate_price(&vehicle(), &config(), &input, context(), &observer)
            .expect_err("0.9^10000 collapses to zero");

        assert_eq!(
            err,
            PricingError::DegenerateFactor {
                kind: FactorKind::Mileage,
                value: 0.0
            }
        );
        assert!(observer.completed.lock().expect("lock").is_empty());
    }

    #[test]
    fn appreciating_mileage_factor_that_overflows_is_rejected() {
        let mut config = config();
        config.mileage_factor = 1.1;
        let mut input = input();
        input.mileage = i64::MAX as u64;

        match calculate_price(&vehicle(), &config, &input, context(), &NoopObserver) {
            Err(PricingError::DegenerateFactor { kind, value }) => {
                assert_eq!(kind, FactorKind::Mileage);
                assert!(value.is_infinite());
            }
            other => panic!("expected an overflowing mileage factor, got {other:?}"),
        }
    }

    #[test]
    fn product_of_extreme_factors_is_rejected() {
        let mut config = config();
        config.age_factor = 1e200;
        config.condition_factor = 1e200;
        let mut vehicle = vehicle();
        vehicle.year = 2024;

        let err = calculate_price(&vehicle, &config, &input(), context(), &NoopObserver)
            .expect_err("1e200 * 1e200 overflows");

        assert!(matches!(err, PricingError::DegenerateTotal(total) if total.is_infinite()));
    }
}
