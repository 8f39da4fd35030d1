use serde::Serialize;

use crate::valuation::domain::{
    AccessorySet, Condition, Cooling, SafetyFeatureSet, TechnicalSpecInput,
};

const MILEAGE_UNIT_KM: f64 = 10_000.0;

const POWER_ABOVE_CATALOG: f64 = 1.05;
const POWER_AT_OR_BELOW_CATALOG: f64 = 0.95;
const LIQUID_COOLING: f64 = 1.05;
const EXCHANGE_ACCEPTED: f64 = 0.95;

/// Named multiplier categories, in breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FactorKind {
    Year,
    Mileage,
    Condition,
    Technical,
    Equipment,
    Damage,
    MarketTrend,
}

impl FactorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Year => "Model year",
            Self::Mileage => "Mileage",
            Self::Condition => "Condition",
            Self::Technical => "Technical specs",
            Self::Equipment => "Safety & accessories",
            Self::Damage => "Damage",
            Self::MarketTrend => "Market trend",
        }
    }
}

/// One calculator's multiplier plus a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorOutcome {
    pub kind: FactorKind,
    pub multiplier: f64,
    pub description: String,
}

/// `age_factor ^ age`, with age clamped at zero for catalog years in the future.
pub fn age_effect(vehicle_year: i32, current_year: i32, age_factor: f64) -> FactorOutcome {
    let age = current_year.saturating_sub(vehicle_year).max(0);
    FactorOutcome {
        kind: FactorKind::Year,
        multiplier: age_factor.powi(age),
        description: format!("{age} year(s) old at x{age_factor} per year"),
    }
}

/// Exponential decay per 10,000 km.
pub fn mileage_effect(mileage: u64, mileage_factor: f64) -> FactorOutcome {
    let units = mileage as f64 / MILEAGE_UNIT_KM;
    FactorOutcome {
        kind: FactorKind::Mileage,
        multiplier: mileage_factor.powf(units),
        description: format!("{mileage} km at x{mileage_factor} per 10,000 km"),
    }
}

pub fn condition_effect(condition: Condition, condition_factor: f64) -> FactorOutcome {
    let base = condition.base_multiplier();
    FactorOutcome {
        kind: FactorKind::Condition,
        multiplier: base * condition_factor,
        description: format!(
            "{} condition (x{base}) with dealer adjustment x{condition_factor}",
            condition.key()
        ),
    }
}

/// Applies provenance, power delta, cooling and trade-in adjustments in that order.
///
/// The power step is binary: any declared lower bound above the catalog power
/// earns the bonus, regardless of how far above it is.
pub fn technical_effect(spec: &TechnicalSpecInput, catalog_power_hp: u32) -> FactorOutcome {
    let mut effect = spec.vehicle_condition.multiplier();
    let mut notes = vec![format!(
        "{} (x{})",
        spec.vehicle_condition.key(),
        spec.vehicle_condition.multiplier()
    )];

    if let Some(range) = spec.engine_power_range {
        let delta = i64::from(range.lower) - i64::from(catalog_power_hp);
        let step = if delta > 0 {
            POWER_ABOVE_CATALOG
        } else {
            POWER_AT_OR_BELOW_CATALOG
        };
        effect *= step;
        notes.push(format!(
            "declared {range} vs catalog {catalog_power_hp} hp (x{step})"
        ));
    }

    if spec.cooling == Some(Cooling::Liquid) {
        effect *= LIQUID_COOLING;
        notes.push(format!("liquid cooled (x{LIQUID_COOLING})"));
    }

    if spec.exchange_available {
        effect *= EXCHANGE_ACCEPTED;
        notes.push(format!("trade-in accepted (x{EXCHANGE_ACCEPTED})"));
    }

    FactorOutcome {
        kind: FactorKind::Technical,
        multiplier: effect,
        description: notes.join(", "),
    }
}

/// Additive equipment scores, averaged so richness is not counted twice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquipmentScores {
    pub safety_total: f64,
    pub accessory_total: f64,
}

impl EquipmentScores {
    pub fn effect(&self) -> f64 {
        (self.safety_total + self.accessory_total) / 2.0
    }
}

pub fn equipment_scores(safety: &SafetyFeatureSet, accessories: &AccessorySet) -> EquipmentScores {
    let safety_total = 1.0 + safety.0.iter().map(|flag| flag.weight()).sum::<f64>();
    let accessory_total = 1.0 + accessories.0.iter().map(|flag| flag.weight()).sum::<f64>();
    EquipmentScores {
        safety_total,
        accessory_total,
    }
}

pub fn equipment_effect(safety: &SafetyFeatureSet, accessories: &AccessorySet) -> FactorOutcome {
    let scores = equipment_scores(safety, accessories);
    let mut description = format!(
        "safety {:.2} ({} flag(s)), accessories {:.2} ({} flag(s)), averaged",
        scores.safety_total,
        safety.0.len(),
        scores.accessory_total,
        accessories.0.len()
    );
    if safety.0.is_empty() && accessories.0.is_empty() {
        description = "no safety features or accessories declared".to_string();
    }

    FactorOutcome {
        kind: FactorKind::Equipment,
        multiplier: scores.effect(),
        description,
    }
}
