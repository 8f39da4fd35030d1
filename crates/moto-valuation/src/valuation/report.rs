use std::fmt::Write as _;

use serde::Serialize;

use super::domain::{DamageReport, VehicleRecord};
use super::market::BlendedEstimate;
use super::pricing::{assess_damage, CalculationResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorRow {
    pub name: String,
    pub description: String,
    pub effect: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageRow {
    pub part: &'static str,
    pub status: String,
    pub weight_pct: f64,
    pub impact_pct: f64,
}

/// Render-ready view of a valuation for screen and print output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationReport {
    pub headline: String,
    pub category: String,
    pub base_price: u64,
    pub final_price: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_average: Option<u64>,
    pub displayed_estimate: u64,
    pub factor_rows: Vec<FactorRow>,
    pub damage_rows: Vec<DamageRow>,
}

impl ValuationReport {
    pub fn build(
        vehicle: &VehicleRecord,
        damage: &DamageReport,
        result: &CalculationResult,
        estimate: &BlendedEstimate,
    ) -> Self {
        let factor_rows = result
            .breakdown
            .iter()
            .map(|entry| FactorRow {
                name: entry.name.clone(),
                description: entry.description.clone(),
                effect: entry.effect_display.clone(),
                amount: entry.amount,
            })
            .collect();

        let damage_rows = assess_damage(damage)
            .parts
            .into_iter()
            .map(|impact| DamageRow {
                part: impact.part.label(),
                status: impact.condition.status_label(),
                weight_pct: round_pct(impact.weight * 100.0),
                impact_pct: round_pct(impact.impact() * 100.0),
            })
            .collect();

        Self {
            headline: vehicle.headline(),
            category: vehicle.category.clone(),
            base_price: vehicle.base_price,
            final_price: result.final_price,
            market_average: estimate.market_average,
            displayed_estimate: estimate.displayed_estimate,
            factor_rows,
            damage_rows,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Valuation report: {} [{}]", self.headline, self.category);
        let _ = writeln!(out, "Base price: {}", self.base_price);

        let _ = writeln!(out, "\nPrice factors");
        for row in &self.factor_rows {
            let _ = writeln!(
                out,
                "- {:<28} {:>8} {:>+12}  {}",
                row.name, row.effect, row.amount, row.description
            );
        }

        let _ = writeln!(out, "\nDamage inspection");
        for row in &self.damage_rows {
            let _ = writeln!(
                out,
                "- {:<14} {:<22} weight {:>5.1}%  impact {:>6.1}%",
                row.part, row.status, row.weight_pct, row.impact_pct
            );
        }

        let _ = writeln!(out, "\nAlgorithm result: {}", self.final_price);
        match self.market_average {
            Some(average) => {
                let _ = writeln!(out, "Market average: {}", average);
            }
            None => {
                let _ = writeln!(out, "Market average: unavailable");
            }
        }
        let _ = write!(out, "Estimated price: {}", self.displayed_estimate);
        out
    }
}

fn round_pct(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
