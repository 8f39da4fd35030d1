use serde::{Deserialize, Serialize};

/// Display-oriented explanation of one factor's monetary contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdownEntry {
    pub name: String,
    pub description: String,
    pub effect_display: String,
    pub amount: i64,
}

/// Signed percentage of a multiplier relative to 1.0, e.g. `-15.0%`.
pub fn effect_display(multiplier: f64) -> String {
    percent_display(multiplier - 1.0)
}

pub fn percent_display(fraction: f64) -> String {
    let pct = fraction * 100.0;
    // Avoid "-0.0%" for neutral factors.
    if pct.abs() < 0.05 {
        return "+0.0%".to_string();
    }
    format!("{pct:+.1}%")
}

/// Walks the base price through each factor, recording rounded deltas so the
/// entries telescope back to the final price.
pub(crate) struct PriceWalk {
    price: f64,
    entries: Vec<PriceBreakdownEntry>,
}

impl PriceWalk {
    pub(crate) fn new(base_price: u64) -> Self {
        Self {
            price: base_price as f64,
            entries: Vec::new(),
        }
    }

    pub(crate) fn price(&self) -> f64 {
        self.price
    }

    pub(crate) fn multiply(&mut self, name: &str, description: &str, multiplier: f64) {
        let before = self.price;
        self.price *= multiplier;
        self.record(name, description, effect_display(multiplier), before);
    }

    /// Adds `delta` in currency units; `fraction` is the delta relative to the
    /// price it was derived from, used only for display.
    pub(crate) fn shift(&mut self, name: &str, description: &str, delta: f64, fraction: f64) {
        let before = self.price;
        self.price += delta;
        self.record(name, description, percent_display(fraction), before);
    }

    fn record(&mut self, name: &str, description: &str, effect_display: String, before: f64) {
        let amount = round_currency(self.price) - round_currency(before);
        self.entries.push(PriceBreakdownEntry {
            name: name.to_string(),
            description: description.to_string(),
            effect_display,
            amount,
        });
    }

    pub(crate) fn finish(self) -> Vec<PriceBreakdownEntry> {
        self.entries
    }
}

pub(crate) fn round_currency(value: f64) -> i64 {
    value.round() as i64
}
