use serde::{Deserialize, Serialize};

/// A comparable listing observed in the market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparableListing {
    pub price: u64,
    pub mileage: u64,
    pub year: i32,
}

/// Rounded mean listing price, `None` without comparables.
pub fn market_average(listings: &[ComparableListing]) -> Option<u64> {
    if listings.is_empty() {
        return None;
    }
    let total: u128 = listings.iter().map(|listing| u128::from(listing.price)).sum();
    let count = listings.len() as u128;
    Some(((total + count / 2) / count) as u64)
}

/// Estimate shown to the user after hedging against the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendedEstimate {
    pub algorithm_result: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_average: Option<u64>,
    pub displayed_estimate: u64,
}

impl BlendedEstimate {
    pub fn is_blended(&self) -> bool {
        self.market_average.is_some()
    }
}

/// Unweighted mean of the algorithm result and the market average.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketBlender;

impl MarketBlender {
    pub fn blend(&self, algorithm_result: u64, market_average: Option<u64>) -> BlendedEstimate {
        let displayed_estimate = match market_average {
            Some(average) => {
                let sum = u128::from(average) + u128::from(algorithm_result);
                // Round half up; both operands are whole currency units.
                ((sum + 1) / 2) as u64
            }
            None => algorithm_result,
        };

        BlendedEstimate {
            algorithm_result,
            market_average,
            displayed_estimate,
        }
    }
}
