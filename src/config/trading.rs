use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TradingConfig {
    pub starting_cash: f64,
    pub fee_rate: f64,
    pub min_quantity: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        TradingConfig {
            starting_cash: 100_000.0,
            fee_rate: 0.0002, // 2 bps per trade
            min_quantity: 1e-6,
        }
    }
}
