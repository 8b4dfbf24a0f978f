use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QuotesConfig {
    /// Freshness bound for tolerant (non-trade) callers.
    pub max_quote_age_secs: u64,
    /// Hard freshness bound inside the atomic trade context.
    pub trade_max_quote_age_secs: u64,
    /// Per-request timeout for every provider fetch.
    pub fetch_timeout_secs: u64,
    /// Synthetic spread applied when a provider returns only a last price.
    pub default_spread_pct: f64,
    /// Prices above this are treated as no data.
    pub price_ceiling: f64,
}

impl QuotesConfig {
    pub fn max_quote_age(&self) -> Duration {
        Duration::from_secs(self.max_quote_age_secs)
    }

    pub fn trade_max_quote_age(&self) -> Duration {
        Duration::from_secs(self.trade_max_quote_age_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for QuotesConfig {
    fn default() -> Self {
        QuotesConfig {
            max_quote_age_secs: 60,
            trade_max_quote_age_secs: 10,
            fetch_timeout_secs: 5,
            default_spread_pct: 0.0005, // 5 bps
            price_ceiling: 1e10,
        }
    }
}
