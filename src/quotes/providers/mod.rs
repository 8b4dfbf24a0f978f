pub mod alpaca;
pub mod alphavantage;
pub mod finnhub;
pub mod twelvedata;
pub mod yahoo;

use async_trait::async_trait;

pub use alpaca::AlpacaProvider;
pub use alphavantage::AlphaVantageProvider;
pub use finnhub::FinnhubProvider;
pub use twelvedata::TwelveDataProvider;
pub use yahoo::YahooProvider;

/// One raw price observation from a provider, before synthesis/validation
/// by the cascade. Providers that only publish a last price leave bid/ask
/// empty.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceSample {
    pub last: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

impl PriceSample {
    pub fn last_only(last: f64) -> Self {
        PriceSample {
            last,
            bid: None,
            ask: None,
        }
    }

    /// Drops the sample unless every present price is finite, strictly
    /// positive and at or below the sanity ceiling. An insane price is
    /// exactly "no data", never propagated.
    pub fn validated(self, price_ceiling: f64) -> Option<Self> {
        sane_price(self.last, price_ceiling)?;
        if let Some(bid) = self.bid {
            sane_price(bid, price_ceiling)?;
        }
        if let Some(ask) = self.ask {
            sane_price(ask, price_ceiling)?;
        }
        Some(self)
    }
}

pub(crate) fn sane_price(value: f64, price_ceiling: f64) -> Option<f64> {
    if value.is_finite() && value > 0.0 && value <= price_ceiling {
        Some(value)
    } else {
        None
    }
}

/// One external market-data source, normalized to a common shape.
///
/// `fetch` performs exactly one bounded-timeout request. Every failure mode
/// (timeout, HTTP status including rate limits, parse error, insane price)
/// returns `None`; the cascade records it against this provider's breaker.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Option<PriceSample>;

    fn source_id(&self) -> &str;

    /// Providers without credentials are skipped by the cascade, not failed.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Keyed providers take the symbol without the dash ("BTC-USD" -> "BTCUSD").
pub(crate) fn normalize_symbol(symbol: &str) -> String {
    symbol.replace('-', "")
}
