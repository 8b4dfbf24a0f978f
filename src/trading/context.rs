use crate::error::Result;
use crate::quotes::cache::{Freshness, QuoteCache};
use crate::types::ids::TradeId;
use crate::types::quote::ValidatedQuote;
use dashmap::DashSet;
use std::sync::Arc;
use std::time::Duration;

/// Scoped quote acquisition for one trade decision and execution.
///
/// The quote handed to the scope is immutable, so sizing, fees and P&L all
/// compute from identical price bits; no re-fetch can happen mid-trade.
/// Acquisition is fresh-only: a trade never runs against a stale quote.
pub struct TradeContext {
    cache: Arc<QuoteCache>,
    max_quote_age: Duration,
    in_flight: DashSet<String>,
}

impl TradeContext {
    pub fn new(cache: Arc<QuoteCache>, max_quote_age: Duration) -> Self {
        TradeContext {
            cache,
            max_quote_age,
            in_flight: DashSet::new(),
        }
    }

    /// Acquires a fresh quote for `symbol` and runs `f` against it. The
    /// in-flight marker is released on every exit path, including errors
    /// raised by `f` or by acquisition itself.
    pub async fn with_quote<T, F>(&self, symbol: &str, f: F) -> Result<T>
    where
        F: FnOnce(&ValidatedQuote) -> Result<T>,
    {
        let trade_id = TradeId::new();
        let _guard = InFlightGuard::acquire(&self.in_flight, symbol, trade_id);

        let quote = self
            .cache
            .get_quote(symbol, self.max_quote_age, Freshness::FreshOnly)
            .await?;
        tracing::info!(
            %trade_id,
            symbol,
            price = quote.last_price(),
            age_secs = quote.age().as_secs_f64(),
            sequence = quote.sequence(),
            source = quote.source(),
            "trade context acquired quote"
        );

        f(&quote)
    }

    #[cfg(test)]
    fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

struct InFlightGuard<'a> {
    markers: &'a DashSet<String>,
    symbol: String,
    trade_id: TradeId,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(markers: &'a DashSet<String>, symbol: &str, trade_id: TradeId) -> Self {
        markers.insert(symbol.to_string());
        tracing::debug!(%trade_id, symbol, "trade context locked");
        InFlightGuard {
            markers,
            symbol: symbol.to_string(),
            trade_id,
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.markers.remove(&self.symbol);
        tracing::debug!(trade_id = %self.trade_id, symbol = %self.symbol, "trade context released");
    }
}
