use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Immutable, validated price observation for one symbol at one instant.
///
/// All fields are private and there are no mutators: once constructed a
/// quote can only be superseded in the cache by a record with a higher
/// sequence number, never edited in place. Validation happens once, at
/// construction, so downstream consumers never re-check price sanity.
#[derive(Clone, Debug, Serialize)]
pub struct ValidatedQuote {
    symbol: String,
    last_price: f64,
    ask_price: f64,
    bid_price: f64,
    timestamp: DateTime<Utc>,
    source: String,
    sequence: u64,
}

impl ValidatedQuote {
    pub fn new(
        symbol: impl Into<String>,
        last_price: f64,
        ask_price: f64,
        bid_price: f64,
        timestamp: DateTime<Utc>,
        source: impl Into<String>,
        sequence: u64,
        price_ceiling: f64,
    ) -> Result<Self> {
        let symbol = symbol.into();
        for (name, value) in [
            ("last_price", last_price),
            ("ask_price", ask_price),
            ("bid_price", bid_price),
        ] {
            if !value.is_finite() || value <= 0.0 || value > price_ceiling {
                return Err(Error::InvalidPrice {
                    symbol,
                    reason: format!("{} = {}", name, value),
                });
            }
        }
        if ask_price < bid_price {
            return Err(Error::InvalidPrice {
                symbol,
                reason: format!("ask {} below bid {}", ask_price, bid_price),
            });
        }

        Ok(ValidatedQuote {
            symbol,
            last_price,
            ask_price,
            bid_price,
            timestamp,
            source: source.into(),
            sequence,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn last_price(&self) -> f64 {
        self.last_price
    }

    pub fn ask_price(&self) -> f64 {
        self.ask_price
    }

    pub fn bid_price(&self) -> f64 {
        self.bid_price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn mid_price(&self) -> f64 {
        (self.ask_price + self.bid_price) / 2.0
    }

    /// Bid/ask spread in basis points of the mid price.
    pub fn spread_bps(&self) -> f64 {
        (self.ask_price - self.bid_price) / self.mid_price() * 10_000.0
    }

    /// Age relative to now. A timestamp in the future reads as zero age.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.timestamp).to_std().unwrap_or_default()
    }

    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CEILING: f64 = 1e10;

    fn quote(last: f64, ask: f64, bid: f64) -> Result<ValidatedQuote> {
        ValidatedQuote::new("AAPL", last, ask, bid, Utc::now(), "test", 1, CEILING)
    }

    #[test]
    fn accepts_sane_prices() {
        let q = quote(100.0, 100.05, 99.95).unwrap();
        assert_eq!(q.symbol(), "AAPL");
        assert!((q.mid_price() - 100.0).abs() < 1e-9);
        assert!((q.spread_bps() - 10.0).abs() < 1e-6);
        assert!(!q.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn rejects_non_positive_and_non_finite() {
        assert!(quote(0.0, 100.0, 100.0).is_err());
        assert!(quote(-5.0, 100.0, 100.0).is_err());
        assert!(quote(f64::NAN, 100.0, 100.0).is_err());
        assert!(quote(100.0, f64::INFINITY, 100.0).is_err());
        assert!(quote(100.0, 100.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn rejects_prices_above_ceiling() {
        assert!(quote(1e11, 100.0, 100.0).is_err());
        assert!(quote(100.0, 2e10, 100.0).is_err());
    }

    #[test]
    fn rejects_crossed_book() {
        assert!(quote(100.0, 99.0, 101.0).is_err());
    }

    #[test]
    fn age_tracks_timestamp() {
        let old = Utc::now() - chrono::Duration::seconds(70);
        let q = ValidatedQuote::new("SPY", 450.0, 450.1, 449.9, old, "test", 1, CEILING).unwrap();
        assert!(q.age() >= Duration::from_secs(70));
        assert!(q.is_stale(Duration::from_secs(60)));
    }

    proptest! {
        #[test]
        fn never_constructs_from_insane_last_price(
            last in prop_oneof![
                Just(f64::NAN),
                Just(f64::INFINITY),
                Just(f64::NEG_INFINITY),
                Just(0.0),
                -1e12..=0.0,
                (1e10 + 1.0)..1e300,
            ]
        ) {
            prop_assert!(quote(last, 100.0, 100.0).is_err());
        }

        #[test]
        fn always_constructs_from_sane_prices(price in 0.0001f64..1e9) {
            let q = quote(price, price, price).unwrap();
            prop_assert_eq!(q.last_price(), price);
        }
    }
}
