use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::interfaces::Notifier;
use crate::quotes::breaker::{BreakerTransition, CircuitBreaker};
use crate::quotes::cascade::QuoteCascade;
use crate::types::quote::ValidatedQuote;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::Instrument;

/// How a caller treats a cache entry older than its freshness bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Trade paths: a stale quote is an error, never a fallback.
    FreshOnly,
    /// Tolerant paths: degrade to the last-known-good quote when every
    /// provider is down, tagged with its true age.
    AllowStale,
}

/// Counters for offline-behavior monitoring.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheMetrics {
    pub fresh_hits: u64,
    pub stale_hits: u64,
    pub fetch_successes: u64,
    pub fetch_failures: u64,
    pub max_stale_age_secs: u64,
    pub cached_symbols: usize,
}

#[derive(Default)]
struct MetricCounters {
    fresh_hits: AtomicU64,
    stale_hits: AtomicU64,
    fetch_successes: AtomicU64,
    fetch_failures: AtomicU64,
    max_stale_age_secs: AtomicU64,
}

/// Last-known-good quote per symbol, plus the fallback orchestration:
/// fresh cache -> adapter cascade -> stale cache (tolerant callers only).
///
/// The per-symbol entry lock covers only the in-memory check-and-swap;
/// the fetch happens with no lock held, and installation is ordered by
/// sequence number so a slow stale fetch can never clobber a newer quote.
pub struct QuoteCache {
    cascade: QuoteCascade,
    entries: DashMap<String, ValidatedQuote>,
    sequence: AtomicU64,
    fetch_breaker: CircuitBreaker,
    price_ceiling: f64,
    metrics: MetricCounters,
    notifier: Arc<dyn Notifier>,
}

impl QuoteCache {
    pub fn new(cascade: QuoteCascade, config: &AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        QuoteCache {
            cascade,
            entries: DashMap::new(),
            sequence: AtomicU64::new(0),
            fetch_breaker: CircuitBreaker::from_config("quote_fetch", &config.breaker),
            price_ceiling: config.quotes.price_ceiling,
            metrics: MetricCounters::default(),
            notifier,
        }
    }

    /// Returns a quote no older than `max_age`. When every provider fails,
    /// `AllowStale` callers get the last-known-good quote at its true age
    /// instead of an error.
    pub async fn get_quote(
        &self,
        symbol: &str,
        max_age: Duration,
        freshness: Freshness,
    ) -> Result<ValidatedQuote> {
        // Fast path: clone out and release the shard before any I/O.
        let cached = self.entries.get(symbol).map(|e| e.value().clone());
        if let Some(quote) = &cached {
            if !quote.is_stale(max_age) {
                self.metrics.fresh_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(quote.clone());
            }
        }

        let mut breaker_open = false;
        if self.fetch_breaker.can_proceed() {
            let fetched = self
                .cascade
                .fetch(symbol)
                .instrument(crate::observability::quote_fetch_span(symbol))
                .await;
            // A fetched price that fails record validation counts exactly
            // like a failed fetch; it never reaches the caller.
            let quote = fetched.and_then(|priced| {
                match ValidatedQuote::new(
                    symbol,
                    priced.last,
                    priced.ask,
                    priced.bid,
                    Utc::now(),
                    priced.source,
                    self.next_sequence(),
                    self.price_ceiling,
                ) {
                    Ok(quote) => Some(quote),
                    Err(e) => {
                        tracing::debug!(symbol, error = %e, "fetched quote failed validation");
                        None
                    }
                }
            });
            match quote {
                Some(quote) => {
                    self.report(self.fetch_breaker.record_success());
                    self.metrics.fetch_successes.fetch_add(1, Ordering::Relaxed);
                    return Ok(self.install(quote));
                }
                None => {
                    self.report(self.fetch_breaker.record_failure());
                    self.metrics.fetch_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        } else {
            breaker_open = true;
            tracing::debug!(symbol, "fetch breaker open, skipping cascade");
        }

        match (freshness, cached) {
            (Freshness::AllowStale, Some(quote)) => {
                let age_secs = quote.age().as_secs();
                self.metrics.stale_hits.fetch_add(1, Ordering::Relaxed);
                self.metrics
                    .max_stale_age_secs
                    .fetch_max(age_secs, Ordering::Relaxed);
                tracing::debug!(symbol, age_secs, "offline: serving stale cache");
                Ok(quote)
            }
            (Freshness::FreshOnly, Some(quote)) => Err(Error::StaleQuote {
                symbol: symbol.to_string(),
                age_secs: quote.age().as_secs_f64(),
                max_age_secs: max_age.as_secs_f64(),
            }),
            (_, None) => {
                if breaker_open {
                    Err(Error::BreakerOpen {
                        name: "quote_fetch".to_string(),
                    })
                } else {
                    Err(Error::QuoteUnavailable {
                        symbol: symbol.to_string(),
                    })
                }
            }
        }
    }

    pub fn metrics(&self) -> CacheMetrics {
        CacheMetrics {
            fresh_hits: self.metrics.fresh_hits.load(Ordering::Relaxed),
            stale_hits: self.metrics.stale_hits.load(Ordering::Relaxed),
            fetch_successes: self.metrics.fetch_successes.load(Ordering::Relaxed),
            fetch_failures: self.metrics.fetch_failures.load(Ordering::Relaxed),
            max_stale_age_secs: self.metrics.max_stale_age_secs.load(Ordering::Relaxed),
            cached_symbols: self.entries.len(),
        }
    }

    pub fn cascade(&self) -> &QuoteCascade {
        &self.cascade
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn report(&self, transition: Option<BreakerTransition>) {
        if let Some(t) = transition {
            self.notifier.notify(&format!(
                "circuit breaker {} {} -> {}",
                self.fetch_breaker.name(),
                t.from,
                t.to
            ));
        }
    }

    /// Highest sequence wins: a concurrently installed newer quote is kept
    /// and returned instead of the candidate.
    fn install(&self, quote: ValidatedQuote) -> ValidatedQuote {
        match self.entries.entry(quote.symbol().to_string()) {
            Entry::Occupied(mut occupied) => {
                if quote.sequence() > occupied.get().sequence() {
                    occupied.insert(quote.clone());
                    quote
                } else {
                    occupied.get().clone()
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(quote.clone());
                quote
            }
        }
    }
}
