use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::interfaces::Notifier;
use crate::quotes::breaker::{BreakerTransition, CircuitBreaker};
use crate::quotes::providers::{
    AlpacaProvider, AlphaVantageProvider, FinnhubProvider, QuoteProvider, TwelveDataProvider,
    YahooProvider,
};
use std::sync::Arc;

/// A usable price obtained from the cascade, with ask/bid either real or
/// synthesized from the configured spread.
#[derive(Clone, Debug)]
pub struct SourcedPrice {
    pub last: f64,
    pub ask: f64,
    pub bid: f64,
    pub source: String,
}

struct ProviderSlot {
    provider: Box<dyn QuoteProvider>,
    breaker: CircuitBreaker,
}

/// Tries providers in a fixed priority order, each gated by its own
/// circuit breaker. Stops at the first usable price; reports total failure
/// as `None` so provider-specific errors never leak upward.
pub struct QuoteCascade {
    slots: Vec<ProviderSlot>,
    default_spread_pct: f64,
    price_ceiling: f64,
    notifier: Arc<dyn Notifier>,
}

impl QuoteCascade {
    pub fn new(
        providers: Vec<Box<dyn QuoteProvider>>,
        config: &AppConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let slots = providers
            .into_iter()
            .map(|provider| {
                let breaker = CircuitBreaker::from_config(
                    format!("quote_fetch:{}", provider.source_id()),
                    &config.breaker,
                );
                ProviderSlot { provider, breaker }
            })
            .collect();

        QuoteCascade {
            slots,
            default_spread_pct: config.quotes.default_spread_pct,
            price_ceiling: config.quotes.price_ceiling,
            notifier,
        }
    }

    /// Builds the standard cascade in priority order: the low-latency
    /// primary, the keyed REST fallbacks, then the credential-free source.
    pub fn from_config(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.quotes.fetch_timeout())
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        let providers: Vec<Box<dyn QuoteProvider>> = vec![
            Box::new(AlpacaProvider::new(client.clone(), &config.providers.alpaca)),
            Box::new(FinnhubProvider::new(
                client.clone(),
                &config.providers.finnhub,
            )),
            Box::new(TwelveDataProvider::new(
                client.clone(),
                &config.providers.twelvedata,
            )),
            Box::new(AlphaVantageProvider::new(
                client.clone(),
                &config.providers.alphavantage,
            )),
            Box::new(YahooProvider::new(client, &config.providers.yahoo)),
        ];

        Ok(Self::new(providers, config, notifier))
    }

    /// Walks the cascade once. Skipped providers (unconfigured or breaker
    /// open) are not failures; anything else is recorded against the
    /// provider's breaker.
    pub async fn fetch(&self, symbol: &str) -> Option<SourcedPrice> {
        let mut attempted: Vec<&str> = Vec::new();
        let mut failed: Vec<&str> = Vec::new();

        for slot in &self.slots {
            let source = slot.provider.source_id();
            if !slot.provider.is_configured() {
                tracing::debug!(symbol, source, "provider not configured, skipping");
                continue;
            }
            if !slot.breaker.can_proceed() {
                tracing::debug!(symbol, source, "provider breaker open, skipping");
                continue;
            }

            attempted.push(source);
            let sample = slot
                .provider
                .fetch(symbol)
                .await
                .and_then(|s| s.validated(self.price_ceiling));

            match sample {
                Some(sample) => {
                    let half_spread = self.default_spread_pct / 2.0;
                    let ask = sample.ask.unwrap_or(sample.last * (1.0 + half_spread));
                    let bid = sample.bid.unwrap_or(sample.last * (1.0 - half_spread));
                    // A crossed book (real or synthesized) is no data, like
                    // any other unusable payload.
                    if ask < bid {
                        tracing::debug!(symbol, source, ask, bid, "crossed book, no data");
                        failed.push(source);
                        self.report(slot.breaker.record_failure(), source);
                        continue;
                    }
                    self.report(slot.breaker.record_success(), source);
                    tracing::debug!(symbol, source, price = sample.last, "quote fetched");
                    return Some(SourcedPrice {
                        last: sample.last,
                        ask,
                        bid,
                        source: source.to_string(),
                    });
                }
                None => {
                    failed.push(source);
                    self.report(slot.breaker.record_failure(), source);
                }
            }
        }

        tracing::warn!(
            symbol,
            attempted = ?attempted,
            failed = ?failed,
            "all quote sources failed or were skipped"
        );
        None
    }

    pub fn breaker_states(&self) -> Vec<crate::quotes::breaker::BreakerStateInfo> {
        self.slots.iter().map(|s| s.breaker.state_info()).collect()
    }

    fn report(&self, transition: Option<BreakerTransition>, source: &str) {
        if let Some(t) = transition {
            self.notifier.notify(&format!(
                "circuit breaker quote_fetch:{} {} -> {}",
                source, t.from, t.to
            ));
        }
    }
}
