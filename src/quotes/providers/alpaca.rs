use crate::config::providers::AlpacaConfig;
use crate::quotes::providers::{PriceSample, QuoteProvider, normalize_symbol, sane_price};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

const DEFAULT_BASE_URL: &str = "https://data.alpaca.markets";

/// Primary source: low-latency, publishes real bid/ask/last.
pub struct AlpacaProvider {
    source_id: String,
    client: Client,
    base_url: String,
    enabled: bool,
    api_key: Option<String>,
    api_secret: Option<String>,
}

impl AlpacaProvider {
    pub fn new(client: Client, config: &AlpacaConfig) -> Self {
        AlpacaProvider {
            source_id: "alpaca".to_string(),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            enabled: config.enabled,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn is_crypto(symbol: &str) -> bool {
        symbol.contains("USD") && symbol.len() <= 8
    }

    fn sample_from(quote: &AlpacaQuote) -> Option<PriceSample> {
        // Any of last/ask/bid may be missing; fall back across them the
        // way the ask/bid synthesis expects.
        let last = quote.lp.or(quote.ap).or(quote.bp)?;
        sane_price(last, f64::MAX)?;
        Some(PriceSample {
            last,
            bid: quote.bp,
            ask: quote.ap,
        })
    }
}

#[async_trait]
impl QuoteProvider for AlpacaProvider {
    async fn fetch(&self, symbol: &str) -> Option<PriceSample> {
        let (key, secret) = match (&self.api_key, &self.api_secret) {
            (Some(k), Some(s)) => (k, s),
            _ => return None,
        };
        let normalized = normalize_symbol(symbol);

        let request = if Self::is_crypto(&normalized) {
            self.client
                .get(format!("{}/v1beta3/crypto/latest/quotes", self.base_url))
                .query(&[("symbols", normalized.as_str())])
        } else {
            self.client.get(format!(
                "{}/v2/stocks/{}/quotes/latest",
                self.base_url, normalized
            ))
        };

        let response = match request
            .header("APCA-API-KEY-ID", key)
            .header("APCA-API-SECRET-KEY", secret)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "alpaca request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(symbol, status = %response.status(), "alpaca returned error status");
            return None;
        }

        if Self::is_crypto(&normalized) {
            let body: AlpacaCryptoResponse = match response.json().await {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!(symbol, error = %e, "alpaca crypto parse failed");
                    return None;
                }
            };
            body.quotes.get(&normalized).and_then(Self::sample_from)
        } else {
            let body: AlpacaStockResponse = match response.json().await {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!(symbol, error = %e, "alpaca stock parse failed");
                    return None;
                }
            };
            Self::sample_from(&body.quote)
        }
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn is_configured(&self) -> bool {
        self.enabled && self.api_key.is_some() && self.api_secret.is_some()
    }
}

#[derive(Deserialize)]
struct AlpacaCryptoResponse {
    quotes: HashMap<String, AlpacaQuote>,
}

#[derive(Deserialize)]
struct AlpacaStockResponse {
    quote: AlpacaQuote,
}

#[derive(Deserialize)]
struct AlpacaQuote {
    #[serde(default)]
    ap: Option<f64>, // Ask price
    #[serde(default)]
    bp: Option<f64>, // Bid price
    #[serde(default)]
    lp: Option<f64>, // Last price
}
