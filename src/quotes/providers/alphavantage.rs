use crate::config::providers::KeyedProviderConfig;
use crate::quotes::providers::{PriceSample, QuoteProvider, normalize_symbol};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Free-tier REST fallback with aggressive rate limits. Throttle responses
/// arrive as 200s carrying a "Note"/"Information" payload instead of a
/// quote; they count as no data like any other failure.
pub struct AlphaVantageProvider {
    source_id: String,
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaVantageProvider {
    pub fn new(client: Client, config: &KeyedProviderConfig) -> Self {
        AlphaVantageProvider {
            source_id: "alphavantage".to_string(),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    async fn fetch(&self, symbol: &str) -> Option<PriceSample> {
        let key = self.api_key.as_ref()?;

        let response = match self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("function", "GLOBAL_QUOTE".to_string()),
                ("symbol", normalize_symbol(symbol)),
                ("apikey", key.clone()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "alphavantage request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(symbol, status = %response.status(), "alphavantage returned error status");
            return None;
        }

        let body: AlphaVantageResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "alphavantage parse failed");
                return None;
            }
        };
        if let Some(note) = body.note.or(body.information) {
            tracing::debug!(symbol, note = %note, "alphavantage throttled request");
            return None;
        }

        let price: f64 = match body
            .global_quote
            .and_then(|q| q.price)
            .as_deref()
            .map(str::parse)
        {
            Some(Ok(p)) => p,
            _ => {
                tracing::debug!(symbol, "alphavantage response missing usable price");
                return None;
            }
        };
        Some(PriceSample::last_only(price))
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Deserialize)]
struct AlphaVantageResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}
