use crate::config::providers::KeyedProviderConfig;
use crate::quotes::providers::{PriceSample, QuoteProvider, normalize_symbol};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";

/// REST fallback. Returns the price as a decimal string.
pub struct TwelveDataProvider {
    source_id: String,
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl TwelveDataProvider {
    pub fn new(client: Client, config: &KeyedProviderConfig) -> Self {
        TwelveDataProvider {
            source_id: "twelvedata".to_string(),
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
impl QuoteProvider for TwelveDataProvider {
    async fn fetch(&self, symbol: &str) -> Option<PriceSample> {
        let key = self.api_key.as_ref()?;

        let response = match self
            .client
            .get(format!("{}/price", self.base_url))
            .query(&[("symbol", normalize_symbol(symbol)), ("apikey", key.clone())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "twelvedata request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(symbol, status = %response.status(), "twelvedata returned error status");
            return None;
        }

        let body: TwelveDataPrice = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "twelvedata parse failed");
                return None;
            }
        };
        let price: f64 = match body.price.as_deref().map(str::parse) {
            Some(Ok(p)) => p,
            _ => {
                tracing::debug!(symbol, "twelvedata response missing usable price");
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
struct TwelveDataPrice {
    #[serde(default)]
    price: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> TwelveDataProvider {
        TwelveDataProvider::new(
            Client::new(),
            &KeyedProviderConfig {
                api_key: Some("key".into()),
            },
        )
        .with_base_url(base_url)
    }

    #[tokio::test]
    async fn parses_price_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/price"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"price": "421.37"})),
            )
            .mount(&server)
            .await;

        let sample = provider(&server.uri()).fetch("MSFT").await.unwrap();
        assert_eq!(sample, PriceSample::last_only(421.37));
    }

    #[tokio::test]
    async fn unparsable_price_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"price": "not-a-number"})),
            )
            .mount(&server)
            .await;

        assert!(provider(&server.uri()).fetch("MSFT").await.is_none());
    }
}
