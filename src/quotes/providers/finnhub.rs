use crate::config::providers::KeyedProviderConfig;
use crate::quotes::providers::{PriceSample, QuoteProvider, normalize_symbol};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://finnhub.io";

/// REST fallback. Publishes a last price only (`c`); the cascade
/// synthesizes bid/ask.
pub struct FinnhubProvider {
    source_id: String,
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FinnhubProvider {
    pub fn new(client: Client, config: &KeyedProviderConfig) -> Self {
        FinnhubProvider {
            source_id: "finnhub".to_string(),
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
impl QuoteProvider for FinnhubProvider {
    async fn fetch(&self, symbol: &str) -> Option<PriceSample> {
        let token = self.api_key.as_ref()?;

        let response = match self
            .client
            .get(format!("{}/api/v1/quote", self.base_url))
            .query(&[("symbol", normalize_symbol(symbol)), ("token", token.clone())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "finnhub request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            // Rate limits (429) land here too, by policy counted like any
            // other failure.
            tracing::debug!(symbol, status = %response.status(), "finnhub returned error status");
            return None;
        }

        let body: FinnhubQuote = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "finnhub parse failed");
                return None;
            }
        };
        body.c.map(PriceSample::last_only)
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Deserialize)]
struct FinnhubQuote {
    #[serde(default)]
    c: Option<f64>, // Current price
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> FinnhubProvider {
        FinnhubProvider::new(
            Client::new(),
            &KeyedProviderConfig {
                api_key: Some("token".into()),
            },
        )
        .with_base_url(base_url)
    }

    #[tokio::test]
    async fn parses_current_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/quote"))
            .and(query_param("symbol", "AAPL"))
            .and(query_param("token", "token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "c": 187.4, "h": 188.0, "l": 186.2, "o": 186.9, "pc": 186.5
            })))
            .mount(&server)
            .await;

        let sample = provider(&server.uri()).fetch("AAPL").await.unwrap();
        assert_eq!(sample, PriceSample::last_only(187.4));
    }

    #[tokio::test]
    async fn missing_price_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        assert!(provider(&server.uri()).fetch("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn rate_limit_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        assert!(provider(&server.uri()).fetch("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn timeout_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"c": 1.0}))
                    .set_delay(std::time::Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(50))
            .build()
            .unwrap();
        let p = FinnhubProvider::new(
            client,
            &KeyedProviderConfig {
                api_key: Some("token".into()),
            },
        )
        .with_base_url(server.uri());
        assert!(p.fetch("AAPL").await.is_none());
    }
}
