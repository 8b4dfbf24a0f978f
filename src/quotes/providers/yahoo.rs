use crate::config::providers::YahooConfig;
use crate::quotes::providers::{PriceSample, QuoteProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Last-resort source: no credentials required, always eligible unless
/// switched off. Data may lag for some instrument types.
pub struct YahooProvider {
    source_id: String,
    client: Client,
    base_url: String,
    enabled: bool,
}

impl YahooProvider {
    pub fn new(client: Client, config: &YahooConfig) -> Self {
        YahooProvider {
            source_id: "yahoo".to_string(),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            enabled: config.enabled,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    async fn fetch(&self, symbol: &str) -> Option<PriceSample> {
        // Yahoo takes symbols verbatim, dashes included ("BTC-USD").
        let response = match self
            .client
            .get(format!("{}/v8/finance/chart/{}", self.base_url, symbol))
            .query(&[("range", "1d"), ("interval", "1h")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "yahoo request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(symbol, status = %response.status(), "yahoo returned error status");
            return None;
        }

        let body: ChartResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "yahoo parse failed");
                return None;
            }
        };
        body.chart
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|r| r.meta.regular_market_price)
            .map(PriceSample::last_only)
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn is_configured(&self) -> bool {
        self.enabled
    }
}

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> YahooProvider {
        YahooProvider::new(Client::new(), &YahooConfig { enabled: true }).with_base_url(base_url)
    }

    #[tokio::test]
    async fn parses_regular_market_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/BTC-USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chart": { "result": [ { "meta": { "regularMarketPrice": 64123.5 } } ], "error": null }
            })))
            .mount(&server)
            .await;

        let sample = provider(&server.uri()).fetch("BTC-USD").await.unwrap();
        assert_eq!(sample, PriceSample::last_only(64123.5));
    }

    #[tokio::test]
    async fn empty_result_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chart": { "result": null, "error": { "code": "Not Found" } }
            })))
            .mount(&server)
            .await;

        assert!(provider(&server.uri()).fetch("NOPE").await.is_none());
    }

    #[test]
    fn disabled_is_unconfigured() {
        let p = YahooProvider::new(Client::new(), &YahooConfig { enabled: false });
        assert!(!p.is_configured());
    }
}
