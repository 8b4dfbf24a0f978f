use serde::{Deserialize, Serialize};

/// Per-provider credentials and enable flags.
///
/// A provider with missing credentials is inactive: the cascade skips it
/// without counting a failure.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    pub alpaca: AlpacaConfig,
    pub finnhub: KeyedProviderConfig,
    pub twelvedata: KeyedProviderConfig,
    pub alphavantage: KeyedProviderConfig,
    pub yahoo: YahooConfig,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AlpacaConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct KeyedProviderConfig {
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct YahooConfig {
    pub enabled: bool,
}

impl Default for YahooConfig {
    fn default() -> Self {
        // No credentials required, so it is on unless switched off.
        YahooConfig { enabled: true }
    }
}
