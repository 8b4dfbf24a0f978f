use crate::config::breaker::BreakerConfig;
use crate::config::providers::ProvidersConfig;
use crate::config::quotes::QuotesConfig;
use crate::config::trading::TradingConfig;
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub quotes: QuotesConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub trading: TradingConfig,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("TRADECORE").separator("__"))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))
    }
}
