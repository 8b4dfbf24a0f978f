pub mod breaker;
pub mod loader;
pub mod providers;
pub mod quotes;
pub mod trading;

pub use breaker::BreakerConfig;
pub use loader::AppConfig;
pub use providers::ProvidersConfig;
pub use quotes::QuotesConfig;
pub use trading::TradingConfig;
