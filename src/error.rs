use thiserror::Error;

/// Closed error taxonomy exposed by the quote cache and execution ledger.
///
/// Provider-level failures (timeouts, HTTP status, parse errors, insane
/// prices) are absorbed inside the adapter cascade and never appear here;
/// adapters report "no data" and the cascade falls through to the next
/// source.
#[derive(Error, Debug)]
pub enum Error {
    // Quote Acquisition Errors
    #[error("no quote available for {symbol}")]
    QuoteUnavailable { symbol: String },

    #[error("quote for {symbol} is stale: {age_secs:.1}s old, max allowed {max_age_secs:.1}s")]
    StaleQuote {
        symbol: String,
        age_secs: f64,
        max_age_secs: f64,
    },

    #[error("circuit breaker '{name}' is open")]
    BreakerOpen { name: String },

    #[error("invalid price for {symbol}: {reason}")]
    InvalidPrice { symbol: String, reason: String },

    // Execution Ledger Errors
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("insufficient cash: need {required:.2}, have {available:.2}")]
    InsufficientCash { required: f64, available: f64 },

    #[error("insufficient position in {symbol}: trying to sell {requested}, have {held}")]
    InsufficientPosition {
        symbol: String,
        requested: f64,
        held: f64,
    },

    // Collaborator Errors
    #[error("fill recording failed: {0}")]
    RecordingFailed(String),

    // System Errors
    #[error("configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
