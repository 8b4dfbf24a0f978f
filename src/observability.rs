use crate::types::fill::Side;
use tracing::Span;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber, honoring `RUST_LOG` when set.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn quote_fetch_span(symbol: &str) -> Span {
    tracing::info_span!("quote_fetch", symbol = %symbol)
}

pub fn order_span(symbol: &str, side: Side) -> Span {
    tracing::info_span!("order_submission", symbol = %symbol, side = %side)
}
