pub mod breaker;
pub mod cache;
pub mod cascade;
pub mod providers;

pub use breaker::{BreakerState, BreakerTransition, CircuitBreaker};
pub use cache::{Freshness, QuoteCache};
pub use cascade::QuoteCascade;
