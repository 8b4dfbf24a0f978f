pub mod config;
pub mod error;
pub mod interfaces;
pub mod observability;
pub mod quotes;
pub mod trading;
pub mod types;

pub use error::{Error, Result};
pub use quotes::cache::{Freshness, QuoteCache};
pub use quotes::cascade::QuoteCascade;
pub use trading::account::PaperAccount;
pub use trading::context::TradeContext;
pub use trading::engine::{TradeSignal, TradingEngine};
pub use types::quote::ValidatedQuote;
