pub mod account;
pub mod context;
pub mod engine;

pub use account::{AccountSnapshot, PaperAccount};
pub use context::TradeContext;
pub use engine::{TradeSignal, TradingEngine};
