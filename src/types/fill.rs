use crate::types::ids::FillId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Result of a successfully executed order.
///
/// `realized_pnl` is pre-fee and only non-zero on sells.
#[derive(Clone, Debug, Serialize)]
pub struct Fill {
    pub fill_id: FillId,
    pub symbol: String,
    pub side: Side,
    pub filled_qty: f64,
    pub filled_price: f64,
    pub fee: f64,
    pub realized_pnl: f64,
    pub timestamp: DateTime<Utc>,
}
