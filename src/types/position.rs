use serde::{Deserialize, Serialize};

/// Long-only position with a running weighted-average cost basis.
///
/// `avg_price` is only meaningful while `quantity > 0`; the ledger removes
/// a position from the account instead of keeping it at zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: f64,
    pub avg_price: f64,
}

impl Position {
    pub fn new(quantity: f64, avg_price: f64) -> Self {
        Position {
            quantity,
            avg_price,
        }
    }

    /// Market value at the given mark price.
    pub fn market_value(&self, mark_price: f64) -> f64 {
        self.quantity * mark_price
    }
}
