use crate::config::TradingConfig;
use crate::error::{Error, Result};
use crate::interfaces::FillRecorder;
use crate::types::fill::{Fill, Side};
use crate::types::ids::FillId;
use crate::types::position::Position;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Residual quantity below this is treated as a closed position.
const QTY_TOLERANCE: f64 = 1e-6;

/// Point-in-time copy of the account, handed to the fill recorder before
/// and after each mutation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub cash: f64,
    pub positions: HashMap<String, Position>,
    #[serde(skip)]
    pub taken_at: DateTime<Utc>,
}

/// Execution ledger for one account: cash plus a long-only position map.
///
/// Buy/sell are non-commutative on shared cash, so callers serialize
/// `submit_order` (one executor per account, or an external lock). All
/// inputs are validated before any mutation: a rejected order leaves the
/// account untouched.
pub struct PaperAccount {
    cash: f64,
    positions: HashMap<String, Position>,
    fee_rate: f64,
    min_quantity: f64,
    recorder: Arc<dyn FillRecorder>,
}

impl PaperAccount {
    pub fn new(config: &TradingConfig, recorder: Arc<dyn FillRecorder>) -> Self {
        PaperAccount {
            cash: config.starting_cash,
            positions: HashMap::new(),
            fee_rate: config.fee_rate,
            min_quantity: config.min_quantity,
            recorder,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self, symbol: &str) -> Option<Position> {
        self.positions.get(symbol).copied()
    }

    pub fn positions(&self) -> &HashMap<String, Position> {
        &self.positions
    }

    /// Cash plus the market value of every position at the supplied marks.
    /// Positions without a mark contribute nothing.
    pub fn equity(&self, marks: &HashMap<String, f64>) -> f64 {
        let positions_value: f64 = self
            .positions
            .iter()
            .filter_map(|(symbol, pos)| marks.get(symbol).map(|mark| pos.market_value(*mark)))
            .sum();
        self.cash + positions_value
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            cash: self.cash,
            positions: self.positions.clone(),
            taken_at: Utc::now(),
        }
    }

    pub fn submit_order(
        &mut self,
        symbol: &str,
        side: Side,
        quantity: f64,
        price: f64,
    ) -> Result<Fill> {
        let _span = crate::observability::order_span(symbol, side).entered();

        // Everything is validated before any state is touched.
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(Error::InvalidOrder(format!(
                "quantity must be positive and finite, got {}",
                quantity
            )));
        }
        if quantity < self.min_quantity {
            return Err(Error::InvalidOrder(format!(
                "quantity {} below minimum {}",
                quantity, self.min_quantity
            )));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::InvalidOrder(format!(
                "price must be positive and finite, got {}",
                price
            )));
        }

        let before = self.snapshot();
        let fee = (quantity * price).abs() * self.fee_rate;

        let realized_pnl = match side {
            Side::Buy => {
                let cost = quantity * price + fee;
                if cost > self.cash {
                    return Err(Error::InsufficientCash {
                        required: cost,
                        available: self.cash,
                    });
                }
                self.cash -= cost;
                let position = self
                    .positions
                    .entry(symbol.to_string())
                    .or_insert(Position::new(0.0, price));
                let total_cost = position.quantity * position.avg_price + quantity * price;
                position.quantity += quantity;
                position.avg_price = total_cost / position.quantity;
                0.0
            }
            Side::Sell => {
                let held = self.positions.get(symbol).copied().unwrap_or(Position::new(0.0, 0.0));
                if quantity > held.quantity + QTY_TOLERANCE {
                    return Err(Error::InsufficientPosition {
                        symbol: symbol.to_string(),
                        requested: quantity,
                        held: held.quantity,
                    });
                }
                let realized = (price - held.avg_price) * quantity;
                self.cash += quantity * price - fee;
                let remaining = held.quantity - quantity;
                if remaining <= QTY_TOLERANCE {
                    self.positions.remove(symbol);
                } else {
                    self.positions
                        .insert(symbol.to_string(), Position::new(remaining, held.avg_price));
                }
                realized
            }
        };

        let fill = Fill {
            fill_id: FillId::new(),
            symbol: symbol.to_string(),
            side,
            filled_qty: quantity,
            filled_price: price,
            fee,
            realized_pnl,
            timestamp: Utc::now(),
        };

        // The in-memory mutation already happened; a recorder failure is
        // logged and must not undo it or fail the order.
        if let Err(e) = self.recorder.record_fill(&fill, &before, &self.snapshot()) {
            tracing::warn!(symbol, fill_id = %fill.fill_id, error = %e, "fill recording failed");
        }

        tracing::info!(
            symbol,
            side = %side,
            qty = quantity,
            price,
            fee,
            realized_pnl,
            cash = self.cash,
            "order filled"
        );
        Ok(fill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::LogFillRecorder;

    fn account(starting_cash: f64) -> PaperAccount {
        PaperAccount::new(
            &TradingConfig {
                starting_cash,
                fee_rate: 0.0002,
                min_quantity: 1e-6,
            },
            Arc::new(LogFillRecorder),
        )
    }

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    #[test]
    fn buy_then_sell_scenario() {
        let mut acct = account(10_000.0);

        let buy = acct.submit_order("X", Side::Buy, 1.0, 100.0).unwrap();
        approx(buy.fee, 0.02);
        approx(acct.cash(), 9_899.98);
        let pos = acct.position("X").unwrap();
        approx(pos.quantity, 1.0);
        approx(pos.avg_price, 100.0);

        let sell = acct.submit_order("X", Side::Sell, 1.0, 110.0).unwrap();
        approx(sell.realized_pnl, 10.0);
        approx(sell.fee, 0.022);
        approx(acct.cash(), 9_899.98 + 110.0 - 0.022);
        assert!(acct.position("X").is_none());
    }

    #[test]
    fn round_trip_costs_exactly_two_fees() {
        let mut acct = account(50_000.0);
        let q = 3.0;
        let p = 250.0;

        acct.submit_order("Y", Side::Buy, q, p).unwrap();
        acct.submit_order("Y", Side::Sell, q, p).unwrap();

        approx(acct.cash(), 50_000.0 - 2.0 * q * p * 0.0002);
        assert!(acct.position("Y").is_none());
    }

    #[test]
    fn weighted_average_cost_basis_on_repeat_buys() {
        let mut acct = account(100_000.0);
        acct.submit_order("Z", Side::Buy, 2.0, 100.0).unwrap();
        acct.submit_order("Z", Side::Buy, 2.0, 200.0).unwrap();

        let pos = acct.position("Z").unwrap();
        approx(pos.quantity, 4.0);
        approx(pos.avg_price, 150.0);
    }

    #[test]
    fn insufficient_cash_leaves_state_untouched() {
        let mut acct = account(100.0);
        let before = acct.snapshot();

        let err = acct.submit_order("X", Side::Buy, 10.0, 100.0).unwrap_err();
        assert!(matches!(err, Error::InsufficientCash { .. }));

        let after = acct.snapshot();
        assert_eq!(before.cash, after.cash);
        assert_eq!(before.positions, after.positions);
    }

    #[test]
    fn over_quantity_sell_leaves_state_untouched() {
        let mut acct = account(10_000.0);
        acct.submit_order("X", Side::Buy, 1.0, 100.0).unwrap();
        let before = acct.snapshot();

        let err = acct.submit_order("X", Side::Sell, 2.0, 100.0).unwrap_err();
        assert!(matches!(err, Error::InsufficientPosition { .. }));

        let after = acct.snapshot();
        assert_eq!(before.cash, after.cash);
        assert_eq!(before.positions, after.positions);
    }

    #[test]
    fn sell_within_tolerance_closes_position() {
        let mut acct = account(10_000.0);
        acct.submit_order("X", Side::Buy, 1.0, 100.0).unwrap();
        // Float dust above the held quantity is still a full close.
        acct.submit_order("X", Side::Sell, 1.0 + 5e-7, 100.0)
            .unwrap();
        assert!(acct.position("X").is_none());
    }

    #[test]
    fn invalid_inputs_rejected_before_mutation() {
        let mut acct = account(10_000.0);
        let before = acct.snapshot();

        for (qty, price) in [
            (0.0, 100.0),
            (-1.0, 100.0),
            (f64::NAN, 100.0),
            (1.0, 0.0),
            (1.0, -5.0),
            (1.0, f64::INFINITY),
            (1e-9, 100.0),
        ] {
            assert!(acct.submit_order("X", Side::Buy, qty, price).is_err());
        }

        let after = acct.snapshot();
        assert_eq!(before.cash, after.cash);
        assert_eq!(before.positions, after.positions);
    }

    #[test]
    fn recorder_failure_keeps_the_mutation() {
        struct FailingRecorder;
        impl FillRecorder for FailingRecorder {
            fn record_fill(
                &self,
                _fill: &Fill,
                _before: &AccountSnapshot,
                _after: &AccountSnapshot,
            ) -> crate::error::Result<()> {
                Err(Error::RecordingFailed("disk full".into()))
            }
        }

        let mut acct = PaperAccount::new(
            &TradingConfig {
                starting_cash: 10_000.0,
                fee_rate: 0.0002,
                min_quantity: 1e-6,
            },
            Arc::new(FailingRecorder),
        );

        let fill = acct.submit_order("X", Side::Buy, 1.0, 100.0).unwrap();
        approx(fill.filled_qty, 1.0);
        assert!(acct.position("X").is_some());
        approx(acct.cash(), 9_899.98);
    }

    #[test]
    fn equity_marks_open_positions() {
        let mut acct = account(10_000.0);
        acct.submit_order("X", Side::Buy, 2.0, 100.0).unwrap();

        let marks = HashMap::from([("X".to_string(), 110.0)]);
        approx(acct.equity(&marks), acct.cash() + 220.0);
    }
}
