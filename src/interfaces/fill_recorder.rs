use crate::error::Result;
use crate::trading::account::AccountSnapshot;
use crate::types::fill::Fill;

/// Durable-recording collaborator. Receives every successful fill plus the
/// account state before and after the mutation, append-only. A recording
/// failure is the recorder's problem: the ledger logs it and keeps the
/// in-memory mutation.
pub trait FillRecorder: Send + Sync {
    fn record_fill(&self, fill: &Fill, before: &AccountSnapshot, after: &AccountSnapshot)
    -> Result<()>;
}

/// Default recorder: fills go to the log.
pub struct LogFillRecorder;

impl FillRecorder for LogFillRecorder {
    fn record_fill(
        &self,
        fill: &Fill,
        _before: &AccountSnapshot,
        after: &AccountSnapshot,
    ) -> Result<()> {
        tracing::info!(
            fill_id = %fill.fill_id,
            symbol = %fill.symbol,
            side = %fill.side,
            qty = fill.filled_qty,
            price = fill.filled_price,
            fee = fill.fee,
            realized_pnl = fill.realized_pnl,
            cash_after = after.cash,
            "fill recorded"
        );
        Ok(())
    }
}
