use crate::error::Result;
use crate::interfaces::Notifier;
use crate::quotes::cache::QuoteCache;
use crate::trading::account::PaperAccount;
use crate::trading::context::TradeContext;
use crate::types::fill::{Fill, Side};
use std::sync::Arc;
use std::time::Duration;

/// A trade decision from the signal-generation collaborator. The core
/// makes no assumption about how it was derived.
#[derive(Clone, Debug)]
pub struct TradeSignal {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
}

/// Composition root for one account: quote cache -> atomic trade context
/// -> execution ledger, with fire-and-forget notifications.
///
/// `execute` takes `&mut self`, which serializes order submission for the
/// account by construction.
pub struct TradingEngine {
    context: TradeContext,
    account: PaperAccount,
    notifier: Arc<dyn Notifier>,
}

impl TradingEngine {
    pub fn new(
        cache: Arc<QuoteCache>,
        account: PaperAccount,
        notifier: Arc<dyn Notifier>,
        max_quote_age: Duration,
    ) -> Self {
        TradingEngine {
            context: TradeContext::new(cache, max_quote_age),
            account,
            notifier,
        }
    }

    /// Executes one signal against a provably fresh quote: buys fill at
    /// the ask, sells at the bid. Any quote or ledger error propagates
    /// untouched; nothing here ends the process.
    pub async fn execute(&mut self, signal: &TradeSignal) -> Result<Fill> {
        let account = &mut self.account;
        let fill = self
            .context
            .with_quote(&signal.symbol, |quote| {
                let price = match signal.side {
                    Side::Buy => quote.ask_price(),
                    Side::Sell => quote.bid_price(),
                };
                account.submit_order(&signal.symbol, signal.side, signal.quantity, price)
            })
            .await?;

        self.notifier.notify(&format!(
            "trade executed: {} {} {} @ {:.4} (fee {:.4}, pnl {:.4})",
            fill.side, fill.filled_qty, fill.symbol, fill.filled_price, fill.fee, fill.realized_pnl
        ));
        Ok(fill)
    }

    pub fn account(&self) -> &PaperAccount {
        &self.account
    }
}
