use crate::exchange::Exchange;
use crate::liquidation::filter::LiquidationRules;
use crate::liquidation::orders::is_degenerate;
use crate::types::OrderRequest;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiquidationOutcome {
    Submitted { orders: usize },
    NothingToSell,
    /// The balance could not be read, so no order set was built.
    BalanceUnavailable,
    /// Raw error text, relayed to the user verbatim.
    Failed(String),
}

#[derive(Clone)]
pub struct LiquidationExecutor {
    exchange: Arc<dyn Exchange>,
    rules: LiquidationRules,
}

impl LiquidationExecutor {
    pub fn new(exchange: Arc<dyn Exchange>, rules: LiquidationRules) -> Self {
        Self { exchange, rules }
    }

    pub async fn execute(&self, orders: Vec<OrderRequest>) -> LiquidationOutcome {
        if is_degenerate(&orders, &self.rules) {
            tracing::info!(orders = orders.len(), "no sellable orders; batch not sent");
            return LiquidationOutcome::NothingToSell;
        }

        let instruments: Vec<&str> = orders.iter().map(|o| o.inst_id.as_str()).collect();
        tracing::info!(orders = orders.len(), ?instruments, "submitting batch sell");

        match self.exchange.place_batch(&orders).await {
            Ok(()) => {
                tracing::info!(orders = orders.len(), "batch accepted");
                LiquidationOutcome::Submitted { orders: orders.len() }
            }
            Err(e) => {
                tracing::error!(error = %e, "batch submission failed");
                LiquidationOutcome::Failed(e.to_string())
            }
        }
    }
}
