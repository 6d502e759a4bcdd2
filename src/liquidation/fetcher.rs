use crate::error::{ExchangeError, LiquidationError};
use crate::exchange::Exchange;
use crate::types::{BalanceSnapshot, Holding};
use std::sync::Arc;

#[derive(Clone)]
pub struct BalanceFetcher {
    exchange: Arc<dyn Exchange>,
}

impl BalanceFetcher {
    pub fn new(exchange: Arc<dyn Exchange>) -> Self {
        Self { exchange }
    }

    pub async fn fetch_balance(&self) -> Result<BalanceSnapshot, ExchangeError> {
        match self.exchange.balance().await {
            Ok(snapshot) => {
                tracing::debug!(holdings = snapshot.holdings.len(), total_eq = %snapshot.total_equity_usd, "balance fetched");
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(error = %e, "balance fetch failed");
                Err(e)
            }
        }
    }

    /// Current holding of one currency: its available balance, which sizes an
    /// order, and its USD equity, which the dust rule needs. Re-fetches the
    /// whole snapshot so multi-step flows always see current holdings.
    pub async fn holding_of(&self, currency: &str) -> Result<Holding, LiquidationError> {
        let snapshot = self.fetch_balance().await?;
        snapshot
            .holding(currency)
            .cloned()
            .ok_or_else(|| LiquidationError::HoldingMissing(currency.to_string()))
    }
}
