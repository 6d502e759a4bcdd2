//! Turning balances into market sell batches.
//!
//! `Liquidator` is what the bot talks to; the submodules hold the pieces:
//! fetching balances, filtering out dust, sizing orders and submitting them.

pub mod executor;
pub mod fetcher;
pub mod filter;
pub mod orders;

use crate::error::{ExchangeError, LiquidationError};
use crate::exchange::Exchange;
use crate::types::{BalanceSnapshot, Selection};
use executor::{LiquidationExecutor, LiquidationOutcome};
use fetcher::BalanceFetcher;
use filter::LiquidationRules;
use std::sync::Arc;

#[derive(Clone)]
pub struct Liquidator {
    fetcher: BalanceFetcher,
    executor: LiquidationExecutor,
    rules: LiquidationRules,
}

impl Liquidator {
    pub fn new(exchange: Arc<dyn Exchange>, rules: LiquidationRules) -> Self {
        Self {
            fetcher: BalanceFetcher::new(exchange.clone()),
            executor: LiquidationExecutor::new(exchange, rules.clone()),
            rules,
        }
    }

    pub fn rules(&self) -> &LiquidationRules {
        &self.rules
    }

    pub async fn balance(&self) -> Result<BalanceSnapshot, ExchangeError> {
        self.fetcher.fetch_balance().await
    }

    /// Currencies to offer in the pick menu. An unreadable balance offers nothing.
    pub async fn sellable_currencies(&self) -> Vec<String> {
        match self.fetcher.fetch_balance().await {
            Ok(snapshot) => self.rules.sellable_currencies(&snapshot),
            Err(_) => Vec::new(),
        }
    }

    pub async fn sell_all(&self) -> LiquidationOutcome {
        let snapshot = match self.fetcher.fetch_balance().await {
            Ok(s) => s,
            Err(_) => return LiquidationOutcome::BalanceUnavailable,
        };
        let orders = orders::full_liquidation(&snapshot, &self.rules);
        self.executor.execute(orders).await
    }

    pub async fn sell_selected(&self, selections: &[Selection]) -> LiquidationOutcome {
        if selections.is_empty() {
            return LiquidationOutcome::NothingToSell;
        }
        match orders::scaled_liquidation(&self.fetcher, &self.rules, selections).await {
            Ok(orders) => self.executor.execute(orders).await,
            Err(LiquidationError::Exchange(e)) => {
                tracing::warn!(error = %e, "could not size selected orders");
                LiquidationOutcome::BalanceUnavailable
            }
            Err(e @ LiquidationError::HoldingMissing(_)) => {
                tracing::warn!(error = %e, "selected asset vanished from balance");
                LiquidationOutcome::Failed(e.to_string())
            }
        }
    }
}
