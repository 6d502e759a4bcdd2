use crate::config::LiquidationCfg;
use crate::types::{BalanceSnapshot, Holding};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Thresholds shared by menu building and order construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidationRules {
    pub quote_currency: String,
    pub dust_threshold_usd: Decimal,
}

impl Default for LiquidationRules {
    fn default() -> Self {
        Self {
            quote_currency: "USDT".to_string(),
            dust_threshold_usd: Decimal::ONE,
        }
    }
}

impl LiquidationRules {
    pub fn new(cfg: &LiquidationCfg) -> Result<Self> {
        Ok(Self {
            quote_currency: cfg.quote_currency.clone(),
            dust_threshold_usd: Decimal::from_str(&cfg.dust_threshold_usd)
                .context("liquidation.dust_threshold_usd")?,
        })
    }

    /// Strictly above the dust threshold; a holding worth exactly the threshold is dust.
    pub fn is_sellable(&self, holding: &Holding) -> bool {
        holding.equity_usd > self.dust_threshold_usd
    }

    pub fn is_quote(&self, currency: &str) -> bool {
        currency == self.quote_currency
    }

    /// Holdings worth liquidating. The quote currency is kept here and only
    /// dropped when orders are built.
    pub fn sellable_holdings(&self, snapshot: &BalanceSnapshot) -> Vec<Holding> {
        snapshot
            .holdings
            .iter()
            .filter(|h| self.is_sellable(h))
            .cloned()
            .collect()
    }

    /// Currencies a user may pick from: sellable and not the quote currency.
    pub fn sellable_currencies(&self, snapshot: &BalanceSnapshot) -> Vec<String> {
        self.sellable_holdings(snapshot)
            .into_iter()
            .filter(|h| !self.is_quote(&h.currency))
            .map(|h| h.currency)
            .collect()
    }
}
