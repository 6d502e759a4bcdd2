use crate::error::ExchangeError;
use crate::types::{BalanceSnapshot, Holding};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Every OKX v5 REST response: `{"code":"0","msg":"","data":[...]}`.
#[derive(Debug, Deserialize)]
pub struct OkxEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    #[serde(default)]
    pub total_eq: String,
    #[serde(default)]
    pub details: Vec<BalanceDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDetail {
    pub ccy: String,
    #[serde(default)]
    pub eq_usd: String,
    #[serde(default)]
    pub avail_bal: String,
}

// OKX sends "" for fields it has no value for.
fn decimal_field(name: &str, raw: &str) -> Result<Decimal, ExchangeError> {
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(raw).map_err(|e| ExchangeError::Decode(format!("{} {:?}: {}", name, raw, e)))
}

impl AccountBalance {
    pub fn into_snapshot(self) -> Result<BalanceSnapshot, ExchangeError> {
        let holdings = self
            .details
            .into_iter()
            .map(|d| {
                Ok(Holding {
                    equity_usd: decimal_field("eqUsd", &d.eq_usd)?,
                    available_balance: decimal_field("availBal", &d.avail_bal)?,
                    currency: d.ccy,
                })
            })
            .collect::<Result<Vec<_>, ExchangeError>>()?;

        Ok(BalanceSnapshot {
            total_equity_usd: decimal_field("totalEq", &self.total_eq)?,
            holdings,
        })
    }
}

/// OKX reserves 501xx for authentication failures (bad key, sign, timestamp, passphrase).
pub fn is_auth_code(code: &str) -> bool {
    code.len() == 5 && code.starts_with("501")
}
