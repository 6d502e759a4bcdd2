//! OKX REST access: request signing, wire models and the HTTP client.

pub mod models;
pub mod okx_rest;
pub mod signer;

use crate::error::ExchangeError;
use crate::types::{BalanceSnapshot, OrderRequest};
use async_trait::async_trait;

/// The two exchange calls liquidation needs.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Current account balance, fetched fresh on every call.
    async fn balance(&self) -> Result<BalanceSnapshot, ExchangeError>;

    /// Submits all orders as one batch call. Success is reported for the batch only.
    async fn place_batch(&self, orders: &[OrderRequest]) -> Result<(), ExchangeError>;
}
