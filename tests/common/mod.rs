//! In-memory exchange and chat transport for deterministic tests.
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use okx_liquidator::bot::transport::{ChatId, ChatTransport, MessageId, Screen};
use okx_liquidator::error::ExchangeError;
use okx_liquidator::exchange::Exchange;
use okx_liquidator::types::{BalanceSnapshot, Holding, OrderRequest};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn holding(ccy: &str, eq_usd: &str, avail: &str) -> Holding {
    Holding {
        currency: ccy.to_string(),
        equity_usd: Decimal::from_str(eq_usd).unwrap(),
        available_balance: Decimal::from_str(avail).unwrap(),
    }
}

pub fn snapshot(holdings: Vec<Holding>) -> BalanceSnapshot {
    let total = holdings.iter().map(|h| h.equity_usd).sum();
    BalanceSnapshot { total_equity_usd: total, holdings }
}

/// BTC worth 500, USDT worth 1200, DOGE dust.
pub fn mixed_snapshot() -> BalanceSnapshot {
    snapshot(vec![
        holding("BTC", "500", "0.01"),
        holding("USDT", "1200", "1200"),
        holding("DOGE", "0.5", "100"),
    ])
}

pub struct FakeExchange {
    snapshot: Mutex<BalanceSnapshot>,
    fail_balance: Mutex<bool>,
    reject_batch: Mutex<Option<String>>,
    balance_calls: AtomicUsize,
    batches: Mutex<Vec<Vec<OrderRequest>>>,
}

impl FakeExchange {
    pub fn new(snapshot: BalanceSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            fail_balance: Mutex::new(false),
            reject_batch: Mutex::new(None),
            balance_calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn set_snapshot(&self, snapshot: BalanceSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }

    pub fn fail_balance(&self, fail: bool) {
        *self.fail_balance.lock().unwrap() = fail;
    }

    pub fn reject_batch(&self, body: &str) {
        *self.reject_batch.lock().unwrap() = Some(body.to_string());
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<OrderRequest>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Exchange for FakeExchange {
    async fn balance(&self) -> Result<BalanceSnapshot, ExchangeError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_balance.lock().unwrap() {
            return Err(ExchangeError::Http { status: 503, body: "unavailable".into() });
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn place_batch(&self, orders: &[OrderRequest]) -> Result<(), ExchangeError> {
        self.batches.lock().unwrap().push(orders.to_vec());
        if let Some(body) = self.reject_batch.lock().unwrap().clone() {
            return Err(ExchangeError::Rejected { code: "1".into(), msg: String::new(), body });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Send { chat: ChatId, id: MessageId, screen: Screen },
    Edit { chat: ChatId, id: MessageId, screen: Screen },
    Delete { chat: ChatId, id: MessageId },
}

#[derive(Default)]
pub struct RecordingTransport {
    next_id: AtomicUsize,
    fail_edits: AtomicBool,
    log: Mutex<Vec<Sent>>,
}

impl RecordingTransport {
    pub fn log(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Sent {
        self.log().last().cloned().expect("nothing sent")
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    /// While set, every edit fails and is not logged.
    pub fn fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, chat: ChatId, screen: &Screen) -> Result<MessageId> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as MessageId + 100;
        self.log.lock().unwrap().push(Sent::Send { chat, id, screen: screen.clone() });
        Ok(id)
    }

    async fn edit(&self, chat: ChatId, id: MessageId, screen: &Screen) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            anyhow::bail!("message to edit not found");
        }
        self.log.lock().unwrap().push(Sent::Edit { chat, id, screen: screen.clone() });
        Ok(())
    }

    async fn delete(&self, chat: ChatId, id: MessageId) -> Result<()> {
        self.log.lock().unwrap().push(Sent::Delete { chat, id });
        Ok(())
    }
}
