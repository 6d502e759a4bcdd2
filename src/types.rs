use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub currency: String,
    pub equity_usd: Decimal,
    /// Quantity free to trade, in units of the asset itself.
    pub available_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub total_equity_usd: Decimal,
    pub holdings: Vec<Holding>,
}

impl BalanceSnapshot {
    pub fn holding(&self, currency: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.currency == currency)
    }
}

/// Share of the available balance to sell for one selected asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fraction {
    Quarter,
    Half,
    ThreeQuarters,
    Full,
}

impl Fraction {
    pub const ALL: [Fraction; 4] = [
        Fraction::Quarter,
        Fraction::Half,
        Fraction::ThreeQuarters,
        Fraction::Full,
    ];

    pub fn percent(self) -> u32 {
        match self {
            Fraction::Quarter => 25,
            Fraction::Half => 50,
            Fraction::ThreeQuarters => 75,
            Fraction::Full => 100,
        }
    }

    pub fn from_percent(raw: &str) -> Option<Self> {
        match raw {
            "25" => Some(Fraction::Quarter),
            "50" => Some(Fraction::Half),
            "75" => Some(Fraction::ThreeQuarters),
            "100" => Some(Fraction::Full),
            _ => None,
        }
    }

    /// `amount * percent / 100`, exact in decimal.
    pub fn apply(self, amount: Decimal) -> Decimal {
        (amount * Decimal::from(self.percent()) / Decimal::ONE_HUNDRED).normalize()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub currency: String,
    pub fraction: Fraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeMode {
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
}

/// One entry of the batch-orders body. Field order is the wire order and
/// therefore part of the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    #[serde(rename = "instId")]
    pub inst_id: String,
    #[serde(rename = "tdMode")]
    pub trade_mode: TradeMode,
    pub side: Side,
    #[serde(rename = "ordType")]
    pub order_type: OrderType,
    #[serde(rename = "sz", serialize_with = "rust_decimal::serde::str::serialize")]
    pub size: Decimal,
}

impl OrderRequest {
    pub fn market_sell(currency: &str, quote: &str, size: Decimal) -> Self {
        Self {
            inst_id: format!("{}-{}", currency, quote),
            trade_mode: TradeMode::Cash,
            side: Side::Sell,
            order_type: OrderType::Market,
            size: size.normalize(),
        }
    }
}
