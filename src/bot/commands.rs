use crate::types::Fraction;

pub const GET_BALANCE: &str = "get balance";
pub const SELL_ALL: &str = "sell all";
pub const SELL_MANUALLY: &str = "sell manually";

pub const ASSET_PREFIX: &str = "asset:";
pub const PROCEED: &str = "action:proceed";
pub const CANCEL: &str = "action:cancel";

/// Free-text or slash command sent by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Menu,
    About,
    GetBalance,
    SellAll,
    SellManually,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(slash) = text.strip_prefix('/') {
            // "/menu@my_bot" in group chats
            let name = slash.split(['@', ' ']).next().unwrap_or("");
            return match name {
                "start" | "menu" => Some(Command::Menu),
                "about" => Some(Command::About),
                _ => None,
            };
        }
        match text {
            GET_BALANCE => Some(Command::GetBalance),
            SELL_ALL => Some(Command::SellAll),
            SELL_MANUALLY => Some(Command::SellManually),
            _ => None,
        }
    }
}

/// Inline button payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Asset(String),
    Fraction(Fraction),
    Proceed,
    Cancel,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(ccy) = data.strip_prefix(ASSET_PREFIX) {
            if ccy.is_empty() {
                return None;
            }
            return Some(CallbackAction::Asset(ccy.to_string()));
        }
        match data {
            PROCEED => Some(CallbackAction::Proceed),
            CANCEL => Some(CallbackAction::Cancel),
            other => Fraction::from_percent(other).map(CallbackAction::Fraction),
        }
    }

    pub fn asset_data(currency: &str) -> String {
        format!("{}{}", ASSET_PREFIX, currency)
    }
}
