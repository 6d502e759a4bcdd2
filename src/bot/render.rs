use crate::bot::commands::{CallbackAction, CANCEL, GET_BALANCE, PROCEED, SELL_ALL, SELL_MANUALLY};
use crate::bot::transport::{Button, Markup, Screen};
use crate::liquidation::executor::LiquidationOutcome;
use crate::liquidation::filter::LiquidationRules;
use crate::types::{BalanceSnapshot, Fraction, Selection};

pub fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn main_menu() -> Screen {
    Screen::with_markup(
        "<b>waiting for a new task</b>",
        Markup::Reply(vec![
            vec![GET_BALANCE.to_string()],
            vec![SELL_ALL.to_string()],
            vec![SELL_MANUALLY.to_string()],
        ]),
    )
}

pub fn waiting() -> Screen {
    Screen::text("<b>waiting for a new task</b>")
}

pub fn about() -> Screen {
    Screen::text(
        "<b>okx liquidator</b>\nsells your OKX spot holdings into USDT with market orders.\n\
         use <i>sell all</i> to sell everything worth more than the dust threshold, \
         or <i>sell manually</i> to pick assets and the part of each to sell.",
    )
}

pub fn work_in_progress() -> Screen {
    Screen::text("work in progress...")
}

pub fn no_assets() -> Screen {
    Screen::text("no assets available")
}

pub fn balance_report(snapshot: &BalanceSnapshot, rules: &LiquidationRules) -> Screen {
    let assets: String = rules
        .sellable_holdings(snapshot)
        .iter()
        .map(|h| format!("<i>{}: {:.2} USD</i>\n\n", escape_html(&h.currency), h.equity_usd))
        .collect();
    Screen::text(format!(
        "<b>total balance</b>: <i>{:.2} USD</i>\n-------\n<b>your assets</b>:\n\n{}",
        snapshot.total_equity_usd, assets
    ))
}

pub fn balance_unavailable() -> Screen {
    Screen::text("<b>could not fetch your balance, try again later</b>")
}

fn asset_row(currencies: &[String]) -> Vec<Button> {
    currencies
        .iter()
        .map(|ccy| Button::new(ccy.as_str(), CallbackAction::asset_data(ccy)))
        .collect()
}

pub fn asset_menu(currencies: &[String]) -> Screen {
    Screen::with_markup(
        "<b>choose an asset and select part you want to sell</b>",
        Markup::Inline(vec![asset_row(currencies)]),
    )
}

pub fn fraction_menu(currency: &str) -> Screen {
    let button = |f: Fraction| Button::new(format!("{}%", f.percent()), f.percent().to_string());
    Screen::with_markup(
        format!(
            "you selected <b>{}</b>\nnow select the part you want to sell:",
            escape_html(currency)
        ),
        Markup::Inline(vec![
            vec![button(Fraction::Quarter), button(Fraction::Half)],
            vec![button(Fraction::ThreeQuarters), button(Fraction::Full)],
        ]),
    )
}

fn selections_text(selections: &[Selection]) -> String {
    selections
        .iter()
        .map(|s| format!("{}: {}%", escape_html(&s.currency), s.fraction.percent()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn selection_menu(selections: &[Selection], currencies: &[String]) -> Screen {
    let mut rows = Vec::new();
    if !currencies.is_empty() {
        rows.push(asset_row(currencies));
    }
    rows.push(vec![Button::new("proceed", PROCEED)]);
    rows.push(vec![Button::new("cancel", CANCEL)]);

    Screen::with_markup(
        format!(
            "<b>choose another asset or proceed</b>\n\n<b>selected assets:</b>\n<i>{}</i>",
            selections_text(selections)
        ),
        Markup::Inline(rows),
    )
}

pub fn proceeding(selections: &[Selection]) -> Screen {
    Screen::text(format!(
        "Proceeding with the following assets:\n{}",
        selections_text(selections)
    ))
}

pub enum SellMode {
    All,
    Selected,
}

pub fn outcome(outcome: &LiquidationOutcome, mode: SellMode) -> Screen {
    match outcome {
        LiquidationOutcome::Submitted { .. } => match mode {
            SellMode::All => Screen::text("<b>Your assets have been sold</b>"),
            SellMode::Selected => Screen::text("<b>Chosen assets have been sold</b>"),
        },
        LiquidationOutcome::NothingToSell => Screen::text("<b>no assets available to sell</b>"),
        LiquidationOutcome::BalanceUnavailable => balance_unavailable(),
        LiquidationOutcome::Failed(err) => {
            Screen::text(format!("<b>error:</b>\n<i>{}</i>", escape_html(err)))
        }
    }
}
