mod common;

use common::{holding, mixed_snapshot, snapshot, FakeExchange, RecordingTransport, Sent};
use okx_liquidator::bot::flow::{Inbound, SellFlow};
use okx_liquidator::bot::session::{ConversationState, InMemorySessions, Phase, SessionStore};
use okx_liquidator::bot::transport::{Markup, MessageId, Screen};
use okx_liquidator::liquidation::filter::LiquidationRules;
use okx_liquidator::liquidation::Liquidator;
use okx_liquidator::types::{Fraction, OrderRequest, Selection};
use rust_decimal_macros::dec;
use std::sync::Arc;

const CHAT: i64 = 42;

struct Harness {
    exchange: Arc<FakeExchange>,
    transport: Arc<RecordingTransport>,
    sessions: Arc<InMemorySessions>,
    flow: SellFlow,
}

impl Harness {
    fn new(exchange: FakeExchange) -> Self {
        let exchange = Arc::new(exchange);
        let transport = Arc::new(RecordingTransport::default());
        let sessions = Arc::new(InMemorySessions::default());
        let liquidator = Arc::new(Liquidator::new(exchange.clone(), LiquidationRules::default()));
        let flow = SellFlow::new(liquidator, transport.clone(), sessions.clone());
        Self { exchange, transport, sessions, flow }
    }

    async fn text(&self, text: &str) {
        self.flow.handle(CHAT, Inbound::Text(text.to_string())).await.unwrap();
    }

    /// Presses a button on the current anchor message.
    async fn press(&self, data: &str) {
        let anchor = self.state().await.anchor_message_id();
        self.flow.handle(CHAT, callback(data, anchor)).await.unwrap();
    }

    async fn press_on(&self, message: MessageId, data: &str) {
        self.flow.handle(CHAT, callback(data, Some(message))).await.unwrap();
    }

    async fn state(&self) -> ConversationState {
        let session = self.sessions.session(CHAT).await;
        let state = session.lock().await;
        state.clone()
    }
}

fn callback(data: &str, message_id: Option<MessageId>) -> Inbound {
    Inbound::Callback { data: data.to_string(), message_id }
}

fn button_data(screen: &Screen) -> Vec<String> {
    screen
        .inline_rows()
        .iter()
        .flatten()
        .map(|b| b.data.clone())
        .collect()
}

fn two_assets() -> FakeExchange {
    FakeExchange::new(snapshot(vec![
        holding("BTC", "500", "0.01"),
        holding("ETH", "300", "0.1"),
        holding("USDT", "1200", "1200"),
        holding("DOGE", "0.5", "100"),
    ]))
}

#[tokio::test]
async fn manual_sell_offers_sellable_non_quote_assets() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;

    let Sent::Send { id, screen, .. } = h.transport.last() else {
        panic!("expected a new message");
    };
    assert_eq!(button_data(&screen), vec!["asset:BTC", "asset:ETH"]);

    let state = h.state().await;
    assert_eq!(state.phase(), Phase::ChoosingAsset);
    assert_eq!(state.anchor_message_id(), Some(id));
    assert!(state.selections().is_empty());
}

#[tokio::test]
async fn manual_sell_without_assets_stays_idle() {
    let h = Harness::new(FakeExchange::new(snapshot(vec![
        holding("USDT", "1200", "1200"),
        holding("DOGE", "0.5", "100"),
    ])));
    h.text("sell manually").await;

    assert_eq!(h.transport.last(), Sent::Send { chat: CHAT, id: 100, screen: Screen::text("no assets available") });
    assert_eq!(h.state().await, ConversationState::default());
}

#[tokio::test]
async fn manual_sell_with_unreachable_exchange_stays_idle() {
    let exchange = two_assets();
    exchange.fail_balance(true);
    let h = Harness::new(exchange);
    h.text("sell manually").await;

    assert_eq!(h.state().await.phase(), Phase::Idle);
    assert!(matches!(h.transport.last(), Sent::Send { .. }));
}

#[tokio::test]
async fn full_manual_flow_edits_one_message_and_sells_fractions() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;
    let anchor = h.state().await.anchor_message_id().unwrap();

    h.press("asset:BTC").await;
    let state = h.state().await;
    assert_eq!(state.phase(), Phase::ChoosingFraction);
    assert_eq!(state.pending_currency(), Some("BTC"));
    let Sent::Edit { id, screen, .. } = h.transport.last() else {
        panic!("expected an edit");
    };
    assert_eq!(id, anchor);
    assert_eq!(button_data(&screen), vec!["25", "50", "75", "100"]);

    h.press("50").await;
    let state = h.state().await;
    assert_eq!(state.phase(), Phase::ChoosingAsset);
    assert_eq!(state.pending_currency(), None);
    assert_eq!(
        state.selections(),
        &[Selection { currency: "BTC".into(), fraction: Fraction::Half }]
    );
    let Sent::Edit { id, screen, .. } = h.transport.last() else {
        panic!("expected an edit");
    };
    assert_eq!(id, anchor);
    assert!(screen.text.contains("BTC: 50%"));
    assert_eq!(
        button_data(&screen),
        vec!["asset:BTC", "asset:ETH", "action:proceed", "action:cancel"]
    );

    h.press("asset:ETH").await;
    h.press("100").await;
    h.press("action:proceed").await;

    assert_eq!(
        h.exchange.batches(),
        vec![vec![
            OrderRequest::market_sell("BTC", "USDT", dec!(0.005)),
            OrderRequest::market_sell("ETH", "USDT", dec!(0.1)),
        ]]
    );
    assert_eq!(h.state().await, ConversationState::default());

    // every edit targeted the anchor, and only the initial menu and the result were new messages
    let log = h.transport.log();
    assert!(log.iter().all(|s| match s {
        Sent::Edit { id, .. } => *id == anchor,
        _ => true,
    }));
    let sends: Vec<&Screen> = log
        .iter()
        .filter_map(|s| match s {
            Sent::Send { screen, .. } => Some(screen),
            _ => None,
        })
        .collect();
    assert_eq!(sends.len(), 2);
    assert_eq!(sends[1].text, "<b>Chosen assets have been sold</b>");
}

#[tokio::test]
async fn fraction_while_choosing_asset_is_ignored() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;
    let before = h.state().await;
    let sent_before = h.transport.log().len();

    h.press("50").await;

    assert_eq!(h.state().await, before);
    assert_eq!(h.transport.log().len(), sent_before);
}

#[tokio::test]
async fn out_of_phase_callbacks_leave_state_untouched() {
    let h = Harness::new(two_assets());

    // nothing active yet
    h.press("asset:BTC").await;
    h.press("action:proceed").await;
    assert_eq!(h.state().await, ConversationState::default());
    assert!(h.transport.log().is_empty());

    h.text("sell manually").await;

    // proceed with no selections
    h.press("action:proceed").await;
    assert_eq!(h.state().await.phase(), Phase::ChoosingAsset);

    h.press("asset:BTC").await;
    let choosing_fraction = h.state().await;

    // asset, proceed and cancel are not valid while a fraction is pending
    h.press("asset:ETH").await;
    h.press("action:proceed").await;
    h.press("action:cancel").await;
    assert_eq!(h.state().await, choosing_fraction);

    // garbage payloads
    h.press("33").await;
    h.press("asset:").await;
    assert_eq!(h.state().await, choosing_fraction);
    assert!(h.exchange.batches().is_empty());
}

#[tokio::test]
async fn cancel_discards_selections_and_removes_menu() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;
    let anchor = h.state().await.anchor_message_id().unwrap();
    h.press("asset:BTC").await;
    h.press("25").await;

    h.press("action:cancel").await;

    assert_eq!(h.state().await, ConversationState::default());
    assert!(h.exchange.batches().is_empty());
    let log = h.transport.log();
    assert_eq!(log[log.len() - 2], Sent::Delete { chat: CHAT, id: anchor });
    assert!(matches!(&log[log.len() - 1], Sent::Send { screen, .. } if screen.text.contains("waiting for a new task")));

    // the old menu is dead
    h.press("50").await;
    assert_eq!(h.state().await, ConversationState::default());
}

#[tokio::test]
async fn asset_menu_is_recomputed_after_each_fraction() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;
    h.press("asset:BTC").await;

    h.exchange.set_snapshot(snapshot(vec![
        holding("BTC", "500", "0.01"),
        holding("SOL", "40", "0.3"),
    ]));
    h.press("75").await;

    let Sent::Edit { screen, .. } = h.transport.last() else {
        panic!("expected an edit");
    };
    assert_eq!(
        button_data(&screen),
        vec!["asset:BTC", "asset:SOL", "action:proceed", "action:cancel"]
    );
}

#[tokio::test]
async fn restarting_manual_sell_drops_previous_selections() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;
    h.press("asset:BTC").await;
    h.press("25").await;

    h.text("sell manually").await;

    let state = h.state().await;
    assert_eq!(state.phase(), Phase::ChoosingAsset);
    assert!(state.selections().is_empty());
}

#[tokio::test]
async fn sell_all_command_reports_result() {
    let h = Harness::new(FakeExchange::new(mixed_snapshot()));
    h.text("sell all").await;

    assert_eq!(h.exchange.batches().len(), 1);
    let log = h.transport.log();
    assert_eq!(log.len(), 2);
    assert_eq!(h.transport.last(), Sent::Send {
        chat: CHAT,
        id: 101,
        screen: Screen::text("<b>Your assets have been sold</b>"),
    });
}

#[tokio::test]
async fn sell_all_with_only_quote_skips_order_endpoint() {
    let h = Harness::new(FakeExchange::new(snapshot(vec![holding("USDT", "1200", "1200")])));
    h.text("sell all").await;

    assert!(h.exchange.batches().is_empty());
    let Sent::Send { screen, .. } = h.transport.last() else {
        panic!("expected a message");
    };
    assert_eq!(screen.text, "<b>no assets available to sell</b>");
}

#[tokio::test]
async fn failed_batch_error_is_escaped_for_html() {
    let exchange = FakeExchange::new(mixed_snapshot());
    exchange.reject_batch(r#"{"msg":"<bad>"}"#);
    let h = Harness::new(exchange);
    h.text("sell all").await;

    let Sent::Send { screen, .. } = h.transport.last() else {
        panic!("expected a message");
    };
    assert!(screen.text.starts_with("<b>error:</b>"));
    assert!(screen.text.contains("&lt;bad&gt;"));
}

#[tokio::test]
async fn get_balance_lists_assets_above_dust() {
    let h = Harness::new(FakeExchange::new(mixed_snapshot()));
    h.text("get balance").await;

    let Sent::Send { screen, .. } = h.transport.last() else {
        panic!("expected a message");
    };
    assert!(screen.text.contains("<b>total balance</b>: <i>1700.50 USD</i>"));
    assert!(screen.text.contains("<i>BTC: 500.00 USD</i>"));
    assert!(screen.text.contains("<i>USDT: 1200.00 USD</i>"));
    assert!(!screen.text.contains("DOGE"));
}

#[tokio::test]
async fn menu_command_shows_reply_keyboard() {
    let h = Harness::new(FakeExchange::new(mixed_snapshot()));
    h.text("/start").await;

    let Sent::Send { screen, .. } = h.transport.last() else {
        panic!("expected a message");
    };
    assert_eq!(
        screen.markup,
        Markup::Reply(vec![
            vec!["get balance".to_string()],
            vec!["sell all".to_string()],
            vec!["sell manually".to_string()],
        ])
    );
    assert_eq!(h.exchange.balance_calls(), 0);
}

#[tokio::test]
async fn conversations_do_not_share_state() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;
    h.press("asset:BTC").await;

    h.flow.handle(7, Inbound::Text("sell manually".into())).await.unwrap();
    h.flow.handle(7, callback("asset:ETH", None)).await.unwrap();
    h.flow.handle(7, callback("100", None)).await.unwrap();

    assert_eq!(h.state().await.pending_currency(), Some("BTC"));
    let other = h.sessions.session(7).await.lock().await.clone();
    assert_eq!(other.selections().len(), 1);
    assert_eq!(other.selections()[0].currency, "ETH");
}

#[tokio::test]
async fn failed_proceeding_edit_still_sells_and_reports() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;
    h.press("asset:BTC").await;
    h.press("50").await;

    h.transport.fail_edits(true);
    let anchor = h.state().await.anchor_message_id();
    let res = h.flow.handle(CHAT, callback("action:proceed", anchor)).await;
    assert!(res.is_ok());

    assert_eq!(h.exchange.batches(), vec![vec![OrderRequest::market_sell("BTC", "USDT", dec!(0.005))]]);
    assert_eq!(h.state().await, ConversationState::default());
    let Sent::Send { screen, .. } = h.transport.last() else {
        panic!("expected the result message");
    };
    assert_eq!(screen.text, "<b>Chosen assets have been sold</b>");
}

#[tokio::test]
async fn failed_edit_leaves_the_step_retryable() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;

    h.transport.fail_edits(true);
    let anchor = h.state().await.anchor_message_id();
    assert!(h.flow.handle(CHAT, callback("asset:BTC", anchor)).await.is_err());
    let state = h.state().await;
    assert_eq!(state.phase(), Phase::ChoosingAsset);
    assert_eq!(state.pending_currency(), None);

    h.transport.fail_edits(false);
    h.press("asset:BTC").await;
    h.transport.fail_edits(true);
    assert!(h.flow.handle(CHAT, callback("25", anchor)).await.is_err());
    let state = h.state().await;
    assert_eq!(state.phase(), Phase::ChoosingFraction);
    assert_eq!(state.pending_currency(), Some("BTC"));
    assert!(state.selections().is_empty());

    h.transport.fail_edits(false);
    h.press("25").await;
    assert_eq!(
        h.state().await.selections(),
        &[Selection { currency: "BTC".into(), fraction: Fraction::Quarter }]
    );
}

#[tokio::test]
async fn presses_on_an_abandoned_menu_are_ignored() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;
    let old = h.state().await.anchor_message_id().unwrap();

    h.text("sell manually").await;
    let current = h.state().await.anchor_message_id().unwrap();
    assert_ne!(old, current);
    h.transport.clear();

    h.press_on(old, "asset:ETH").await;
    assert!(h.transport.log().is_empty());
    assert_eq!(h.state().await.phase(), Phase::ChoosingAsset);

    h.press_on(current, "asset:ETH").await;
    assert_eq!(h.state().await.pending_currency(), Some("ETH"));
    assert!(matches!(h.transport.last(), Sent::Edit { id, .. } if id == current));
}

#[tokio::test]
async fn only_idle_sessions_are_released() {
    let h = Harness::new(two_assets());
    h.text("sell manually").await;
    h.press("asset:BTC").await;

    assert!(!h.flow.release(CHAT).await);
    assert_eq!(h.state().await.pending_currency(), Some("BTC"));

    h.text("sell manually").await;
    h.press("action:cancel").await;
    assert!(h.flow.release(CHAT).await);
    assert!(!h.flow.release(CHAT).await);
}
