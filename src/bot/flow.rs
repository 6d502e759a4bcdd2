use crate::bot::commands::{CallbackAction, Command};
use crate::bot::render::{self, SellMode};
use crate::bot::session::{ConversationState, Phase, SessionStore};
use crate::bot::transport::{ChatId, ChatTransport, MessageId};
use crate::liquidation::Liquidator;
use crate::types::Fraction;
use anyhow::Result;
use std::sync::Arc;

/// Something the user did in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    /// Button press. `message_id` is the message carrying the keyboard, when known.
    Callback { data: String, message_id: Option<MessageId> },
}

/// Drives the menu commands and the "sell manually" conversation.
pub struct SellFlow {
    liquidator: Arc<Liquidator>,
    transport: Arc<dyn ChatTransport>,
    sessions: Arc<dyn SessionStore>,
}

impl SellFlow {
    pub fn new(
        liquidator: Arc<Liquidator>,
        transport: Arc<dyn ChatTransport>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self { liquidator, transport, sessions }
    }

    /// Applies one event. The chat's session lock is held until the
    /// transition, including its network calls, has finished.
    pub async fn handle(&self, chat: ChatId, event: Inbound) -> Result<()> {
        let session = self.sessions.session(chat).await;
        let mut state = session.lock().await;

        match event {
            Inbound::Text(text) => match Command::parse(&text) {
                Some(cmd) => self.on_command(chat, cmd, &mut state).await,
                None => {
                    tracing::debug!(chat, text = %text, "unrecognised text ignored");
                    Ok(())
                }
            },
            Inbound::Callback { data, message_id } => match CallbackAction::parse(&data) {
                Some(action) => self.on_callback(chat, action, message_id, &mut state).await,
                None => {
                    tracing::debug!(chat, data = %data, "unknown callback data ignored");
                    Ok(())
                }
            },
        }
    }

    async fn on_command(&self, chat: ChatId, cmd: Command, state: &mut ConversationState) -> Result<()> {
        tracing::info!(chat, ?cmd, "command");
        match cmd {
            Command::Menu => {
                self.transport.send(chat, &render::main_menu()).await?;
            }
            Command::About => {
                self.transport.send(chat, &render::about()).await?;
            }
            Command::GetBalance => {
                self.transport.send(chat, &render::work_in_progress()).await?;
                let screen = match self.liquidator.balance().await {
                    Ok(snapshot) => render::balance_report(&snapshot, self.liquidator.rules()),
                    Err(_) => render::balance_unavailable(),
                };
                self.transport.send(chat, &screen).await?;
            }
            Command::SellAll => {
                self.transport.send(chat, &render::work_in_progress()).await?;
                let outcome = self.liquidator.sell_all().await;
                self.transport.send(chat, &render::outcome(&outcome, SellMode::All)).await?;
            }
            Command::SellManually => self.start_manual(chat, state).await?,
        }
        Ok(())
    }

    async fn start_manual(&self, chat: ChatId, state: &mut ConversationState) -> Result<()> {
        state.reset();
        let currencies = self.liquidator.sellable_currencies().await;
        if currencies.is_empty() {
            self.transport.send(chat, &render::no_assets()).await?;
            return Ok(());
        }
        let anchor = self.transport.send(chat, &render::asset_menu(&currencies)).await?;
        state.begin(anchor);
        Ok(())
    }

    async fn on_callback(
        &self,
        chat: ChatId,
        action: CallbackAction,
        source: Option<MessageId>,
        state: &mut ConversationState,
    ) -> Result<()> {
        let (Some(anchor), phase) = (state.anchor_message_id(), state.phase()) else {
            tracing::debug!(chat, ?action, "callback without an active conversation ignored");
            return Ok(());
        };
        if source.is_some_and(|id| id != anchor) {
            tracing::debug!(chat, ?action, ?source, anchor, "callback from a stale menu ignored");
            return Ok(());
        }

        match action {
            CallbackAction::Asset(ccy) if phase == Phase::ChoosingAsset => {
                // advance only once the fraction menu is on screen
                self.transport.edit(chat, anchor, &render::fraction_menu(&ccy)).await?;
                state.pick_asset(&ccy);
            }
            CallbackAction::Fraction(fraction) if phase == Phase::ChoosingFraction => {
                self.on_fraction(chat, anchor, fraction, state).await?;
            }
            CallbackAction::Proceed if state.can_proceed() => {
                let selections = state.take_selections();
                if let Err(e) = self.transport.edit(chat, anchor, &render::proceeding(&selections)).await {
                    tracing::warn!(chat, error = ?e, "could not show the proceeding screen");
                }
                let outcome = self.liquidator.sell_selected(&selections).await;
                self.transport.send(chat, &render::outcome(&outcome, SellMode::Selected)).await?;
            }
            CallbackAction::Cancel if phase == Phase::ChoosingAsset => {
                state.reset();
                if let Err(e) = self.transport.delete(chat, anchor).await {
                    tracing::warn!(chat, error = ?e, "could not delete the selection menu");
                }
                self.transport.send(chat, &render::waiting()).await?;
            }
            action => {
                tracing::debug!(chat, ?action, ?phase, "out-of-phase callback ignored");
            }
        }
        Ok(())
    }

    async fn on_fraction(
        &self,
        chat: ChatId,
        anchor: MessageId,
        fraction: Fraction,
        state: &mut ConversationState,
    ) -> Result<()> {
        let mut next = state.clone();
        next.pick_fraction(fraction);
        let currencies = self.liquidator.sellable_currencies().await;
        let screen = render::selection_menu(next.selections(), &currencies);
        self.transport.edit(chat, anchor, &screen).await?;
        *state = next;
        Ok(())
    }

    /// Drops the chat's session if it is idle and nobody else holds it.
    pub async fn release(&self, chat: ChatId) -> bool {
        self.sessions.evict_idle(chat).await
    }
}
