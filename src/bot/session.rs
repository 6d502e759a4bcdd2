use crate::bot::transport::{ChatId, MessageId};
use crate::types::{Fraction, Selection};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    ChoosingAsset,
    ChoosingFraction,
}

/// State of one "sell manually" conversation.
///
/// Fields are only changed through the transition methods so that
/// `selections` is always empty while `phase` is `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    phase: Phase,
    pending_currency: Option<String>,
    selections: Vec<Selection>,
    anchor_message_id: Option<MessageId>,
}

impl ConversationState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending_currency(&self) -> Option<&str> {
        self.pending_currency.as_deref()
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn anchor_message_id(&self) -> Option<MessageId> {
        self.anchor_message_id
    }

    /// Idle -> ChoosingAsset, discarding anything left from an earlier flow.
    pub fn begin(&mut self, anchor: MessageId) {
        *self = Self {
            phase: Phase::ChoosingAsset,
            anchor_message_id: Some(anchor),
            ..Self::default()
        };
    }

    /// ChoosingAsset -> ChoosingFraction. Returns false if out of phase.
    pub fn pick_asset(&mut self, currency: &str) -> bool {
        if self.phase != Phase::ChoosingAsset {
            return false;
        }
        self.pending_currency = Some(currency.to_string());
        self.phase = Phase::ChoosingFraction;
        true
    }

    /// ChoosingFraction -> ChoosingAsset, recording the selection. Returns false if out of phase.
    pub fn pick_fraction(&mut self, fraction: Fraction) -> bool {
        if self.phase != Phase::ChoosingFraction {
            return false;
        }
        let Some(currency) = self.pending_currency.take() else {
            return false;
        };
        self.selections.push(Selection { currency, fraction });
        self.phase = Phase::ChoosingAsset;
        true
    }

    /// Whether proceed is currently allowed.
    pub fn can_proceed(&self) -> bool {
        self.phase == Phase::ChoosingAsset && !self.selections.is_empty()
    }

    /// ChoosingAsset -> Idle, handing over the selections.
    pub fn take_selections(&mut self) -> Vec<Selection> {
        let selections = std::mem::take(&mut self.selections);
        self.reset();
        selections
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Per-chat conversation state. Holding the returned mutex for a whole
/// transition is what serializes events of one chat.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn session(&self, chat: ChatId) -> Arc<Mutex<ConversationState>>;

    /// Forgets an idle, unused session. Returns whether it was removed.
    async fn evict_idle(&self, chat: ChatId) -> bool;
}

#[derive(Default)]
pub struct InMemorySessions {
    sessions: Mutex<HashMap<ChatId, Arc<Mutex<ConversationState>>>>,
}

#[async_trait]
impl SessionStore for InMemorySessions {
    async fn session(&self, chat: ChatId) -> Arc<Mutex<ConversationState>> {
        let mut sessions = self.sessions.lock().await;
        sessions.entry(chat).or_default().clone()
    }

    async fn evict_idle(&self, chat: ChatId) -> bool {
        let mut sessions = self.sessions.lock().await;
        let idle = match sessions.get(&chat) {
            Some(session) => {
                Arc::strong_count(session) == 1
                    && session
                        .try_lock()
                        .map(|state| state.phase() == Phase::Idle)
                        .unwrap_or(false)
            }
            None => return false,
        };
        if idle {
            sessions.remove(&chat);
        }
        idle
    }
}
