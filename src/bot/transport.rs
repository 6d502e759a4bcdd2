use anyhow::Result;
use async_trait::async_trait;

pub type ChatId = i64;
pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self { label: label.into(), data: data.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    None,
    /// Buttons attached to the message; pressing one sends its `data` back.
    Inline(Vec<Vec<Button>>),
    /// Persistent keyboard replacing the text input; pressing sends the label as text.
    Reply(Vec<Vec<String>>),
}

/// HTML text plus its keyboard, i.e. one rendering of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub markup: Markup,
}

impl Screen {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), markup: Markup::None }
    }

    pub fn with_markup(text: impl Into<String>, markup: Markup) -> Self {
        Self { text: text.into(), markup }
    }

    pub fn inline_rows(&self) -> &[Vec<Button>] {
        match &self.markup {
            Markup::Inline(rows) => rows,
            _ => &[],
        }
    }
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, chat: ChatId, screen: &Screen) -> Result<MessageId>;

    /// Replaces text and keyboard of an existing message.
    async fn edit(&self, chat: ChatId, message: MessageId, screen: &Screen) -> Result<()>;

    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<()>;
}
