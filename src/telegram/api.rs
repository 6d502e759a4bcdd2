use crate::bot::transport::{ChatId, ChatTransport, Markup, MessageId, Screen};
use crate::config::TelegramCfg;
use crate::telegram::models::{Message, TgResponse, Update};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct TelegramApi {
    base_url: String, // e.g. https://api.telegram.org
    token: SecretString,
    client: Client,
}

fn markup_json(markup: &Markup) -> Option<Value> {
    match markup {
        Markup::None => None,
        Markup::Inline(rows) => {
            let keyboard: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| json!({ "text": b.label, "callback_data": b.data }))
                        .collect()
                })
                .collect();
            Some(json!({ "inline_keyboard": keyboard }))
        }
        Markup::Reply(rows) => {
            let keyboard: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| row.iter().map(|label| json!({ "text": label })).collect())
                .collect();
            Some(json!({ "keyboard": keyboard, "resize_keyboard": true }))
        }
    }
}

impl TelegramApi {
    pub fn new(cfg: &TelegramCfg, token: SecretString) -> Self {
        Self {
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    pub fn token_from_env() -> Result<SecretString> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN not set")?;
        if token.is_empty() {
            anyhow::bail!("TELEGRAM_BOT_TOKEN is empty");
        }
        Ok(SecretString::new(token))
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T> {
        // The token is part of the URL; keep it out of error messages.
        let url = format!("{}/bot{}/{}", self.base_url, self.token.expose_secret(), method);
        let resp: TgResponse<T> = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("telegram {} request failed: {}", method, e.without_url()))?
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("telegram {} response decode failed: {}", method, e.without_url()))?;

        if !resp.ok {
            anyhow::bail!(
                "telegram {} failed: {}",
                method,
                resp.description.unwrap_or_else(|| "no description".into())
            );
        }
        resp.result.with_context(|| format!("telegram {} returned no result", method))
    }

    /// Long poll. `timeout_sec` is passed to Telegram, which holds the request open.
    pub async fn get_updates(&self, offset: i64, timeout_sec: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_sec,
                "allowed_updates": ["message", "callback_query"]
            }),
        )
        .await
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let _: bool = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": callback_query_id }))
            .await?;
        Ok(())
    }

    pub async fn set_my_commands(&self) -> Result<()> {
        let _: bool = self
            .call(
                "setMyCommands",
                &json!({
                    "commands": [
                        { "command": "menu", "description": "launch bot" },
                        { "command": "about", "description": "bot info" }
                    ]
                }),
            )
            .await?;
        Ok(())
    }

    fn message_payload(chat: ChatId, screen: &Screen) -> Value {
        let mut payload = json!({
            "chat_id": chat,
            "text": screen.text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = markup_json(&screen.markup) {
            payload["reply_markup"] = markup;
        }
        payload
    }
}

#[async_trait]
impl ChatTransport for TelegramApi {
    async fn send(&self, chat: ChatId, screen: &Screen) -> Result<MessageId> {
        let msg: Message = self
            .call("sendMessage", &Self::message_payload(chat, screen))
            .await?;
        Ok(msg.message_id)
    }

    async fn edit(&self, chat: ChatId, message: MessageId, screen: &Screen) -> Result<()> {
        let mut payload = Self::message_payload(chat, screen);
        payload["message_id"] = json!(message);
        // Returns the edited Message, or `true` for inline messages.
        let _: Value = self.call("editMessageText", &payload).await?;
        Ok(())
    }

    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<()> {
        let _: bool = self
            .call("deleteMessage", &json!({ "chat_id": chat, "message_id": message }))
            .await?;
        Ok(())
    }
}
