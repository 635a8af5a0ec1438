//! Telegram output channel: delivers rendered responses via the Bot API.

use crate::channels::message::Button;
use crate::channels::output::{OutputChannel, OutputError};
use crate::config::{resolve_telegram_token, ChannelsConfig};
use async_trait::async_trait;
use serde_json::json;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Sends to a Telegram chat; the recipient id is the chat id.
/// Buttons become an inline keyboard, images are sent as photos.
pub struct TelegramOutput {
    token: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramOutput {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from config; None when no bot token is configured (config or TELEGRAM_BOT_TOKEN).
    pub fn from_config(channels: &ChannelsConfig) -> Option<Self> {
        let token = resolve_telegram_token(channels)?;
        let output = Self::new(token);
        Some(match channels.telegram.api_base.as_deref() {
            Some(base) if !base.trim().is_empty() => output.with_api_base(base.trim()),
            _ => output,
        })
    }

    /// Override the Bot API base URL (for tests or a local Bot API server).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<(), OutputError> {
        let url = format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token,
            method
        );
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OutputError::Delivery(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(OutputError::Delivery(format!(
                "{} failed: {} {}",
                method, status, body
            )));
        }
        Ok(())
    }
}

fn inline_keyboard(buttons: &[Button]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = buttons
        .iter()
        .map(|b| json!([{ "text": b.title, "callback_data": b.payload }]))
        .collect();
    json!({ "inline_keyboard": rows })
}

#[async_trait]
impl OutputChannel for TelegramOutput {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn emit_text(&self, recipient_id: &str, text: &str) -> Result<(), OutputError> {
        self.call("sendMessage", json!({ "chat_id": recipient_id, "text": text }))
            .await
    }

    async fn emit_image(&self, recipient_id: &str, image_url: &str) -> Result<(), OutputError> {
        self.call("sendPhoto", json!({ "chat_id": recipient_id, "photo": image_url }))
            .await
    }

    async fn emit_text_with_buttons(
        &self,
        recipient_id: &str,
        text: Option<&str>,
        buttons: &[Button],
    ) -> Result<(), OutputError> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": recipient_id,
                "text": text.unwrap_or_default(),
                "reply_markup": inline_keyboard(buttons),
            }),
        )
        .await
    }
}
