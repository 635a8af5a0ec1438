//! Inbound message from a channel: handed to the dialogue logic together with
//! the output channel its replies should go to.

use crate::channels::collecting::CollectingOutputChannel;
use crate::channels::message::BotResponse;
use crate::channels::output::{OutputChannel, OutputError};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Sender id used when a channel does not know who is talking.
pub const DEFAULT_SENDER_ID: &str = "default";

/// Parsed understanding of a message (intent, entities, ...), as produced by an NLU step.
pub type ParseData = serde_json::Map<String, serde_json::Value>;

/// A user message plus the output channel responses should be sent to.
pub struct UserMessage {
    text: Option<String>,
    output_channel: Arc<dyn OutputChannel>,
    sender_id: String,
    parse_data: Option<ParseData>,
}

impl UserMessage {
    /// Without an output channel the message gets a fresh collecting channel;
    /// without a sender it is attributed to [`DEFAULT_SENDER_ID`].
    pub fn new(
        text: Option<String>,
        output_channel: Option<Arc<dyn OutputChannel>>,
        sender_id: Option<String>,
    ) -> Self {
        Self {
            text,
            output_channel: output_channel
                .unwrap_or_else(|| Arc::new(CollectingOutputChannel::new())),
            sender_id: sender_id.unwrap_or_else(|| DEFAULT_SENDER_ID.to_string()),
            parse_data: None,
        }
    }

    pub fn with_parse_data(mut self, parse_data: ParseData) -> Self {
        self.parse_data = Some(parse_data);
        self
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn output_channel(&self) -> &Arc<dyn OutputChannel> {
        &self.output_channel
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    pub fn parse_data(&self) -> Option<&ParseData> {
        self.parse_data.as_ref()
    }

    /// Send a response back to this message's sender through its output channel.
    pub async fn reply(&self, response: &BotResponse) -> Result<(), OutputError> {
        self.output_channel
            .send_response(&self.sender_id, response)
            .await
    }
}

impl fmt::Debug for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserMessage")
            .field("text", &self.text)
            .field("output_channel", &self.output_channel.name())
            .field("sender_id", &self.sender_id)
            .field("parse_data", &self.parse_data)
            .finish()
    }
}

/// Dialogue logic as seen by the channels: takes a message and replies
/// through its output channel as a side effect.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: UserMessage) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> MessageHandler for F
where
    F: Fn(UserMessage) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, message: UserMessage) -> anyhow::Result<()> {
        (self)(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sender_and_channel() {
        let msg = UserMessage::new(Some("hi".into()), None, None);
        assert_eq!(msg.sender_id(), DEFAULT_SENDER_ID);
        assert_eq!(msg.output_channel().name(), "collector");
        assert_eq!(msg.text(), Some("hi"));
        assert!(msg.parse_data().is_none());
    }

    #[test]
    fn keeps_parse_data() {
        let mut data = ParseData::new();
        data.insert("intent".into(), serde_json::json!({"name": "greet"}));
        let msg = UserMessage::new(None, None, Some("u7".into())).with_parse_data(data);
        assert_eq!(msg.sender_id(), "u7");
        assert_eq!(msg.text(), None);
        assert_eq!(
            msg.parse_data().and_then(|d| d.get("intent")),
            Some(&serde_json::json!({"name": "greet"}))
        );
    }

    #[tokio::test]
    async fn closures_are_handlers() {
        let collector = Arc::new(CollectingOutputChannel::new());
        let output: Arc<dyn OutputChannel> = collector.clone();
        let handler = |msg: UserMessage| async move {
            msg.reply(&BotResponse::text("pong")).await?;
            anyhow::Ok(())
        };
        handler
            .handle(UserMessage::new(Some("ping".into()), Some(output), Some("u1".into())))
            .await
            .unwrap();
        assert_eq!(
            collector.latest().and_then(|m| m.text_content().map(str::to_string)),
            Some("pong".to_string())
        );
    }
}
