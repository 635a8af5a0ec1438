//! Collecting output channel: keeps rendered messages in memory instead of delivering them.

use crate::channels::message::{Button, RenderedMessage};
use crate::channels::output::{OutputChannel, OutputError};
use async_trait::async_trait;
use std::sync::Mutex;

/// Channels that store each rendered message somewhere (a list, a queue)
/// rather than talking to a remote transport. They all render the same way:
/// text split into paragraphs, buttons kept together with their text, images
/// and attachments as their own messages.
pub trait CollectMessage: Send + Sync {
    /// Name reported through [`OutputChannel::name`].
    const NAME: &'static str;

    fn persist(&self, message: RenderedMessage);
}

#[async_trait]
impl<C: CollectMessage> OutputChannel for C {
    fn name(&self) -> &str {
        C::NAME
    }

    async fn emit_text(&self, recipient_id: &str, text: &str) -> Result<(), OutputError> {
        for part in text.split("\n\n") {
            self.persist(RenderedMessage::text(recipient_id, part));
        }
        Ok(())
    }

    async fn emit_image(&self, recipient_id: &str, image_url: &str) -> Result<(), OutputError> {
        self.persist(RenderedMessage::image(recipient_id, image_url));
        Ok(())
    }

    async fn emit_attachment(
        &self,
        recipient_id: &str,
        attachment: &str,
    ) -> Result<(), OutputError> {
        self.persist(RenderedMessage::attachment(recipient_id, attachment));
        Ok(())
    }

    async fn emit_text_with_buttons(
        &self,
        recipient_id: &str,
        text: Option<&str>,
        buttons: &[Button],
    ) -> Result<(), OutputError> {
        self.persist(RenderedMessage::text_with_buttons(recipient_id, text, buttons));
        Ok(())
    }
}

/// Output channel that appends messages to an ordered list (buffered responses).
#[derive(Debug, Default)]
pub struct CollectingOutputChannel {
    messages: Mutex<Vec<RenderedMessage>>,
}

impl CollectingOutputChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages so far, in the order they were sent.
    pub fn messages(&self) -> Vec<RenderedMessage> {
        self.lock().clone()
    }

    /// Last message sent, if any.
    pub fn latest(&self) -> Option<RenderedMessage> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RenderedMessage>> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CollectMessage for CollectingOutputChannel {
    const NAME: &'static str = "collector";

    fn persist(&self, message: RenderedMessage) {
        self.lock().push(message);
    }
}
