//! Output channel: renders a bot response into one or more messages.
//!
//! The dispatch precedence lives in [`OutputChannel::send_response`]; concrete
//! channels only override the primitives they can do better than plain text.

use crate::channels::message::{button_to_string, BotResponse, Button, Element};
use async_trait::async_trait;

/// Errors raised while rendering or delivering output.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// The channel does not provide a primitive it was asked to use.
    #[error("output channel {channel} does not implement {capability}")]
    NotImplemented {
        channel: String,
        capability: &'static str,
    },

    /// A transport-backed channel could not hand the message to its remote end.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A place agent output is sent to (HTTP response buffer, queue, chat platform).
#[async_trait]
pub trait OutputChannel: Send + Sync {
    /// Channel name (e.g. "collector", "queue").
    fn name(&self) -> &str;

    /// Render one logical response. Elements win over buttons, buttons over
    /// plain text; an image and an attachment are sent in addition to that.
    async fn send_response(
        &self,
        recipient_id: &str,
        response: &BotResponse,
    ) -> Result<(), OutputError> {
        if let Some(elements) = response.elements_if_present() {
            self.emit_elements(recipient_id, elements).await?;
        } else if let Some(buttons) = response.buttons_if_present() {
            self.emit_text_with_buttons(recipient_id, response.text_if_present(), buttons)
                .await?;
        } else if let Some(text) = response.text_if_present() {
            self.emit_text(recipient_id, text).await?;
        }

        if let Some(image) = response.image_if_present() {
            self.emit_image(recipient_id, image).await?;
        }
        if let Some(attachment) = response.attachment_if_present() {
            self.emit_attachment(recipient_id, attachment).await?;
        }
        Ok(())
    }

    /// Send plain text. Every channel has to provide this.
    async fn emit_text(&self, _recipient_id: &str, _text: &str) -> Result<(), OutputError> {
        Err(OutputError::NotImplemented {
            channel: self.name().to_string(),
            capability: "emit_text",
        })
    }

    /// Send an image. Default posts the URL as text.
    async fn emit_image(&self, recipient_id: &str, image_url: &str) -> Result<(), OutputError> {
        self.emit_text(recipient_id, &format!("Image: {}", image_url))
            .await
    }

    /// Send an attachment. Default posts it as text.
    async fn emit_attachment(
        &self,
        recipient_id: &str,
        attachment: &str,
    ) -> Result<(), OutputError> {
        self.emit_text(recipient_id, &format!("Attachment: {}", attachment))
            .await
    }

    /// Send text with buttons. Default posts the text, then one line per button.
    async fn emit_text_with_buttons(
        &self,
        recipient_id: &str,
        text: Option<&str>,
        buttons: &[Button],
    ) -> Result<(), OutputError> {
        if let Some(text) = text {
            self.emit_text(recipient_id, text).await?;
        }
        for (idx, button) in buttons.iter().enumerate() {
            self.emit_text(recipient_id, &button_to_string(button, idx))
                .await?;
        }
        Ok(())
    }

    /// Send grouped elements, each as `"<title> : <subtitle>"` with its buttons.
    async fn emit_elements(
        &self,
        recipient_id: &str,
        elements: &[Element],
    ) -> Result<(), OutputError> {
        for element in elements {
            let text = format!("{} : {}", element.title, element.subtitle);
            self.emit_text_with_buttons(recipient_id, Some(&text), &element.buttons)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Text-only channel that records every line it is asked to send.
    #[derive(Default)]
    struct LineChannel {
        lines: Mutex<Vec<String>>,
    }

    impl LineChannel {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OutputChannel for LineChannel {
        fn name(&self) -> &str {
            "lines"
        }

        async fn emit_text(&self, _recipient_id: &str, text: &str) -> Result<(), OutputError> {
            self.lines.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Mute;

    #[async_trait]
    impl OutputChannel for Mute {
        fn name(&self) -> &str {
            "mute"
        }
    }

    #[tokio::test]
    async fn buttons_fall_back_to_numbered_lines() {
        let ch = LineChannel::default();
        let response = BotResponse::text("Continue?")
            .with_buttons(vec![Button::new("Yes", "/affirm"), Button::new("No", "/deny")]);
        ch.send_response("u1", &response).await.unwrap();
        assert_eq!(ch.lines(), vec!["Continue?", "1: Yes (/affirm)", "2: No (/deny)"]);
    }

    #[tokio::test]
    async fn elements_take_precedence_over_buttons_and_text() {
        let ch = LineChannel::default();
        let response = BotResponse::text("ignored")
            .with_buttons(vec![Button::new("ignored", "/x")])
            .with_elements(vec![
                Element {
                    title: "Hotel A".into(),
                    subtitle: "cheap".into(),
                    buttons: vec![Button::new("Book", "/book_a")],
                },
                Element {
                    title: "Hotel B".into(),
                    subtitle: "central".into(),
                    buttons: vec![],
                },
            ]);
        ch.send_response("u1", &response).await.unwrap();
        assert_eq!(
            ch.lines(),
            vec!["Hotel A : cheap", "1: Book (/book_a)", "Hotel B : central"]
        );
    }

    #[tokio::test]
    async fn image_and_attachment_follow_the_primary_branch() {
        let ch = LineChannel::default();
        let response = BotResponse::text("look")
            .with_image("http://img/cat.png")
            .with_attachment("report.pdf");
        ch.send_response("u1", &response).await.unwrap();
        assert_eq!(
            ch.lines(),
            vec!["look", "Image: http://img/cat.png", "Attachment: report.pdf"]
        );
    }

    #[tokio::test]
    async fn empty_response_sends_nothing() {
        let ch = LineChannel::default();
        ch.send_response("u1", &BotResponse::default()).await.unwrap();
        assert!(ch.lines().is_empty());
    }

    #[tokio::test]
    async fn missing_emit_text_is_a_capability_error() {
        let err = Mute
            .send_response("u1", &BotResponse::default().with_image("http://x"))
            .await
            .unwrap_err();
        match err {
            OutputError::NotImplemented {
                channel,
                capability,
            } => {
                assert_eq!(channel, "mute");
                assert_eq!(capability, "emit_text");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
