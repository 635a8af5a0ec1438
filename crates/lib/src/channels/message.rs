//! Message model: what the dialogue hands to a channel and what a channel renders.

use serde::{Deserialize, Serialize};

/// A quick-reply button: shown as `title`, sends `payload` back when chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub title: String,
    pub payload: String,
}

impl Button {
    pub fn new(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// Grouped content (e.g. a carousel card): title, subtitle and its own buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub title: String,
    pub subtitle: String,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

/// One logical response from the dialogue logic, before rendering.
///
/// A field counts as present only when it is set and non-empty; see the accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Button>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Element>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl BotResponse {
    /// Plain text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = Some(buttons);
        self
    }

    pub fn with_elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    pub fn text_if_present(&self) -> Option<&str> {
        self.text.as_deref().filter(|s| !s.is_empty())
    }

    pub fn buttons_if_present(&self) -> Option<&[Button]> {
        self.buttons.as_deref().filter(|b| !b.is_empty())
    }

    pub fn elements_if_present(&self) -> Option<&[Element]> {
        self.elements.as_deref().filter(|e| !e.is_empty())
    }

    pub fn image_if_present(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.is_empty())
    }

    pub fn attachment_if_present(&self) -> Option<&str> {
        self.attachment.as_deref().filter(|s| !s.is_empty())
    }
}

/// One unit of rendered output addressed to a recipient.
///
/// Built only through the constructors below, so at least one of text, image,
/// buttons or attachment is always set. Unset fields are left out of the JSON.
/// Deserializing enforces the same rule and rejects content-less messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RenderedMessageWire")]
pub struct RenderedMessage {
    recipient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buttons: Option<Vec<Button>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<String>,
}

/// Wire shape of [`RenderedMessage`] before the content check.
#[derive(Deserialize)]
struct RenderedMessageWire {
    recipient_id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    buttons: Option<Vec<Button>>,
    #[serde(default)]
    attachment: Option<String>,
}

impl TryFrom<RenderedMessageWire> for RenderedMessage {
    type Error = String;

    fn try_from(wire: RenderedMessageWire) -> Result<Self, Self::Error> {
        if wire.text.is_none()
            && wire.image.is_none()
            && wire.buttons.is_none()
            && wire.attachment.is_none()
        {
            return Err(format!(
                "message for {} has no text, image, buttons or attachment",
                wire.recipient_id
            ));
        }
        Ok(Self {
            recipient_id: wire.recipient_id,
            text: wire.text,
            image: wire.image,
            buttons: wire.buttons,
            attachment: wire.attachment,
        })
    }
}

impl RenderedMessage {
    fn empty(recipient_id: &str) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            text: None,
            image: None,
            buttons: None,
            attachment: None,
        }
    }

    pub fn text(recipient_id: &str, text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::empty(recipient_id)
        }
    }

    /// Text plus buttons. The text may be absent; the buttons are always kept.
    pub fn text_with_buttons(recipient_id: &str, text: Option<&str>, buttons: &[Button]) -> Self {
        Self {
            text: text.map(str::to_string),
            buttons: Some(buttons.to_vec()),
            ..Self::empty(recipient_id)
        }
    }

    pub fn image(recipient_id: &str, image_url: &str) -> Self {
        Self {
            image: Some(image_url.to_string()),
            ..Self::empty(recipient_id)
        }
    }

    pub fn attachment(recipient_id: &str, attachment: &str) -> Self {
        Self {
            attachment: Some(attachment.to_string()),
            ..Self::empty(recipient_id)
        }
    }

    pub fn recipient_id(&self) -> &str {
        &self.recipient_id
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn buttons(&self) -> Option<&[Button]> {
        self.buttons.as_deref()
    }

    pub fn attachment_content(&self) -> Option<&str> {
        self.attachment.as_deref()
    }
}

/// Text form of a button for text-only channels: `"<idx + 1>: <title> (<payload>)"`.
pub fn button_to_string(button: &Button, idx: usize) -> String {
    format!("{}: {} ({})", idx + 1, button.title, button.payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_string_is_one_based() {
        let b = Button::new("Yes", "/affirm");
        assert_eq!(button_to_string(&b, 0), "1: Yes (/affirm)");
        assert_eq!(button_to_string(&b, 2), "3: Yes (/affirm)");
    }

    #[test]
    fn text_only_message_omits_other_keys() {
        let m = RenderedMessage::text("u1", "hello");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json, serde_json::json!({"recipient_id": "u1", "text": "hello"}));
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("image"));
        assert!(!obj.contains_key("buttons"));
        assert!(!obj.contains_key("attachment"));
    }

    #[test]
    fn buttons_without_text_keep_buttons_only() {
        let m = RenderedMessage::text_with_buttons("u1", None, &[Button::new("A", "/a")]);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(
            json,
            r#"{"recipient_id":"u1","buttons":[{"title":"A","payload":"/a"}]}"#
        );
    }

    #[test]
    fn content_less_message_does_not_deserialize() {
        let err = serde_json::from_str::<RenderedMessage>(r#"{"recipient_id": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("has no text"), "{err}");
        let err = serde_json::from_str::<RenderedMessage>(r#"{"recipient_id": "x", "text": null}"#)
            .unwrap_err();
        assert!(err.to_string().contains("has no text"), "{err}");
    }

    #[test]
    fn serialized_messages_read_back() {
        let m = RenderedMessage::text_with_buttons("u1", Some("ok?"), &[Button::new("Yes", "/y")]);
        let back: RenderedMessage =
            serde_json::from_str(&serde_json::to_string(&m).unwrap()).unwrap();
        assert_eq!(back, m);
        let back: RenderedMessage =
            serde_json::from_str(r#"{"recipient_id": "u1", "image": "http://i"}"#).unwrap();
        assert_eq!(back, RenderedMessage::image("u1", "http://i"));
    }

    #[test]
    fn bot_response_treats_empty_fields_as_absent() {
        let r: BotResponse =
            serde_json::from_str(r#"{"text": "", "buttons": [], "image": "http://x/y.png"}"#)
                .unwrap();
        assert_eq!(r.text_if_present(), None);
        assert_eq!(r.buttons_if_present(), None);
        assert_eq!(r.elements_if_present(), None);
        assert_eq!(r.image_if_present(), Some("http://x/y.png"));
    }

    #[test]
    fn element_buttons_default_to_empty() {
        let e: Element = serde_json::from_str(r#"{"title": "t", "subtitle": "s"}"#).unwrap();
        assert!(e.buttons.is_empty());
    }
}
