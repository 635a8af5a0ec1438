//! REST input channel: a JSON webhook that answers with the bot's messages,
//! either as one JSON array or streamed one message per line.

use crate::channels::inbound::{MessageHandler, DEFAULT_SENDER_ID};
use crate::channels::input::InputChannel;
use crate::channels::stream::{collect_response, stream_response};
use crate::config::ChannelsConfig;
use axum::{
    body::{Body, Bytes},
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json,
};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Webhook body: `{ "sender": ..., "message": ... }`, both optional.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Generic HTTP input channel, the basis for custom chat frontends.
#[derive(Debug, Clone)]
pub struct RestInput {
    default_sender_id: String,
    url_prefix: Option<String>,
}

impl Default for RestInput {
    fn default() -> Self {
        Self {
            default_sender_id: DEFAULT_SENDER_ID.to_string(),
            url_prefix: None,
        }
    }
}

impl RestInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(channels: &ChannelsConfig) -> Self {
        Self {
            default_sender_id: channels.default_sender_id.clone(),
            url_prefix: channels
                .rest
                .url_prefix
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    /// Sender id for requests that do not name one.
    pub fn with_default_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.default_sender_id = sender_id.into();
        self
    }
}

impl InputChannel for RestInput {
    fn name(&self) -> &str {
        "rest"
    }

    fn url_prefix(&self) -> String {
        self.url_prefix
            .clone()
            .unwrap_or_else(|| self.name().to_string())
    }

    fn routes(&self, on_new_message: Arc<dyn MessageHandler>) -> Vec<(&'static str, MethodRouter)> {
        let default_sender_id = self.default_sender_id.clone();
        vec![
            ("/", get(health)),
            (
                "/webhook",
                post(move |query: Query<HashMap<String, String>>, body: Bytes| {
                    receive(on_new_message, default_sender_id, query, body)
                }),
            ),
        ]
    }
}

/// GET / — liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /webhook — run the handler for one message; `?stream=true` streams the replies.
async fn receive(
    on_new_message: Arc<dyn MessageHandler>,
    default_sender_id: String,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let request: WebhookRequest = if body.is_empty() {
        WebhookRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                log::debug!("rest webhook: invalid body: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("invalid request body: {}", e) })),
                )
                    .into_response();
            }
        }
    };
    let sender_id = request.sender.unwrap_or(default_sender_id);
    let stream = bool_arg(&params, "stream", false);
    log::debug!("rest webhook: message from {} (stream: {})", sender_id, stream);

    if stream {
        let lines = stream_response(on_new_message, request.message, Some(sender_id)).map(|m| {
            serde_json::to_string(&m).map(|mut line| {
                line.push('\n');
                line
            })
        });
        (
            [(header::CONTENT_TYPE, "text/event-stream")],
            Body::from_stream(lines),
        )
            .into_response()
    } else {
        match collect_response(on_new_message.as_ref(), request.message, Some(sender_id)).await {
            Ok(messages) => Json(messages).into_response(),
            Err(e) => {
                log::warn!("rest webhook: message handler failed: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": format!("{:#}", e) })),
                )
                    .into_response()
            }
        }
    }
}

/// Query flag: true only when the value is "true" (any case).
fn bool_arg(params: &HashMap<String, String>, name: &str, default: bool) -> bool {
    params
        .get(name)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn bool_arg_parses_like_a_flag() {
        let mut params = HashMap::new();
        assert!(!bool_arg(&params, "stream", false));
        assert!(bool_arg(&params, "stream", true));
        params.insert("stream".to_string(), "True".to_string());
        assert!(bool_arg(&params, "stream", false));
        params.insert("stream".to_string(), "1".to_string());
        assert!(!bool_arg(&params, "stream", true));
    }

    #[test]
    fn prefix_defaults_to_name() {
        assert_eq!(RestInput::new().url_prefix(), "rest");
        let mut config = Config::default();
        config.channels.rest.url_prefix = Some("chat".to_string());
        config.channels.default_sender_id = "anon".to_string();
        let rest = RestInput::from_config(&config.channels);
        assert_eq!(rest.url_prefix(), "chat");
        assert_eq!(rest.default_sender_id, "anon");
    }

    #[test]
    fn webhook_request_allows_nulls() {
        let r: WebhookRequest = serde_json::from_str(r#"{"sender": null}"#).unwrap();
        assert!(r.sender.is_none());
        assert!(r.message.is_none());
    }
}
