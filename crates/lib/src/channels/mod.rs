//! Message channels.
//!
//! Input channels receive user messages (e.g. the REST webhook) and hand them
//! to the dialogue logic; output channels render what the dialogue sends back.
//! The stream module bridges the two for buffered and streamed responses.

mod collecting;
mod inbound;
mod input;
mod message;
mod output;
mod queue;
mod rest;
mod stream;
mod telegram;

pub use collecting::{CollectMessage, CollectingOutputChannel};
pub use inbound::{MessageHandler, ParseData, UserMessage, DEFAULT_SENDER_ID};
pub use input::{join_path, register, InputChannel};
pub use message::{button_to_string, BotResponse, Button, Element, RenderedMessage};
pub use output::{OutputChannel, OutputError};
pub use queue::{QueueItem, QueueOutputChannel};
pub use rest::{RestInput, WebhookRequest};
pub use stream::{collect_response, stream_response, ResponseStream};
pub use telegram::TelegramOutput;
