//! Queue output channel: forwards each rendered message into a FIFO for a streaming reader.

use crate::channels::collecting::CollectMessage;
use crate::channels::message::RenderedMessage;
use tokio::sync::mpsc;

/// What travels through a response queue. `Done` marks the end of a response
/// and can never be confused with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueItem {
    Message(RenderedMessage),
    Done,
}

/// Output channel that renders like [`CollectingOutputChannel`](crate::channels::CollectingOutputChannel)
/// but pushes every message onto a queue as soon as it is produced.
#[derive(Debug, Clone)]
pub struct QueueOutputChannel {
    queue: mpsc::UnboundedSender<QueueItem>,
}

impl QueueOutputChannel {
    /// New channel with its own queue; the receiver is handed back to the caller.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QueueItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::with_queue(tx), rx)
    }

    /// Channel producing into an existing queue.
    pub fn with_queue(queue: mpsc::UnboundedSender<QueueItem>) -> Self {
        Self { queue }
    }
}

impl CollectMessage for QueueOutputChannel {
    const NAME: &'static str = "queue";

    fn persist(&self, message: RenderedMessage) {
        if self.queue.send(QueueItem::Message(message)).is_err() {
            log::debug!("queue output: reader gone, dropping message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::message::BotResponse;
    use crate::channels::output::OutputChannel;

    #[tokio::test]
    async fn messages_arrive_in_emission_order() {
        let (ch, mut rx) = QueueOutputChannel::new();
        ch.send_response("u1", &BotResponse::text("one\n\ntwo").with_image("http://i"))
            .await
            .unwrap();
        drop(ch);
        let mut got = Vec::new();
        while let Some(item) = rx.recv().await {
            got.push(item);
        }
        assert_eq!(
            got,
            vec![
                QueueItem::Message(RenderedMessage::text("u1", "one")),
                QueueItem::Message(RenderedMessage::text("u1", "two")),
                QueueItem::Message(RenderedMessage::image("u1", "http://i")),
            ]
        );
    }

    #[tokio::test]
    async fn closed_queue_drops_silently() {
        let (ch, rx) = QueueOutputChannel::new();
        drop(rx);
        ch.send_response("u1", &BotResponse::text("lost")).await.unwrap();
        assert_eq!(ch.name(), "queue");
    }
}
