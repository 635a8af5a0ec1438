//! Response bridge: runs the dialogue logic for one request and hands its
//! output to the caller, either all at once or as a stream.

use crate::channels::collecting::CollectingOutputChannel;
use crate::channels::inbound::{MessageHandler, UserMessage};
use crate::channels::message::RenderedMessage;
use crate::channels::output::OutputChannel;
use crate::channels::queue::{QueueItem, QueueOutputChannel};
use futures_util::{FutureExt, Stream};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::sync::mpsc;

/// Run the handler against a collecting channel and return everything it sent, in order.
/// A handler that fails or panics yields an error and its partial output is dropped.
pub async fn collect_response(
    on_new_message: &dyn MessageHandler,
    text: Option<String>,
    sender_id: Option<String>,
) -> anyhow::Result<Vec<RenderedMessage>> {
    let collector = Arc::new(CollectingOutputChannel::new());
    let output: Arc<dyn OutputChannel> = collector.clone();
    AssertUnwindSafe(on_new_message.handle(UserMessage::new(text, Some(output), sender_id)))
        .catch_unwind()
        .await
        .map_err(|payload| anyhow::anyhow!("message handler panicked: {}", panic_message(&*payload)))??;
    Ok(collector.messages())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Start the handler on its own task, producing into a queue, and return a
/// stream of its messages. The stream ends once the handler has finished,
/// whether it succeeded, failed or panicked; messages sent before a failure
/// are still delivered.
///
/// Must be called from within a tokio runtime.
pub fn stream_response(
    on_new_message: Arc<dyn MessageHandler>,
    text: Option<String>,
    sender_id: Option<String>,
) -> ResponseStream {
    let (queue, receiver) = mpsc::unbounded_channel();
    let output: Arc<dyn OutputChannel> = Arc::new(QueueOutputChannel::with_queue(queue.clone()));
    let message = UserMessage::new(text, Some(output), sender_id);
    tokio::spawn(run_worker(on_new_message, message, DoneOnDrop(queue)));
    ResponseStream::new(receiver)
}

async fn run_worker(on_new_message: Arc<dyn MessageHandler>, message: UserMessage, done: DoneOnDrop) {
    let _done = done;
    let sender_id = message.sender_id().to_string();
    log::debug!("stream worker started for sender {}", sender_id);
    if let Err(e) = on_new_message.handle(message).await {
        log::warn!("message handler failed for sender {}: {:#}", sender_id, e);
    }
}

/// Pushes the end marker when dropped, so the reader terminates on every exit
/// path of the worker, unwinding included.
struct DoneOnDrop(mpsc::UnboundedSender<QueueItem>);

impl Drop for DoneOnDrop {
    fn drop(&mut self) {
        let _ = self.0.send(QueueItem::Done);
    }
}

/// Reader side of a streamed response: yields messages in the order the
/// handler produced them and ends at the end marker. Not restartable.
#[derive(Debug)]
pub struct ResponseStream {
    queue: mpsc::UnboundedReceiver<QueueItem>,
    done: bool,
}

impl ResponseStream {
    pub fn new(queue: mpsc::UnboundedReceiver<QueueItem>) -> Self {
        Self { queue, done: false }
    }

    /// True once the end marker has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl Stream for ResponseStream {
    type Item = RenderedMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        match ready!(self.queue.poll_recv(cx)) {
            Some(QueueItem::Message(message)) => Poll::Ready(Some(message)),
            // A closed queue without a marker means every producer is gone; nothing more can come.
            Some(QueueItem::Done) | None => {
                self.done = true;
                self.queue.close();
                Poll::Ready(None)
            }
        }
    }
}
