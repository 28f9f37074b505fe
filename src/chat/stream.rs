//! The caller-facing fragment stream.
//!
//! Wraps the provider's event receiver into a lazy, finite, non-restartable
//! sequence of text fragments. An `Err` item is terminal and distinguishes
//! truncation from normal end-of-stream. Dropping the stream closes the
//! receiver, which the provider observes and uses to stop upstream reads.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use super::error::ChatError;
use super::provider::StreamEvent;

pub type FragmentResult = Result<String, ChatError>;

/// Streaming reply from the model, one text fragment at a time.
///
/// Each poll suspends until the next fragment arrives, the stream ends, or
/// a deadline expires. Consumed exactly once.
pub struct ChatStream {
    inner: Pin<Box<dyn Stream<Item = FragmentResult> + Send>>,
}

impl ChatStream {
    pub(crate) fn new(
        rx: mpsc::Receiver<StreamEvent>,
        first_fragment_timeout: Duration,
        stream_deadline: Duration,
    ) -> Self {
        let inner = async_stream::stream! {
            let mut rx = rx;
            let hard_deadline = Instant::now() + stream_deadline;
            let mut first = true;

            loop {
                let remaining = hard_deadline.saturating_duration_since(Instant::now());
                let budget = if first {
                    remaining.min(first_fragment_timeout)
                } else {
                    remaining
                };
                if budget.is_zero() {
                    yield Err(ChatError::StreamInterrupted(
                        "stream deadline exceeded".into(),
                    ));
                    return;
                }

                match tokio::time::timeout(budget, rx.recv()).await {
                    Ok(Some(StreamEvent::TextDelta(text))) => {
                        first = false;
                        yield Ok(text);
                    }
                    Ok(Some(StreamEvent::Usage(usage))) => {
                        debug!(
                            input_tokens = usage.input_tokens,
                            output_tokens = usage.output_tokens,
                            "generation usage"
                        );
                    }
                    Ok(Some(StreamEvent::Done)) => return,
                    Ok(Some(StreamEvent::Error(message))) => {
                        yield Err(ChatError::StreamInterrupted(message));
                        return;
                    }
                    // Producer went away without a terminal event; report
                    // the truncation rather than faking a clean end
                    Ok(None) => {
                        yield Err(ChatError::StreamInterrupted(
                            "generation stream closed without completing".into(),
                        ));
                        return;
                    }
                    Err(_) => {
                        let message = if first {
                            "timed out waiting for first fragment"
                        } else {
                            "stream deadline exceeded"
                        };
                        yield Err(ChatError::StreamInterrupted(message.into()));
                        return;
                    }
                }
            }
        };

        Self {
            inner: Box::pin(inner),
        }
    }

    /// Drain the stream, concatenating fragments. Partial text is returned
    /// alongside the error when the stream is truncated.
    pub async fn collect_text(mut self) -> (String, Option<ChatError>) {
        use futures::StreamExt;

        let mut text = String::new();
        while let Some(item) = self.next().await {
            match item {
                Ok(fragment) => text.push_str(&fragment),
                Err(e) => return (text, Some(e)),
            }
        }
        (text, None)
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream").finish_non_exhaustive()
    }
}

impl Stream for ChatStream {
    type Item = FragmentResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
