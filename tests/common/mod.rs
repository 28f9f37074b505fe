// tests/common/mod.rs
// Scripted generation provider used by the integration tests. Stands in
// for Gemini behind the provider seam; no network anywhere.

#![allow(dead_code)] // Each test binary uses a subset of the helpers

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use gabai::chat::ChatError;
use gabai::chat::provider::{GenerationProvider, GenerationRequest, StreamEvent};

/// What the provider should do when the service calls it
#[derive(Clone)]
pub enum Script {
    /// Reject before any event, as if auth/network/quota failed
    FailBeforeStream(String),
    /// Replay a fixed event sequence as fast as the consumer takes it
    Events(Vec<StreamEvent>),
    /// Emit fragments on a fixed cadence, counting each upstream read
    Paced {
        fragments: Vec<&'static str>,
        delay: Duration,
    },
}

pub struct ScriptedProvider {
    script: Script,
    pub calls: Arc<AtomicUsize>,
    pub upstream_reads: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            upstream_reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn upstream_read_count(&self) -> usize {
        self.upstream_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn stream_generate(
        &self,
        _request: GenerationRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.script {
            Script::FailBeforeStream(reason) => {
                Err(ChatError::UpstreamUnavailable(reason.clone()))
            }
            Script::Events(events) => {
                let (tx, rx) = mpsc::channel(8);
                let events = events.clone();
                tokio::spawn(async move {
                    for event in events {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                });
                Ok(rx)
            }
            Script::Paced { fragments, delay } => {
                // Capacity 1 so an abandoned consumer is noticed on the
                // next send, like a real connection being torn down
                let (tx, rx) = mpsc::channel(1);
                let fragments = fragments.clone();
                let delay = *delay;
                let reads = self.upstream_reads.clone();
                tokio::spawn(async move {
                    for fragment in fragments {
                        tokio::time::sleep(delay).await;
                        reads.fetch_add(1, Ordering::SeqCst);
                        if tx.send(StreamEvent::TextDelta(fragment.into())).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx.send(StreamEvent::Done).await;
                });
                Ok(rx)
            }
        }
    }
}

/// A well-formed request body the way the mobile client sends it
pub fn valid_body() -> Value {
    json!({
        "messages": [
            { "role": "user", "content": "Magkano ang tax ko ngayong buwan?" },
        ],
        "monthlyIncome": 50000.0,
        "taxPreference": "8_percent",
    })
}
