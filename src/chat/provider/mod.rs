//! Provider abstraction for the generation backend
//!
//! Gemini is the production backend. The trait is the seam that lets
//! tests substitute a scripted provider with zero network access.

mod gemini;

pub use gemini::GeminiProvider;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::ChatError;
use super::request::ChatMessage;

/// Unified trait for streaming generation backends
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Open a streaming generation call.
    ///
    /// Fails with `UpstreamUnavailable` if the call cannot be established
    /// (auth, network, quota); after a successful open, events arrive on
    /// the receiver until `Done` or a terminal `Error`. Dropping the
    /// receiver must stop upstream reads.
    async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ChatError>;
}

/// One generation call: assembled system prompt plus conversation
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Events emitted while streaming
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// One fragment of generated text
    TextDelta(String),
    /// Token accounting, reported near the end of the stream
    Usage(TokenUsage),
    /// Normal end of stream
    Done,
    /// Terminal mid-stream failure; fragments already delivered stand
    Error(String),
}

/// Token usage reported by the upstream response
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}
