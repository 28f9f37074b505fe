//! Streaming chat pipeline for Gabi, the GabAI tax and budgeting assistant
//!
//! Request flow: boundary validation → system prompt assembly → streaming
//! generation call. No persistence, caching, or retry lives in this path;
//! concurrent requests are independent and share only the HTTP client pool.

pub mod error;
pub mod prompt;
pub mod provider;
pub mod request;
pub mod stream;

pub use error::ChatError;
pub use request::{ChatMessage, ChatRequest, MessageRole, TaxPreference};
pub use stream::ChatStream;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::config::CONFIG;
use provider::{GenerationProvider, GenerationRequest};

/// Orchestrates one chat request end to end
pub struct ChatService {
    provider: Arc<dyn GenerationProvider>,
    first_fragment_timeout: Duration,
    stream_deadline: Duration,
}

impl ChatService {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self::with_timeouts(
            provider,
            Duration::from_secs(CONFIG.first_fragment_timeout),
            Duration::from_secs(CONFIG.stream_deadline),
        )
    }

    /// Override the stream deadlines; used by tests and embedders
    pub fn with_timeouts(
        provider: Arc<dyn GenerationProvider>,
        first_fragment_timeout: Duration,
        stream_deadline: Duration,
    ) -> Self {
        Self {
            provider,
            first_fragment_timeout,
            stream_deadline,
        }
    }

    /// Validate the request, assemble the system prompt, and open the
    /// reply stream.
    ///
    /// Validation failures return synchronously and the provider is never
    /// called. An upstream rejection before the first fragment surfaces
    /// here as `UpstreamUnavailable`; after that, the returned stream
    /// carries any terminal error.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatStream, ChatError> {
        request.validate()?;

        let request_id = Uuid::new_v4();
        let system = prompt::build_system_prompt(&request);

        info!(
            %request_id,
            provider = self.provider.name(),
            turns = request.messages.len(),
            tax_preference = ?request.tax_preference,
            "opening chat stream"
        );

        let rx = self
            .provider
            .stream_generate(GenerationRequest {
                system,
                messages: request.messages,
                temperature: CONFIG.temperature,
                max_output_tokens: CONFIG.max_output_tokens,
            })
            .await?;

        Ok(ChatStream::new(
            rx,
            self.first_fragment_timeout,
            self.stream_deadline,
        ))
    }
}
