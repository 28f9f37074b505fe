//! Gemini streaming provider
//!
//! Calls streamGenerateContent with alt=sse and re-emits the token stream
//! as StreamEvents. The HTTP exchange is established before any event is
//! produced, so auth/network/quota rejections surface synchronously; once
//! streaming, a dropped connection terminates the sequence with a terminal
//! error event and whatever was already delivered stands.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::chat::error::ChatError;
use crate::chat::request::MessageRole;
use crate::config::CONFIG;

use super::{GenerationProvider, GenerationRequest, StreamEvent, TokenUsage};

/// Gemini provider over the generativelanguage REST API
pub struct GeminiProvider {
    client: HttpClient,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: HttpClient::new(),
            api_key,
            base_url: CONFIG.gemini_base_url.clone(),
            model: CONFIG.gemini_model.clone(),
        }
    }

    /// Create from the GEMINI_API_KEY environment variable
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY not set"))?;
        Ok(Self::new(api_key))
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, self.model, self.api_key
        )
    }

    /// Map the conversation onto Gemini contents
    fn build_contents(request: &GenerationRequest) -> Vec<GeminiContent> {
        request
            .messages
            .iter()
            .map(|msg| GeminiContent {
                role: match msg.role {
                    MessageRole::User => "user",
                    MessageRole::Model => "model",
                }
                .to_string(),
                parts: vec![GeminiPart {
                    text: msg.content.clone(),
                }],
            })
            .collect()
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn stream_generate(
        &self,
        request: GenerationRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>, ChatError> {
        let api_request = GeminiStreamRequest {
            contents: Self::build_contents(&request),
            system_instruction: Some(GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: request.system,
                }],
            }),
            generation_config: Some(GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            }),
        };

        // Establish the exchange before emitting anything: failures here
        // mean zero fragments were ever produced
        let response = self
            .client
            .post(self.stream_url())
            .json(&api_request)
            .timeout(Duration::from_secs(CONFIG.request_timeout))
            .send()
            .await
            .map_err(|e| ChatError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::UpstreamUnavailable(format!(
                "Gemini API error: {status} - {body}"
            )));
        }

        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Gemini stream dropped: {e}");
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Parse complete SSE data lines out of the buffer
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let frame: GeminiStreamResponse = match serde_json::from_str(data) {
                        Ok(frame) => frame,
                        Err(e) => {
                            debug!("skipping unparseable frame: {e}");
                            continue;
                        }
                    };

                    if let Some(error) = frame.error {
                        let _ = tx.send(StreamEvent::Error(error.message)).await;
                        return;
                    }
                    for candidate in frame.candidates.unwrap_or_default() {
                        for part in candidate.content.parts {
                            let Some(text) = part.text else { continue };
                            if text.is_empty() {
                                continue;
                            }
                            if tx.send(StreamEvent::TextDelta(text)).await.is_err() {
                                // Consumer abandoned the stream; stop reading
                                // so the connection is released
                                return;
                            }
                        }
                    }
                    if let Some(usage) = frame.usage_metadata {
                        let _ = tx
                            .send(StreamEvent::Usage(TokenUsage {
                                input_tokens: usage.prompt_token_count.unwrap_or(0),
                                output_tokens: usage.candidates_token_count.unwrap_or(0),
                            }))
                            .await;
                    }
                }
            }

            let _ = tx.send(StreamEvent::Done).await;
        });

        Ok(rx)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct GeminiStreamRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Clone)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Clone)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiStreamResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    // Final frames may carry finishReason without content
    #[serde(default)]
    content: GeminiCandidateContent,
}

#[derive(Deserialize, Default)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u32>,
}

#[derive(Deserialize)]
struct GeminiError {
    message: String,
}
