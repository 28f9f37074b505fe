//! Request handlers for the chat API

use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;

use crate::chat::{ChatError, ChatRequest};
use crate::config::CONFIG;

use super::{API_VERSION, AppState};

/// Events sent to the client over SSE
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    /// Streaming text from Gabi
    TextDelta { delta: String },
    /// Stream complete
    Done,
    /// Terminal failure; text already delivered is not retracted
    Error { message: String },
}

pub async fn status_handler() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": API_VERSION,
        "model": CONFIG.gemini_model,
        "ts": chrono::Utc::now().timestamp(),
    }))
}

/// SSE streaming chat endpoint.
///
/// Validation failures are rejected with 400 before any upstream call and
/// upstream rejections map to 502. Once streaming has started, failures
/// arrive in-band as a terminal `error` event after whatever text was
/// already delivered.
pub async fn chat_stream_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<Value>)> {
    let request = ChatRequest::from_value(body)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e))?;

    let chat_stream = state.service.chat(request).await.map_err(|e| {
        let status = match e {
            ChatError::Validation { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        error_response(status, &e)
    })?;

    let stream = async_stream::stream! {
        let mut chat_stream = chat_stream;
        while let Some(item) = chat_stream.next().await {
            match item {
                Ok(delta) => {
                    yield Ok(sse_event(&ChatStreamEvent::TextDelta { delta }));
                }
                Err(e) => {
                    yield Ok(sse_event(&ChatStreamEvent::Error {
                        message: e.to_string(),
                    }));
                    return;
                }
            }
        }
        yield Ok(sse_event(&ChatStreamEvent::Done));
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn sse_event(event: &ChatStreamEvent) -> Event {
    Event::default().data(serde_json::to_string(event).unwrap_or_default())
}

fn error_response(status: StatusCode, error: &ChatError) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": error.to_string(),
        })),
    )
}
