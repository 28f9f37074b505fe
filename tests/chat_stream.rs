// tests/chat_stream.rs
// Chat pipeline behavior against a scripted provider: validation gating,
// pre-stream failure, mid-stream truncation, deadlines, cancellation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use common::{Script, ScriptedProvider};
use gabai::chat::provider::StreamEvent;
use gabai::chat::{ChatError, ChatRequest, ChatService};

fn service_with(script: Script) -> (ChatService, Arc<ScriptedProvider>) {
    let provider = Arc::new(ScriptedProvider::new(script));
    let service = ChatService::with_timeouts(
        provider.clone(),
        Duration::from_secs(2),
        Duration::from_secs(5),
    );
    (service, provider)
}

fn typed_request() -> ChatRequest {
    ChatRequest::from_value(common::valid_body()).unwrap()
}

#[tokio::test]
async fn invalid_request_never_reaches_the_provider() {
    let (service, provider) = service_with(Script::Events(vec![]));

    // Unknown role fails at the boundary
    let err = ChatRequest::from_value(serde_json::json!({
        "messages": [{ "role": "admin", "content": "hello" }],
        "monthlyIncome": 100.0,
    }))
    .unwrap_err();
    assert!(matches!(err, ChatError::Validation { .. }));

    // Semantic failure on a typed request is caught by the service itself
    let mut request = typed_request();
    request.monthly_income = -1.0;
    let err = service.chat(request).await.unwrap_err();
    assert!(matches!(err, ChatError::Validation { .. }));

    assert_eq!(provider.call_count(), 0, "no generation call may happen");
}

#[tokio::test]
async fn upstream_rejection_yields_no_fragments() {
    let (service, provider) =
        service_with(Script::FailBeforeStream("quota exhausted".into()));

    let err = service.chat(typed_request()).await.unwrap_err();

    assert!(matches!(err, ChatError::UpstreamUnavailable(_)));
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn happy_path_concatenates_fragments() {
    let (service, _provider) = service_with(Script::Events(vec![
        StreamEvent::TextDelta("Sa 8% flat tax, ".into()),
        StreamEvent::TextDelta("ang estimate mo ay ".into()),
        StreamEvent::TextDelta("8% ng ₱50,000.".into()),
        StreamEvent::Done,
    ]));

    let stream = service.chat(typed_request()).await.unwrap();
    let (text, error) = stream.collect_text().await;

    assert_eq!(text, "Sa 8% flat tax, ang estimate mo ay 8% ng ₱50,000.");
    assert!(error.is_none());
}

#[tokio::test]
async fn mid_stream_failure_preserves_delivered_fragments() {
    let (service, _provider) = service_with(Script::Events(vec![
        StreamEvent::TextDelta("Magandang ".into()),
        StreamEvent::TextDelta("araw".into()),
        StreamEvent::Error("connection reset by peer".into()),
    ]));

    let mut stream = service.chat(typed_request()).await.unwrap();

    let mut delivered = Vec::new();
    let mut terminal = None;
    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => delivered.push(fragment),
            Err(e) => {
                terminal = Some(e);
                break;
            }
        }
    }

    // Exactly the N fragments sent before the drop, then the error
    assert_eq!(delivered, vec!["Magandang ", "araw"]);
    assert_eq!(delivered.concat(), "Magandang araw");
    assert!(matches!(terminal, Some(ChatError::StreamInterrupted(_))));
    assert!(stream.next().await.is_none(), "error is terminal");
}

#[tokio::test]
async fn abandoned_stream_stops_upstream_reads() {
    let (service, provider) = service_with(Script::Paced {
        fragments: vec!["uno", "dos", "tres", "kuwatro", "singko"],
        delay: Duration::from_millis(20),
    });

    let mut stream = service.chat(typed_request()).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first, "uno");

    // Abandon consumption; the provider must observe the closed channel
    drop(stream);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let reads_after_drop = provider.upstream_read_count();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        provider.upstream_read_count(),
        reads_after_drop,
        "no further upstream reads after the consumer walked away"
    );
    // At most the fragment in flight when we dropped
    assert!(reads_after_drop <= 3, "got {reads_after_drop} reads");
}

#[tokio::test]
async fn stalled_upstream_hits_first_fragment_timeout() {
    let provider = Arc::new(ScriptedProvider::new(Script::Paced {
        fragments: vec!["late"],
        delay: Duration::from_secs(30),
    }));
    let service = ChatService::with_timeouts(
        provider,
        Duration::from_millis(50),
        Duration::from_secs(5),
    );

    let mut stream = service.chat(typed_request()).await.unwrap();
    let err = stream.next().await.unwrap().unwrap_err();

    assert!(matches!(err, ChatError::StreamInterrupted(_)));
    assert!(err.to_string().contains("first fragment"));
}
