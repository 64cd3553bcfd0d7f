//! Streaming client for chat completion servers.
//!
//! [`ChatStreamService`] reads a server-sent-event body line by line and
//! forwards tokens, server-side artifacts and errors over a channel tagged
//! with the stream id, so a caller can drop messages from cancelled streams.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::artifact::Artifact;
use crate::core::message::{ChatMessage as HistoryMessage, Role};
use crate::core::persona::PersonaManager;
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Chunk(String),
    /// Artifacts the server extracted itself.
    Artifacts(Vec<Artifact>),
    Error(String),
    End,
}

#[derive(Debug)]
pub enum StreamError {
    /// The request could not be sent or the body stopped mid-stream.
    Request(reqwest::Error),
    /// The server answered with a non-success status.
    Status { status: u16, body: String },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Request(source) => write!(f, "request failed: {source}"),
            StreamError::Status { status, .. } => write!(f, "server returned status {status}"),
        }
    }
}

impl StdError for StreamError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StreamError::Request(source) => Some(source),
            StreamError::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(source: reqwest::Error) -> Self {
        StreamError::Request(source)
    }
}

impl StreamError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Request(source) => format_api_error(&source.to_string()),
            StreamError::Status { body, .. } => format_api_error(body),
        }
    }
}

pub type ByteStream = BoxStream<'static, Result<Vec<u8>, StreamError>>;

/// Opens the response body for a chat request.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, StreamError>;
}

/// `POST {base_url}/chat/completions` over reqwest.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, StreamError> {
        let chat_url = construct_api_url(&self.base_url, "chat/completions");
        let mut http_request = self
            .client
            .post(chat_url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.json(request).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(StreamError::Status { status, body });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StreamError::from))
            .boxed())
    }
}

/// Builds the outgoing request from a session history. The active persona
/// contributes a leading system prompt and may override the model.
pub fn build_request(
    model: &str,
    history: &[HistoryMessage],
    personas: &PersonaManager,
) -> ChatRequest {
    let mut messages = Vec::with_capacity(history.len() + 1);
    if let Some(prompt) = personas.system_prompt() {
        messages.push(ChatMessage::text(Role::System.as_str(), prompt));
    }
    messages.extend(
        history
            .iter()
            .filter(|msg| !msg.raw.is_empty())
            .map(|msg| ChatMessage::with_images(msg.role.as_str(), msg.raw.clone(), &msg.images)),
    );
    ChatRequest {
        model: personas.model(model).to_string(),
        messages,
        stream: true,
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(
    payload: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    if payload == "[DONE]" {
        let _ = tx.send((StreamMessage::End, stream_id));
        return true;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) if response.error.is_some() => {
            let _ = tx.send((StreamMessage::Error(format_api_error(payload)), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
        Ok(response) => {
            if let Some(choice) = response.choices.first() {
                if let Some(content) = &choice.delta.content {
                    let _ = tx.send((StreamMessage::Chunk(content.clone()), stream_id));
                }
            }
            if let Some(artifacts) = response.artifacts.filter(|a| !a.is_empty()) {
                debug!(stream_id, count = artifacts.len(), "server sent artifacts");
                let _ = tx.send((StreamMessage::Artifacts(artifacts), stream_id));
            }
            false
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }

            let formatted_error = format_api_error(payload);
            let _ = tx.send((StreamMessage::Error(formatted_error), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            true
        }
    }
}

fn process_sse_line(
    line: &str,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, tx, stream_id))
        .unwrap_or(false)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Turns an error body into a short message followed by the body as a
/// fenced block.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value) {
                if !summary.is_empty() {
                    return format!("API Error: {}\n```json\n{}\n```", summary, pretty_json);
                }
            }
            return format!("API Error:\n```json\n{}\n```", pretty_json);
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        format!("API Error:\n```xml\n{}\n```", trimmed)
    } else {
        format!("API Error:\n```\n{}\n```", trimmed)
    }
}

pub struct StreamParams {
    pub backend: Arc<dyn ChatBackend>,
    pub request: ChatRequest,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) -> tokio::task::JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                backend,
                request,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = run_stream(backend.as_ref(), &request, &tx, stream_id) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "stream cancelled");
                }
            }
        })
    }
}

async fn run_stream(
    backend: &dyn ChatBackend,
    request: &ChatRequest,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) {
    let send_failure = |err: StreamError| {
        error!(stream_id, error = %err, "chat stream failed");
        let _ = tx.send((StreamMessage::Error(err.user_message()), stream_id));
        let _ = tx.send((StreamMessage::End, stream_id));
    };

    let mut stream = match backend.open_stream(request).await {
        Ok(stream) => stream,
        Err(err) => return send_failure(err),
    };

    let mut buffer: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => buffer.extend_from_slice(&bytes),
            Err(err) => return send_failure(err),
        }

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let should_end = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(line) => process_sse_line(line.trim(), tx, stream_id),
                Err(e) => {
                    warn!(stream_id, error = %e, "invalid UTF-8 in stream");
                    false
                }
            };
            buffer.drain(..=newline_pos);
            if should_end {
                return;
            }
        }
    }

    // A final line without a trailing newline still counts.
    if let Ok(line) = std::str::from_utf8(&buffer) {
        if process_sse_line(line.trim(), tx, stream_id) {
            return;
        }
    }
    let _ = tx.send((StreamMessage::End, stream_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, Persona};
    use futures_util::stream;

    /// Replays canned body chunks.
    struct CannedBackend {
        chunks: Vec<&'static str>,
    }

    #[async_trait]
    impl ChatBackend for CannedBackend {
        async fn open_stream(&self, _request: &ChatRequest) -> Result<ByteStream, StreamError> {
            let items: Vec<Result<Vec<u8>, StreamError>> = self
                .chunks
                .iter()
                .map(|c| Ok(c.as_bytes().to_vec()))
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    struct RejectingBackend;

    #[async_trait]
    impl ChatBackend for RejectingBackend {
        async fn open_stream(&self, _request: &ChatRequest) -> Result<ByteStream, StreamError> {
            Err(StreamError::Status {
                status: 503,
                body: r#"{"error":{"message":"overloaded"}}"#.to_string(),
            })
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::text("user", "hi")],
            stream: true,
        }
    }

    async fn collect(backend: impl ChatBackend + 'static) -> Vec<StreamMessage> {
        let (service, mut rx) = ChatStreamService::new();
        let handle = service.spawn_stream(StreamParams {
            backend: Arc::new(backend),
            request: request(),
            cancel_token: tokio_util::sync::CancellationToken::new(),
            stream_id: 7,
        });
        handle.await.unwrap();
        drop(service);
        let mut out = Vec::new();
        while let Some((message, id)) = rx.recv().await {
            assert_eq!(id, 7);
            out.push(message);
        }
        out
    }

    #[test]
    fn process_sse_line_handles_spacing_variants() {
        let (service, mut rx) = ChatStreamService::new();
        let variants = [
            (
                r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#,
                "Hello",
                "data: [DONE]",
            ),
            (
                r#"data:{"choices":[{"delta":{"content":"World"}}]}"#,
                "World",
                "data:[DONE]",
            ),
        ];

        for (index, (chunk_line, expected_chunk, done_line)) in variants.iter().enumerate() {
            let stream_id = (index + 1) as u64;

            assert!(!process_sse_line(chunk_line, &service.tx, stream_id));
            let (message, received_id) = rx.try_recv().expect("expected chunk message");
            assert_eq!(received_id, stream_id);
            assert_eq!(message, StreamMessage::Chunk(expected_chunk.to_string()));

            assert!(process_sse_line(done_line, &service.tx, stream_id));
            let (message, _) = rx.try_recv().expect("expected end message");
            assert_eq!(message, StreamMessage::End);
        }

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn top_level_artifacts_are_forwarded() {
        let (service, mut rx) = ChatStreamService::new();
        let line = r#"data: {"choices":[],"artifacts":[{"id":"srv-1","type":"html","title":"Page","content":"<p>x</p>"}]}"#;
        assert!(!process_sse_line(line, &service.tx, 1));
        match rx.try_recv().expect("expected artifacts").0 {
            StreamMessage::Artifacts(artifacts) => {
                assert_eq!(artifacts.len(), 1);
                assert_eq!(artifacts[0].id, "srv-1");
            }
            other => panic!("expected artifacts, got {other:?}"),
        }
    }

    #[test]
    fn process_sse_line_routes_stream_errors() {
        let (service, mut rx) = ChatStreamService::new();
        let error_line = r#"data: {"error":{"message":"internal server error"}}"#;

        assert!(process_sse_line(error_line, &service.tx, 99));

        let (message, received_id) = rx.try_recv().expect("expected error message");
        assert_eq!(received_id, 99);
        let expected = r#"API Error: internal server error
```json
{
  "error": {
    "message": "internal server error"
  }
}
```"#;
        assert_eq!(message, StreamMessage::Error(expected.to_string()));

        let (message, _) = rx.try_recv().expect("expected end message");
        assert_eq!(message, StreamMessage::End);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn non_json_payload_ends_the_stream() {
        let (service, mut rx) = ChatStreamService::new();
        assert!(process_sse_line("data: upstream timeout", &service.tx, 3));
        assert_eq!(
            rx.try_recv().unwrap().0,
            StreamMessage::Error("API Error:\n```\nupstream timeout\n```".to_string())
        );
        assert_eq!(rx.try_recv().unwrap().0, StreamMessage::End);
    }

    #[test]
    fn format_api_error_prettifies_json_with_summary() {
        let raw = r#"{"error":{"message":"model overloaded","type":"invalid_request_error"}}"#;
        let formatted = format_api_error(raw);

        let expected = r#"API Error: model overloaded
```json
{
  "error": {
    "message": "model overloaded",
    "type": "invalid_request_error"
  }
}
```"#;
        assert_eq!(formatted, expected);
    }

    #[test]
    fn format_api_error_handles_xml_and_plaintext() {
        assert_eq!(
            format_api_error("<error>bad</error>"),
            "API Error:\n```xml\n<error>bad</error>\n```"
        );
        assert_eq!(
            format_api_error("api failure"),
            "API Error:\n```\napi failure\n```"
        );
        assert_eq!(format_api_error("  "), "API Error:\n```\n<empty>\n```");
    }

    #[tokio::test]
    async fn lines_split_across_chunks_are_reassembled() {
        let messages = collect(CannedBackend {
            chunks: vec![
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel",
                "lo\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n",
                "data: [DONE]\n",
            ],
        })
        .await;
        assert_eq!(
            messages,
            vec![
                StreamMessage::Chunk("Hello".to_string()),
                StreamMessage::Chunk(" there".to_string()),
                StreamMessage::End,
            ]
        );
    }

    #[tokio::test]
    async fn body_without_done_marker_still_ends() {
        let messages = collect(CannedBackend {
            chunks: vec!["data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}"],
        })
        .await;
        assert_eq!(
            messages,
            vec![StreamMessage::Chunk("x".to_string()), StreamMessage::End]
        );
    }

    #[tokio::test]
    async fn failed_request_reports_error_then_end() {
        let messages = collect(RejectingBackend).await;
        assert_eq!(messages.len(), 2);
        match &messages[0] {
            StreamMessage::Error(text) => assert!(text.starts_with("API Error: overloaded")),
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(messages[1], StreamMessage::End);
    }

    #[tokio::test]
    async fn cancelled_stream_sends_nothing() {
        let (service, mut rx) = ChatStreamService::new();
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        service
            .spawn_stream(StreamParams {
                backend: Arc::new(CannedBackend {
                    chunks: vec!["data: [DONE]\n"],
                }),
                request: request(),
                cancel_token: token,
                stream_id: 1,
            })
            .await
            .unwrap();
        drop(service);
        // select! may poll either branch first; a cancelled token wins or
        // the tiny body finishes, never anything else.
        while let Some((message, _)) = rx.recv().await {
            assert_eq!(message, StreamMessage::End);
        }
    }

    #[test]
    fn request_carries_persona_prompt_and_model() {
        let config = Config {
            personas: vec![Persona {
                id: "terse".to_string(),
                display_name: "Terse".to_string(),
                bio: None,
                model: Some("small-fast".to_string()),
                system_prompt: Some("Answer briefly.".to_string()),
            }],
            ..Default::default()
        };
        let mut personas = PersonaManager::from_config(&config);
        let history = vec![
            HistoryMessage::user("u1", "hello"),
            HistoryMessage::streaming("a1"),
        ];

        let plain = build_request("default", &history, &personas);
        assert_eq!(plain.model, "default");
        assert_eq!(plain.messages.len(), 1);

        personas.set_active_persona("terse").unwrap();
        let request = build_request("default", &history, &personas);
        assert_eq!(request.model, "small-fast");
        assert_eq!(request.messages[0], ChatMessage::text("system", "Answer briefly."));
        assert_eq!(request.messages[1], ChatMessage::text("user", "hello"));
        assert!(request.stream);
    }

    #[test]
    fn loaded_history_is_sent_in_the_request() {
        let loaded: HistoryMessage = serde_json::from_str(
            r#"{"id":"m9","role":"assistant","content":"Hello from history","timestamp":1}"#,
        )
        .unwrap();
        let history = vec![loaded, HistoryMessage::user("u1", "and now?")];
        let request = build_request("default", &history, &PersonaManager::default());
        assert_eq!(
            request.messages,
            vec![
                ChatMessage::text("assistant", "Hello from history"),
                ChatMessage::text("user", "and now?"),
            ]
        );
    }
}
