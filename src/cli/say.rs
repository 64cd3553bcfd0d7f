//! `vellum say`: one streamed exchange with the configured server.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::artifact::Artifact;
use crate::core::chat_stream::{
    build_request, ChatBackend, ChatStreamService, HttpBackend, StreamMessage, StreamParams,
};
use crate::core::config::Config;
use crate::core::extract::FenceExtractor;
use crate::core::message::{ChatMessage, MessageStatistics};
use crate::core::persona::PersonaManager;
use crate::core::store::{ChatAction, ChatStore, StoreError};
use crate::ui::actions::{download_artifact, open_in_window};

/// Environment variable holding the bearer token, if the server wants one.
pub const API_KEY_ENV: &str = "VELLUM_API_KEY";

const SESSION_ID: &str = "cli";
const USER_MESSAGE_ID: &str = "user-1";
const REPLY_MESSAGE_ID: &str = "reply-1";

#[derive(Debug, Clone, Default)]
pub struct SayOptions {
    pub prompt: Vec<String>,
    pub model: Option<String>,
    pub persona: Option<String>,
    pub save_artifacts: Option<PathBuf>,
    /// 1-based index into the reply's artifacts.
    pub open: Option<usize>,
}

pub async fn run_say(opts: SayOptions, config: &Config) -> Result<(), Box<dyn Error>> {
    let backend = Arc::new(HttpBackend::new(
        config.api_base_url(),
        std::env::var(API_KEY_ENV).ok(),
    ));
    let reply = say_with(backend, &opts, config, &mut std::io::stdout()).await?;

    if let Some(dir) = &opts.save_artifacts {
        for artifact in reply.artifacts() {
            let path = download_artifact(artifact, dir)?;
            println!("💾 Saved {}", path.display());
        }
    }
    if let Some(n) = opts.open {
        let artifact = pick(reply.artifacts(), n)?;
        let path = open_in_window(artifact)?;
        println!("🪟 Opened {} ({})", artifact.title, path.display());
    }
    Ok(())
}

/// Streams one reply from `backend`, echoing tokens to `out` as they
/// arrive, and returns the settled assistant message.
pub async fn say_with<W: Write>(
    backend: Arc<dyn ChatBackend>,
    opts: &SayOptions,
    config: &Config,
    out: &mut W,
) -> Result<ChatMessage, Box<dyn Error>> {
    let prompt = opts.prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Prompt cannot be empty".into());
    }

    let mut personas = PersonaManager::from_config(config);
    if let Some(id) = &opts.persona {
        personas.set_active_persona(id)?;
    }
    let fallback = config.default_model.as_deref().unwrap_or("default");
    let model = match &opts.model {
        Some(model) => model.clone(),
        None => personas.model(fallback).to_string(),
    };

    let mut store = ChatStore::with_extractor(FenceExtractor::new(config.extract_options()));
    store.dispatch(ChatAction::CreateSession {
        id: SESSION_ID.to_string(),
        title: truncate_title(&prompt),
    })?;
    store.dispatch(ChatAction::SubmitUserMessage {
        id: USER_MESSAGE_ID.to_string(),
        content: prompt,
        images: Vec::new(),
    })?;
    store.dispatch(ChatAction::BeginAssistantMessage {
        id: REPLY_MESSAGE_ID.to_string(),
    })?;

    let request = {
        let snapshot = store.snapshot();
        let session = snapshot.active().ok_or(StoreError::NoActiveSession)?;
        build_request(&model, &session.messages, &personas)
    };
    info!(model = %request.model, messages = request.messages.len(), "sending request");

    let (service, mut rx) = ChatStreamService::new();
    let cancel_token = CancellationToken::new();
    let stream_id = 1;
    let handle = service.spawn_stream(StreamParams {
        backend,
        request,
        cancel_token: cancel_token.clone(),
        stream_id,
    });
    // The receiver would otherwise wait on the service's own sender forever.
    drop(service);

    let started = Instant::now();
    let mut backend_artifacts: Option<Vec<Artifact>> = None;
    let mut failure = None;
    while let Some((message, id)) = rx.recv().await {
        if id != stream_id {
            continue;
        }
        match message {
            StreamMessage::Chunk(chunk) => {
                write!(out, "{chunk}")?;
                out.flush()?;
                store.dispatch(ChatAction::AppendChunk {
                    message_id: REPLY_MESSAGE_ID.to_string(),
                    chunk,
                })?;
            }
            StreamMessage::Artifacts(artifacts) => {
                debug!(count = artifacts.len(), "server supplied artifacts");
                backend_artifacts
                    .get_or_insert_with(Vec::new)
                    .extend(artifacts);
            }
            StreamMessage::Error(err) => {
                failure = Some(err);
                break;
            }
            StreamMessage::End => break,
        }
    }
    cancel_token.cancel();
    let _ = handle.await;

    if let Some(err) = failure {
        store.dispatch(ChatAction::StreamErrored {
            message_id: REPLY_MESSAGE_ID.to_string(),
            error: err.clone(),
        })?;
        writeln!(out)?;
        return Err(err.into());
    }

    let elapsed_ms = started.elapsed().as_millis();
    store.dispatch(ChatAction::StreamCompleted {
        message_id: REPLY_MESSAGE_ID.to_string(),
        artifacts: backend_artifacts,
        statistics: Some(MessageStatistics {
            duration_ms: Some(u64::try_from(elapsed_ms).unwrap_or(u64::MAX)),
            ..MessageStatistics::default()
        }),
    })?;

    let snapshot = store.snapshot();
    let reply = snapshot
        .active()
        .and_then(|s| s.message(REPLY_MESSAGE_ID))
        .cloned()
        .ok_or_else(|| StoreError::UnknownMessage(REPLY_MESSAGE_ID.to_string()))?;

    writeln!(out)?;
    if reply.has_artifacts() {
        writeln!(out, "\n──── settled ────")?;
        writeln!(out, "{}", reply.content.trim_end())?;
        writeln!(out, "\n──── artifacts ────")?;
        for line in artifact_index(reply.artifacts()) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(reply)
}

/// `[n] Title (kind, language)` per artifact, numbered from 1. The
/// language is left out when it only repeats the kind.
pub fn artifact_index(artifacts: &[Artifact]) -> Vec<String> {
    artifacts
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let lang = a
                .language
                .as_deref()
                .filter(|lang| !lang.eq_ignore_ascii_case(a.kind.as_str()));
            match lang {
                Some(lang) => format!("[{}] {} ({}, {})", i + 1, a.title, a.kind, lang),
                None => format!("[{}] {} ({})", i + 1, a.title, a.kind),
            }
        })
        .collect()
}

fn pick(artifacts: &[Artifact], n: usize) -> Result<&Artifact, String> {
    n.checked_sub(1)
        .and_then(|i| artifacts.get(i))
        .ok_or_else(|| format!("No artifact {n}: the reply has {}", artifacts.len()))
}

fn truncate_title(prompt: &str) -> String {
    const MAX: usize = 40;
    let mut chars = prompt.chars();
    let title: String = chars.by_ref().take(MAX).collect();
    if chars.next().is_some() {
        format!("{title}...")
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ChatRequest;
    use crate::core::artifact::ArtifactKind;
    use crate::core::chat_stream::{ByteStream, StreamError};
    use async_trait::async_trait;
    use futures_util::stream::{self, StreamExt};
    use std::sync::Mutex;

    struct CannedBackend {
        body: String,
        seen: Mutex<Option<ChatRequest>>,
    }

    impl CannedBackend {
        fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_string(),
                seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for CannedBackend {
        async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, StreamError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            let bytes = self.body.clone().into_bytes();
            Ok(stream::iter(vec![Ok(bytes)]).boxed())
        }
    }

    fn sse(chunks: &[&str]) -> String {
        let mut body = String::new();
        for chunk in chunks {
            let payload = serde_json::json!({"choices": [{"delta": {"content": chunk}}]});
            body.push_str(&format!("data: {payload}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    fn opts(prompt: &str) -> SayOptions {
        SayOptions {
            prompt: vec![prompt.to_string()],
            ..SayOptions::default()
        }
    }

    #[tokio::test]
    async fn streams_tokens_then_prints_the_artifact_index() {
        let backend = CannedBackend::new(&sse(&["Here:\n```ht", "ml\n<b>hi</b>\n```\n"]));
        let mut out = Vec::new();
        let reply = say_with(backend.clone(), &opts("make html"), &Config::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(reply.content, "Here:\n");
        assert_eq!(reply.artifacts().len(), 1);
        assert_eq!(reply.artifacts()[0].kind, ArtifactKind::Html);
        assert!(reply.statistics.is_some());

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Here:\n```html\n<b>hi</b>\n```\n"));
        assert!(printed.contains("[1] HTML Preview (html)"));

        let seen = backend.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.model, "default");
        assert_eq!(
            seen.messages,
            vec![crate::api::ChatMessage::text("user", "make html")]
        );
    }

    #[tokio::test]
    async fn plain_replies_print_no_index() {
        let backend = CannedBackend::new(&sse(&["just ", "words"]));
        let mut out = Vec::new();
        let reply = say_with(backend, &opts("hi"), &Config::default(), &mut out)
            .await
            .unwrap();
        assert!(!reply.has_artifacts());
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed, "just words\n");
    }

    #[tokio::test]
    async fn server_errors_surface_as_errors() {
        let backend = CannedBackend::new("data: {\"error\":{\"message\":\"overloaded\"}}\n\n");
        let mut out = Vec::new();
        let err = say_with(backend, &opts("hi"), &Config::default(), &mut out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let backend = CannedBackend::new(&sse(&["x"]));
        let err = say_with(backend, &opts("   "), &Config::default(), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Prompt cannot be empty");
    }

    #[tokio::test]
    async fn explicit_model_beats_config_default() {
        let backend = CannedBackend::new(&sse(&["ok"]));
        let config = Config {
            default_model: Some("configured".into()),
            ..Config::default()
        };
        let mut o = opts("hi");
        o.model = Some("explicit".into());
        say_with(backend.clone(), &o, &config, &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(backend.seen.lock().unwrap().as_ref().unwrap().model, "explicit");
    }

    #[test]
    fn index_lines_and_picking() {
        let artifact = Artifact {
            id: "r-0-1".into(),
            kind: ArtifactKind::Code,
            title: "Rust Code".into(),
            description: None,
            content: "fn main() {}".into(),
            language: Some("rust".into()),
            created_at: 0,
            updated_at: 0,
        };
        let json = Artifact {
            id: "r-1-2".into(),
            kind: ArtifactKind::Json,
            title: "JSON Data".into(),
            language: Some("json".into()),
            ..artifact.clone()
        };
        let list = vec![artifact, json];
        assert_eq!(
            artifact_index(&list),
            vec!["[1] Rust Code (code, rust)", "[2] JSON Data (json)"]
        );
        assert!(pick(&list, 1).is_ok());
        assert!(pick(&list, 0).is_err());
        assert!(pick(&list, 3).is_err());
    }

    #[test]
    fn long_prompts_make_short_titles() {
        assert_eq!(truncate_title("short"), "short");
        let long = "x".repeat(50);
        assert_eq!(truncate_title(&long), format!("{}...", "x".repeat(40)));
    }
}
