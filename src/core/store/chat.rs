use std::sync::Arc;

use tracing::{debug, error};

use crate::core::artifact::Artifact;
use crate::core::extract::{ArtifactExtractor, FenceExtractor};
use crate::core::gate::{ArtifactGate, GateOutcome};
use crate::core::message::{ChatMessage, MessageStatistics};

use super::observers::{Observers, SubscriptionId};
use super::StoreError;

/// How long a toast stays visible.
pub const TOAST_TTL_MS: i64 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// A transient notification. Toasts expire; nothing retries on their behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub text: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Session {
    fn new(id: String, title: String, now: i64) -> Self {
        Self {
            id,
            title,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub sessions: Vec<Session>,
    pub active_session: Option<String>,
    pub toasts: Vec<Toast>,
    /// Message currently receiving tokens, if any.
    pub streaming_message: Option<String>,
}

impl ChatState {
    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn active(&self) -> Option<&Session> {
        self.active_session.as_deref().and_then(|id| self.session(id))
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming_message.is_some()
    }

    fn session_mut(&mut self, id: &str) -> Result<&mut Session, StoreError> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::UnknownSession(id.to_string()))
    }

    fn active_mut(&mut self) -> Result<&mut Session, StoreError> {
        let id = self.active_session.clone().ok_or(StoreError::NoActiveSession)?;
        self.session_mut(&id)
    }

    fn find_message_mut(&mut self, id: &str) -> Result<&mut ChatMessage, StoreError> {
        self.sessions
            .iter_mut()
            .flat_map(|s| s.messages.iter_mut())
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::UnknownMessage(id.to_string()))
    }
}

#[derive(Debug, Clone)]
pub enum ChatAction {
    CreateSession {
        id: String,
        title: String,
    },
    SelectSession {
        id: String,
    },
    RenameSession {
        id: String,
        title: String,
    },
    DeleteSession {
        id: String,
    },
    SubmitUserMessage {
        id: String,
        content: String,
        images: Vec<String>,
    },
    BeginAssistantMessage {
        id: String,
    },
    AppendChunk {
        message_id: String,
        chunk: String,
    },
    StreamCompleted {
        message_id: String,
        artifacts: Option<Vec<Artifact>>,
        statistics: Option<MessageStatistics>,
    },
    StreamErrored {
        message_id: String,
        error: String,
    },
    EditMessage {
        message_id: String,
        content: String,
    },
    DeleteMessage {
        message_id: String,
    },
    PushToast {
        kind: ToastKind,
        text: String,
    },
    DismissToast {
        id: u64,
    },
    ExpireToasts {
        now: i64,
    },
}

/// Sessions, messages and toasts behind a typed action interface.
///
/// Every mutation goes through [`ChatStore::dispatch`]; subscribers get the
/// new snapshot after each successful action. Snapshots are shared `Arc`s
/// and never change once handed out.
pub struct ChatStore<E = FenceExtractor> {
    state: Arc<ChatState>,
    gate: ArtifactGate<E>,
    observers: Observers<Arc<ChatState>>,
    next_toast_id: u64,
}

impl ChatStore<FenceExtractor> {
    pub fn new() -> Self {
        Self::with_extractor(FenceExtractor::default())
    }
}

impl Default for ChatStore<FenceExtractor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ArtifactExtractor> ChatStore<E> {
    pub fn with_extractor(extractor: E) -> Self {
        Self {
            state: Arc::new(ChatState::default()),
            gate: ArtifactGate::new(extractor),
            observers: Observers::default(),
            next_toast_id: 0,
        }
    }

    pub fn snapshot(&self) -> Arc<ChatState> {
        Arc::clone(&self.state)
    }

    pub fn gate(&self) -> &ArtifactGate<E> {
        &self.gate
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&Arc<ChatState>) + Send + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn dispatch(&mut self, action: ChatAction) -> Result<(), StoreError> {
        self.dispatch_at(action, chrono::Utc::now().timestamp_millis())
    }

    /// Applies `action` as of `now` (epoch milliseconds).
    pub fn dispatch_at(&mut self, action: ChatAction, now: i64) -> Result<(), StoreError> {
        self.apply(action, now)?;
        self.observers.notify(&self.state);
        Ok(())
    }

    /// Runs the gate over the active session, settling anything that is due.
    /// Returns how many messages changed.
    pub fn refresh_active(&mut self) -> Result<usize, StoreError> {
        let mut next = (*self.state).clone();
        let mut changed = 0;
        for msg in &mut next.active_mut()?.messages {
            if !matches!(
                self.gate.refresh(msg),
                GateOutcome::Cached | GateOutcome::Deferred
            ) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.state = Arc::new(next);
            self.observers.notify(&self.state);
        }
        Ok(changed)
    }

    fn push_toast(&mut self, kind: ToastKind, text: String, now: i64) {
        let id = self.next_toast_id;
        self.next_toast_id += 1;
        Arc::make_mut(&mut self.state).toasts.push(Toast {
            id,
            kind,
            text,
            expires_at: now + TOAST_TTL_MS,
        });
    }

    fn apply(&mut self, action: ChatAction, now: i64) -> Result<(), StoreError> {
        match action {
            ChatAction::CreateSession { id, title } => {
                let state = Arc::make_mut(&mut self.state);
                if state.session(&id).is_some() {
                    return Err(StoreError::DuplicateSession(id));
                }
                state.sessions.push(Session::new(id.clone(), title, now));
                state.active_session = Some(id);
            }
            ChatAction::SelectSession { id } => {
                if self.state.session(&id).is_none() {
                    return Err(StoreError::UnknownSession(id));
                }
                Arc::make_mut(&mut self.state).active_session = Some(id);
            }
            ChatAction::RenameSession { id, title } => {
                let session = Arc::make_mut(&mut self.state).session_mut(&id)?;
                session.title = title;
                session.updated_at = now;
            }
            ChatAction::DeleteSession { id } => {
                let state = Arc::make_mut(&mut self.state);
                let before = state.sessions.len();
                state.sessions.retain(|s| s.id != id);
                if state.sessions.len() == before {
                    return Err(StoreError::UnknownSession(id));
                }
                if state.active_session.as_deref() == Some(id.as_str()) {
                    state.active_session = state.sessions.last().map(|s| s.id.clone());
                }
            }
            ChatAction::SubmitUserMessage {
                id,
                content,
                images,
            } => {
                if self.state.is_streaming() {
                    return Err(StoreError::StreamInProgress);
                }
                let mut msg = ChatMessage::user(id, content).with_images(images);
                msg.timestamp = now;
                self.gate.refresh(&mut msg);
                let session = Arc::make_mut(&mut self.state).active_mut()?;
                session.messages.push(msg);
                session.updated_at = now;
            }
            ChatAction::BeginAssistantMessage { id } => {
                if self.state.is_streaming() {
                    return Err(StoreError::StreamInProgress);
                }
                let mut msg = ChatMessage::streaming(id.clone());
                msg.timestamp = now;
                let state = Arc::make_mut(&mut self.state);
                let session = state.active_mut()?;
                session.messages.push(msg);
                session.updated_at = now;
                state.streaming_message = Some(id);
            }
            ChatAction::AppendChunk { message_id, chunk } => {
                let state = Arc::make_mut(&mut self.state);
                let msg = state.find_message_mut(&message_id)?;
                self.gate.append_chunk(msg, &chunk);
            }
            ChatAction::StreamCompleted {
                message_id,
                artifacts,
                statistics,
            } => {
                let state = Arc::make_mut(&mut self.state);
                let msg = state.find_message_mut(&message_id)?;
                if let Some(stats) = statistics {
                    msg.statistics = Some(stats.with_derived_rate());
                }
                let outcome = self.gate.complete(msg, artifacts);
                debug!(%message_id, ?outcome, "stream completed");
                if state.streaming_message.as_deref() == Some(message_id.as_str()) {
                    state.streaming_message = None;
                }
            }
            ChatAction::StreamErrored { message_id, error } => {
                error!(%message_id, %error, "stream failed");
                let state = Arc::make_mut(&mut self.state);
                let empty = {
                    let msg = state.find_message_mut(&message_id)?;
                    if msg.raw.trim().is_empty() {
                        true
                    } else {
                        self.gate.complete(msg, None);
                        false
                    }
                };
                if state.streaming_message.as_deref() == Some(message_id.as_str()) {
                    state.streaming_message = None;
                }
                if empty {
                    for session in &mut state.sessions {
                        session.messages.retain(|m| m.id != message_id);
                    }
                }
                self.push_toast(ToastKind::Error, error, now);
            }
            ChatAction::EditMessage {
                message_id,
                content,
            } => {
                if self.state.streaming_message.as_deref() == Some(message_id.as_str()) {
                    return Err(StoreError::StreamInProgress);
                }
                let msg = Arc::make_mut(&mut self.state).find_message_mut(&message_id)?;
                msg.replace_raw(content);
                self.gate.refresh(msg);
            }
            ChatAction::DeleteMessage { message_id } => {
                let state = Arc::make_mut(&mut self.state);
                let mut found = false;
                for session in &mut state.sessions {
                    let before = session.messages.len();
                    session.messages.retain(|m| m.id != message_id);
                    found |= session.messages.len() != before;
                }
                if !found {
                    return Err(StoreError::UnknownMessage(message_id));
                }
                if state.streaming_message.as_deref() == Some(message_id.as_str()) {
                    state.streaming_message = None;
                }
            }
            ChatAction::PushToast { kind, text } => self.push_toast(kind, text, now),
            ChatAction::DismissToast { id } => {
                Arc::make_mut(&mut self.state).toasts.retain(|t| t.id != id);
            }
            ChatAction::ExpireToasts { now } => {
                Arc::make_mut(&mut self.state)
                    .toasts
                    .retain(|t| t.expires_at > now);
            }
        }
        Ok(())
    }
}
