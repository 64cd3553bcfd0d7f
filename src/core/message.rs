use serde::{Deserialize, Serialize};

use crate::core::artifact::Artifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// Where a message is in its parse lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPhase {
    /// Tokens are still arriving; the raw text is shown as-is.
    Streaming,
    /// The stream ended (or the message was loaded) and it has not been parsed yet.
    #[default]
    JustFinished,
    /// Artifacts are resolved and cached on the message.
    Settled,
}

/// Who produced a message's artifact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactOrigin {
    /// Extracted locally from the message text.
    Local,
    /// Supplied with the final payload by the server.
    Backend,
}

/// Per-reply numbers reported by the server. Display data only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_per_second: Option<f64>,
}

impl MessageStatistics {
    /// Fills in the throughput when tokens and duration are both known.
    pub fn with_derived_rate(mut self) -> Self {
        if self.tokens_per_second.is_none() {
            if let (Some(tokens), Some(ms)) = (self.tokens, self.duration_ms) {
                if ms > 0 {
                    self.tokens_per_second = Some(f64::from(tokens) * 1000.0 / ms as f64);
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredMessage")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    /// Display text. Equal to `raw` until the message settles, then the
    /// residual left after artifact extraction.
    pub content: String,
    /// Text exactly as received or edited.
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<MessageStatistics>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub phase: RenderPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_origin: Option<ArtifactOrigin>,
    /// Checksum of `raw` when the message last settled.
    #[serde(skip)]
    pub(crate) settled_fingerprint: Option<u32>,
}

/// Message shape accepted on load. History saved without `raw` keeps its
/// `content` as the raw text.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMessage {
    id: String,
    role: Role,
    content: String,
    #[serde(default)]
    raw: Option<String>,
    #[serde(default)]
    artifacts: Option<Vec<Artifact>>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    statistics: Option<MessageStatistics>,
    timestamp: i64,
    #[serde(default)]
    phase: RenderPhase,
    #[serde(default)]
    artifact_origin: Option<ArtifactOrigin>,
}

impl From<StoredMessage> for ChatMessage {
    fn from(stored: StoredMessage) -> Self {
        let raw = match stored.raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => stored.content.clone(),
        };
        Self {
            id: stored.id,
            role: stored.role,
            content: stored.content,
            raw,
            artifacts: stored.artifacts,
            images: stored.images,
            statistics: stored.statistics,
            timestamp: stored.timestamp,
            phase: stored.phase,
            artifact_origin: stored.artifact_origin,
            settled_fingerprint: None,
        }
    }
}

impl ChatMessage {
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        let raw = content.into();
        Self {
            id: id.into(),
            role,
            content: raw.clone(),
            raw,
            artifacts: None,
            images: Vec::new(),
            statistics: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
            phase: RenderPhase::JustFinished,
            artifact_origin: None,
            settled_fingerprint: None,
        }
    }

    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id, Role::User, content)
    }

    pub fn system(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(id, Role::System, content)
    }

    /// An empty assistant message waiting for its first token.
    pub fn streaming(id: impl Into<String>) -> Self {
        let mut msg = Self::new(id, Role::Assistant, "");
        msg.phase = RenderPhase::Streaming;
        msg
    }

    pub fn is_streaming(&self) -> bool {
        self.phase == RenderPhase::Streaming
    }

    pub fn artifacts(&self) -> &[Artifact] {
        self.artifacts.as_deref().unwrap_or(&[])
    }

    pub fn has_artifacts(&self) -> bool {
        !self.artifacts().is_empty()
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Replaces the text wholesale, for example after an in-place edit.
    /// Locally extracted artifacts are dropped so they can be rebuilt.
    pub fn replace_raw(&mut self, text: impl Into<String>) {
        self.raw = text.into();
        self.content = self.raw.clone();
        if self.artifact_origin == Some(ArtifactOrigin::Local) {
            self.artifacts = None;
            self.artifact_origin = None;
        }
        if self.phase == RenderPhase::Settled {
            self.phase = RenderPhase::JustFinished;
        }
    }

    pub(crate) fn raw_fingerprint(&self) -> u32 {
        crc32fast::hash(self.raw.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("tool").is_err());
        assert_eq!(Role::try_from("system"), Ok(Role::System));
    }

    #[test]
    fn streaming_messages_start_empty_in_streaming_phase() {
        let msg = ChatMessage::streaming("m1");
        assert!(msg.is_streaming());
        assert!(msg.role.is_assistant());
        assert!(msg.content.is_empty());
        assert!(!msg.has_artifacts());
    }

    #[test]
    fn replacing_raw_drops_local_artifacts_only() {
        let mut msg = ChatMessage::new("m1", Role::Assistant, "x");
        msg.artifacts = Some(Vec::new());
        msg.artifact_origin = Some(ArtifactOrigin::Backend);
        msg.phase = RenderPhase::Settled;
        msg.replace_raw("y");
        assert!(msg.artifacts.is_some());
        assert_eq!(msg.phase, RenderPhase::JustFinished);
        assert_eq!(msg.content, "y");

        msg.artifact_origin = Some(ArtifactOrigin::Local);
        msg.replace_raw("z");
        assert!(msg.artifacts.is_none());
    }

    #[test]
    fn statistics_derive_rate() {
        let stats = MessageStatistics {
            tokens: Some(50),
            duration_ms: Some(2000),
            tokens_per_second: None,
        }
        .with_derived_rate();
        assert_eq!(stats.tokens_per_second, Some(25.0));
    }

    #[test]
    fn message_serializes_with_camel_case_keys() {
        let msg = ChatMessage::user("u1", "hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["phase"], "just_finished");
        assert!(value.get("artifacts").is_none());
        assert!(value.get("settledFingerprint").is_none());
    }

    #[test]
    fn loading_without_raw_keeps_the_content_as_raw() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"id":"m9","role":"assistant","content":"Hello from history","timestamp":1}"#,
        )
        .unwrap();
        assert_eq!(msg.raw, "Hello from history");
        assert_eq!(msg.content, "Hello from history");
        assert_eq!(msg.phase, RenderPhase::JustFinished);

        let blank: ChatMessage = serde_json::from_str(
            r#"{"id":"m9","role":"user","content":"hi","raw":"","timestamp":1}"#,
        )
        .unwrap();
        assert_eq!(blank.raw, "hi");
    }

    #[test]
    fn saved_messages_load_back_unchanged() {
        let mut msg = ChatMessage::new("m1", Role::Assistant, "full text");
        msg.content = "residual".into();
        let json = serde_json::to_string(&msg).unwrap();
        let loaded: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, msg);
    }
}
