//! Wire types for OpenAI-compatible chat completion servers.

use serde::{Deserialize, Serialize};

use crate::core::artifact::Artifact;

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Text(content.into()),
        }
    }

    /// A message with attached images; plain text when there are none.
    pub fn with_images(role: impl Into<String>, content: impl Into<String>, images: &[String]) -> Self {
        let content = content.into();
        if images.is_empty() {
            return Self::text(role, content);
        }
        let mut parts = vec![ContentPart::Text { text: content }];
        parts.extend(images.iter().map(|url| ContentPart::ImageUrl {
            image_url: ImageUrl { url: url.clone() },
        }));
        Self {
            role: role.into(),
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseDelta {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponseChoice {
    pub delta: ChatResponseDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One streamed payload. Servers that extract artifacts themselves attach
/// them as a top-level `artifacts` array, usually on the final payload.
#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatResponseChoice>,
    #[serde(default)]
    pub artifacts: Option<Vec<Artifact>>,
    /// Set when the server reports a failure inside the stream.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::ArtifactKind;

    #[test]
    fn image_messages_use_content_parts() {
        let msg = ChatMessage::with_images("user", "what is this?", &["data:x".to_string()]);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][1]["type"], "image_url");
        assert_eq!(value["content"][1]["image_url"]["url"], "data:x");

        let plain = serde_json::to_value(ChatMessage::with_images("user", "hi", &[])).unwrap();
        assert_eq!(plain["content"], "hi");
    }

    #[test]
    fn response_may_carry_artifacts_without_choices() {
        let payload = r#"{"artifacts":[{"id":"a","type":"svg","title":"Logo","content":"<svg/>"}]}"#;
        let response: ChatResponse = serde_json::from_str(payload).unwrap();
        assert!(response.choices.is_empty());
        let artifacts = response.artifacts.unwrap();
        assert_eq!(artifacts[0].kind, ArtifactKind::Svg);
        assert_eq!(artifacts[0].created_at, 0);
    }
}
