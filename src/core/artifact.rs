//! Artifacts promoted out of assistant replies.
//!
//! An [`Artifact`] is a self-contained unit of content (an HTML page, an SVG
//! image, a JSON document, a code listing) that was lifted out of a fenced
//! block in an assistant message so it can be previewed, copied or saved on
//! its own. The set of kinds is closed: every rendering concern matches on
//! [`ArtifactKind`] exhaustively.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Html,
    Svg,
    Json,
    Code,
    React,
    Text,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Html => "html",
            ArtifactKind::Svg => "svg",
            ArtifactKind::Json => "json",
            ArtifactKind::Code => "code",
            ArtifactKind::React => "react",
            ArtifactKind::Text => "text",
        }
    }

    /// Kinds that have a visual preview distinct from their source.
    pub fn has_preview(self) -> bool {
        matches!(
            self,
            ArtifactKind::Html | ArtifactKind::Svg | ArtifactKind::Json
        )
    }

    /// Kinds that can be handed to a fresh browsing context.
    pub fn can_open_in_window(self) -> bool {
        matches!(self, ArtifactKind::Html | ArtifactKind::React)
    }

    pub fn default_title(self) -> &'static str {
        match self {
            ArtifactKind::Html => "HTML Preview",
            ArtifactKind::Svg => "SVG Image",
            ArtifactKind::Json => "JSON Data",
            ArtifactKind::Code => "Code",
            ArtifactKind::React => "React Component",
            ArtifactKind::Text => "Text",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ArtifactKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "html" => Ok(ArtifactKind::Html),
            "svg" => Ok(ArtifactKind::Svg),
            "json" => Ok(ArtifactKind::Json),
            "code" => Ok(ArtifactKind::Code),
            "react" => Ok(ArtifactKind::React),
            "text" => Ok(ArtifactKind::Text),
            _ => Err(format!("invalid artifact type: {value}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Artifact {
    /// File extension used when the artifact is downloaded.
    pub fn file_extension(&self) -> &'static str {
        match self.kind {
            ArtifactKind::Html => "html",
            ArtifactKind::Svg => "svg",
            ArtifactKind::Json => "json",
            ArtifactKind::React => match self.language.as_deref() {
                Some("tsx") | Some("typescript") | Some("ts") => "tsx",
                _ => "jsx",
            },
            ArtifactKind::Code => language_to_extension(self.language.as_deref()),
            ArtifactKind::Text => "txt",
        }
    }

    /// Filename for a download: the slugged title plus the kind's extension.
    pub fn file_name(&self) -> String {
        format!("{}.{}", slugify(&self.title), self.file_extension())
    }
}

pub fn language_to_extension(lang: Option<&str>) -> &'static str {
    if let Some(l) = lang {
        let l = l.trim().to_ascii_lowercase();
        return match l.as_str() {
            "rs" | "rust" => "rs",
            "py" | "python" => "py",
            "sh" | "bash" | "zsh" | "shell" => "sh",
            "js" | "javascript" => "js",
            "ts" | "typescript" => "ts",
            "jsx" => "jsx",
            "tsx" => "tsx",
            "json" => "json",
            "yaml" | "yml" => "yml",
            "toml" => "toml",
            "md" | "markdown" => "md",
            "go" => "go",
            "java" => "java",
            "kotlin" | "kt" => "kt",
            "swift" => "swift",
            "rb" | "ruby" => "rb",
            "php" => "php",
            "c" | "h" => "c",
            "cpp" | "c++" | "cc" | "cxx" | "hpp" => "cpp",
            "cs" | "csharp" => "cs",
            "html" => "html",
            "css" => "css",
            "scss" => "scss",
            "sql" => "sql",
            "xml" => "xml",
            "lua" => "lua",
            _ => "txt",
        };
    }
    "txt"
}

/// Lowercases `title` and collapses every run of non-alphanumerics into `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "artifact".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(kind: ArtifactKind, title: &str, language: Option<&str>) -> Artifact {
        Artifact {
            id: "a-0".into(),
            kind,
            title: title.into(),
            description: None,
            content: String::new(),
            language: language.map(String::from),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn kind_serializes_under_type_key() {
        let a = artifact(ArtifactKind::Svg, "SVG Image", None);
        let value = serde_json::to_value(&a).unwrap();
        assert_eq!(value["type"], "svg");
        assert_eq!(value["createdAt"], 0);
        assert!(value.get("language").is_none());
    }

    #[test]
    fn backend_payload_deserializes() {
        let json = r#"{"id":"x","type":"react","title":"Counter","content":"<div/>","createdAt":1,"updatedAt":2}"#;
        let a: Artifact = serde_json::from_str(json).unwrap();
        assert_eq!(a.kind, ArtifactKind::React);
        assert_eq!(a.description, None);
        assert_eq!(a.updated_at, 2);
    }

    #[test]
    fn file_names_use_slugged_title_and_kind_extension() {
        assert_eq!(
            artifact(ArtifactKind::Html, "HTML Preview", None).file_name(),
            "html-preview.html"
        );
        assert_eq!(
            artifact(ArtifactKind::Code, "Rust Code (2)", Some("rust")).file_name(),
            "rust-code-2.rs"
        );
        assert_eq!(
            artifact(ArtifactKind::React, "Counter", Some("tsx")).file_name(),
            "counter.tsx"
        );
        assert_eq!(
            artifact(ArtifactKind::Code, "Brainfuck", Some("bf")).file_name(),
            "brainfuck.txt"
        );
    }

    #[test]
    fn slugify_falls_back_for_symbol_only_titles() {
        assert_eq!(slugify("!!!"), "artifact");
        assert_eq!(slugify("  Hello,  World "), "hello-world");
    }

    #[test]
    fn invalid_kind_strings_are_rejected() {
        assert!(ArtifactKind::try_from("markdown").is_err());
        assert_eq!(ArtifactKind::try_from("json"), Ok(ArtifactKind::Json));
    }
}
