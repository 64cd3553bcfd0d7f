//! Render plans for artifacts.
//!
//! [`render_artifact`] decides how an artifact is shown without touching
//! any output surface. The result is a closed [`RenderPlan`] that a front
//! end turns into markup with [`RenderPlan::to_html`]. Content that fails
//! to parse degrades to [`RenderPlan::Error`]; rendering never panics.

use serde::Serialize;

use crate::core::artifact::{Artifact, ArtifactKind};
use crate::core::extract::looks_like_svg;
use crate::ui::theme::Theme;
use crate::utils::syntax::highlight_code_block;

/// Sandbox flags for HTML previews. Scripts run, but the frame never
/// shares the host's origin.
pub const HTML_SANDBOX: &str = "allow-scripts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Preview,
    Raw,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Preview => ViewMode::Raw,
            ViewMode::Raw => ViewMode::Preview,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum RenderPlan {
    /// An isolated frame whose document is `srcdoc`.
    SandboxedFrame {
        srcdoc: String,
        sandbox: &'static str,
    },
    /// Markup placed directly in the page.
    InlineMarkup { markup: String },
    /// Re-serialized JSON with two-space indentation.
    Json { pretty: String },
    Highlighted { language: String, html: String },
    Monospace { text: String },
    Error { message: String },
}

impl RenderPlan {
    pub fn name(&self) -> &'static str {
        match self {
            RenderPlan::SandboxedFrame { .. } => "sandboxed_frame",
            RenderPlan::InlineMarkup { .. } => "inline_markup",
            RenderPlan::Json { .. } => "json",
            RenderPlan::Highlighted { .. } => "highlighted",
            RenderPlan::Monospace { .. } => "monospace",
            RenderPlan::Error { .. } => "error",
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            RenderPlan::SandboxedFrame { srcdoc, sandbox } => format!(
                "<iframe class=\"artifact-frame\" sandbox=\"{sandbox}\" srcdoc=\"{}\"></iframe>",
                escape_html(srcdoc)
            ),
            RenderPlan::InlineMarkup { markup } => {
                format!("<div class=\"artifact-inline\">{markup}</div>")
            }
            RenderPlan::Json { pretty } => format!(
                "<pre class=\"artifact-json\"><code>{}</code></pre>",
                escape_html(pretty)
            ),
            RenderPlan::Highlighted { html, .. } => html.clone(),
            RenderPlan::Monospace { text } => format!(
                "<pre class=\"artifact-mono\"><code>{}</code></pre>",
                escape_html(text)
            ),
            RenderPlan::Error { message } => format!(
                "<div class=\"artifact-error\" role=\"alert\">{}</div>",
                escape_html(message)
            ),
        }
    }
}

/// Chooses how to show `artifact` in `mode`.
///
/// With `syntax` off every code path renders as plain monospace.
pub fn render_artifact(
    artifact: &Artifact,
    mode: ViewMode,
    theme: &Theme,
    syntax: bool,
) -> RenderPlan {
    if mode == ViewMode::Raw {
        return highlighted(source_language(artifact), &artifact.content, theme, syntax);
    }
    match artifact.kind {
        ArtifactKind::Html => RenderPlan::SandboxedFrame {
            srcdoc: html_shell(&artifact.content, theme),
            sandbox: HTML_SANDBOX,
        },
        ArtifactKind::Svg => render_svg(&artifact.content),
        ArtifactKind::Json => render_json(&artifact.content),
        ArtifactKind::Code | ArtifactKind::Text | ArtifactKind::React => {
            highlighted(artifact.language.as_deref(), &artifact.content, theme, syntax)
        }
    }
}

/// Language used for the raw source view.
fn source_language(artifact: &Artifact) -> Option<&str> {
    match artifact.kind {
        ArtifactKind::Html => Some("html"),
        ArtifactKind::Svg => Some("svg"),
        ArtifactKind::Json => Some("json"),
        ArtifactKind::Code | ArtifactKind::Text => artifact.language.as_deref(),
        ArtifactKind::React => Some(artifact.language.as_deref().unwrap_or("jsx")),
    }
}

fn highlighted(language: Option<&str>, content: &str, theme: &Theme, syntax: bool) -> RenderPlan {
    if syntax {
        if let Some(lang) = language {
            if let Some(html) = highlight_code_block(lang, content, theme) {
                return RenderPlan::Highlighted {
                    language: lang.to_string(),
                    html,
                };
            }
        }
    }
    RenderPlan::Monospace {
        text: content.to_string(),
    }
}

fn render_svg(content: &str) -> RenderPlan {
    let trimmed = content.trim();
    if looks_like_svg(trimmed) && svg_is_closed(trimmed) {
        RenderPlan::InlineMarkup {
            markup: trimmed.to_string(),
        }
    } else {
        RenderPlan::Error {
            message: "Invalid SVG: expected a single <svg> root element".to_string(),
        }
    }
}

/// Either one self-closing `<svg .../>` root, or text ending in `</svg>`
/// with every `<svg` open tag matched.
fn svg_is_closed(svg: &str) -> bool {
    let svg = svg.to_ascii_lowercase();
    let opens = svg.matches("<svg").count();
    let closes = svg.matches("</svg>").count();
    if svg.ends_with("</svg>") {
        return opens == closes;
    }
    let Some(start) = svg.find("<svg") else {
        return false;
    };
    let root = &svg[start..];
    opens == 1 && closes == 0 && root.ends_with("/>") && root.find('>') == Some(root.len() - 1)
}

fn render_json(content: &str) -> RenderPlan {
    match serde_json::from_str::<serde_json::Value>(content) {
        // serde_json's pretty printer indents with two spaces.
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => RenderPlan::Json { pretty },
            Err(e) => RenderPlan::Error {
                message: format!("Invalid JSON: {e}"),
            },
        },
        Err(e) => RenderPlan::Error {
            message: format!("Invalid JSON: {e}"),
        },
    }
}

/// Minimal document wrapping untrusted HTML for a sandboxed frame. The
/// content goes in verbatim.
pub fn html_shell(content: &str, theme: &Theme) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<style>body{{margin:0;padding:16px;font-family:system-ui,sans-serif;background:{};color:{};}}</style>\n\
</head>\n<body>\n{}\n</body>\n</html>\n",
        theme.background, theme.foreground, content
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
