//! Artifact extraction from assistant text.
//!
//! [`extract_artifacts`] scans a reply for fenced code blocks, promotes the
//! ones worth rendering on their own into [`Artifact`]s and returns the
//! remaining text. Blocks that are not promoted stay in the residual text
//! untouched, so a settled message never loses content: every block is
//! either an artifact or inline.
//!
//! While a reply is still streaming its last fence is usually open. An
//! unterminated fence makes the whole extraction a no-op so callers never
//! see half-built artifacts flicker in and out.
//!
//! # Examples
//!
//! ```
//! use vellum::core::artifact::ArtifactKind;
//! use vellum::core::extract::extract_artifacts;
//!
//! let out = extract_artifacts("Here:\n```html\n<b>hi</b>\n```\n");
//! assert_eq!(out.content, "Here:\n");
//! assert_eq!(out.artifacts.len(), 1);
//! assert_eq!(out.artifacts[0].kind, ArtifactKind::Html);
//! assert_eq!(out.artifacts[0].content, "<b>hi</b>");
//! ```

mod classify;
mod fence;
#[cfg(test)]
mod tests;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::artifact::{Artifact, ArtifactKind};
use crate::utils::syntax::language_display_name;

use self::classify::classify;
use self::fence::{scan_fences, FenceScan};

pub(crate) use self::classify::looks_like_svg;

/// Scope used for artifact ids when no message id is supplied.
pub const DEFAULT_SCOPE: &str = "artifact";

/// Tunables for which fenced blocks get promoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Untagged or unknown-language blocks need at least this many lines to
    /// become a `text` artifact.
    pub min_text_lines: usize,
    /// Promote untagged blocks that parse as a JSON object or array.
    pub promote_untagged_json: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_text_lines: 8,
            promote_untagged_json: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Input text with promoted blocks removed.
    pub content: String,
    pub artifacts: Vec<Artifact>,
}

impl Extraction {
    pub fn unchanged(text: &str) -> Self {
        Self {
            content: text.to_string(),
            artifacts: Vec::new(),
        }
    }
}

/// Seam used by the streaming gate so extraction can be swapped or counted.
pub trait ArtifactExtractor {
    fn extract(&self, text: &str, scope: &str) -> Extraction;
}

/// The fenced-block extractor with its promotion options.
#[derive(Debug, Clone, Default)]
pub struct FenceExtractor {
    pub options: ExtractOptions,
}

impl FenceExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }
}

impl ArtifactExtractor for FenceExtractor {
    fn extract(&self, text: &str, scope: &str) -> Extraction {
        extract_artifacts_with(text, scope, &self.options)
    }
}

pub fn extract_artifacts(text: &str) -> Extraction {
    extract_artifacts_with(text, DEFAULT_SCOPE, &ExtractOptions::default())
}

pub fn extract_artifacts_with(text: &str, scope: &str, options: &ExtractOptions) -> Extraction {
    extract_artifacts_at(text, scope, options, chrono::Utc::now().timestamp_millis())
}

/// Extraction with an explicit timestamp, so the full result is reproducible.
pub fn extract_artifacts_at(
    text: &str,
    scope: &str,
    options: &ExtractOptions,
    now_ms: i64,
) -> Extraction {
    let blocks = match scan_fences(text) {
        FenceScan::Complete(blocks) => blocks,
        FenceScan::Unterminated { opened_at } => {
            debug!(opened_at, "open fence, deferring extraction");
            return Extraction::unchanged(text);
        }
    };
    if blocks.is_empty() {
        return Extraction::unchanged(text);
    }

    let mut content = String::with_capacity(text.len());
    let mut artifacts = Vec::new();
    let mut title_counts: HashMap<String, usize> = HashMap::new();
    let mut cursor = 0;

    for block in &blocks {
        let Some(classified) = classify(block.info, block.body, options) else {
            continue;
        };

        push_segment(&mut content, &text[cursor..block.start], cursor > 0);
        cursor = block.end;

        let index = artifacts.len();
        let base_title = title_for(classified.kind, classified.language.as_deref());
        let seen = title_counts.entry(base_title.clone()).or_insert(0);
        *seen += 1;
        let title = if *seen == 1 {
            base_title
        } else {
            format!("{base_title} ({seen})")
        };

        artifacts.push(Artifact {
            id: artifact_id(
                scope,
                index,
                classified.kind,
                classified.language.as_deref(),
                block.body,
            ),
            kind: classified.kind,
            title,
            description: Some(describe(block.body, classified.language.as_deref())),
            content: block.body.to_string(),
            language: classified.language,
            created_at: now_ms,
            updated_at: now_ms,
        });
    }

    if artifacts.is_empty() {
        return Extraction::unchanged(text);
    }
    push_segment(&mut content, &text[cursor..], true);

    debug!(
        scope,
        blocks = blocks.len(),
        promoted = artifacts.len(),
        "extracted artifacts"
    );
    Extraction { content, artifacts }
}

/// Appends `segment`, trimming line breaks (`\n` or `\r\n`) at a removal
/// seam so that no more than one blank line separates the surrounding
/// paragraphs.
fn push_segment(out: &mut String, segment: &str, after_removal: bool) {
    if !after_removal {
        out.push_str(segment);
        return;
    }
    let leading = leading_break_ends(segment);
    let keep = if out.is_empty() {
        0
    } else {
        leading.len().min(2usize.saturating_sub(trailing_breaks(out)))
    };
    let skip = leading.len() - keep;
    let start = match skip {
        0 => 0,
        n => leading[n - 1],
    };
    out.push_str(&segment[start..]);
}

/// Byte offset just past each line break at the start of `s`.
fn leading_break_ends(s: &str) -> Vec<usize> {
    let mut ends = Vec::new();
    let mut at = 0;
    loop {
        let rest = &s[at..];
        if rest.starts_with("\r\n") {
            at += 2;
        } else if rest.starts_with('\n') {
            at += 1;
        } else {
            return ends;
        }
        ends.push(at);
    }
}

fn trailing_breaks(s: &str) -> usize {
    let mut count = 0;
    let mut rest = s;
    while let Some(stripped) = rest
        .strip_suffix("\r\n")
        .or_else(|| rest.strip_suffix('\n'))
    {
        rest = stripped;
        count += 1;
    }
    count
}

/// Stable id: the owning scope, the ordinal among promoted blocks and a
/// checksum of what was promoted.
fn artifact_id(
    scope: &str,
    index: usize,
    kind: ArtifactKind,
    language: Option<&str>,
    body: &str,
) -> String {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(language.unwrap_or("").as_bytes());
    hasher.update(&[0]);
    hasher.update(body.as_bytes());
    format!("{scope}-{index}-{:08x}", hasher.finalize())
}

fn title_for(kind: ArtifactKind, language: Option<&str>) -> String {
    match (kind, language) {
        (ArtifactKind::Code, Some(lang)) => format!("{} Code", language_display_name(lang)),
        (ArtifactKind::Text, Some(lang)) => format!("{} Text", language_display_name(lang)),
        _ => kind.default_title().to_string(),
    }
}

fn describe(body: &str, language: Option<&str>) -> String {
    let lines = body.lines().count();
    let noun = if lines == 1 { "line" } else { "lines" };
    match language {
        Some(lang) => format!("{lines} {noun} of {lang}"),
        None => format!("{lines} {noun}"),
    }
}
