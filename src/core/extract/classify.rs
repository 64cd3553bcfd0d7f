use crate::core::artifact::ArtifactKind;
use crate::utils::syntax::{is_known_language, normalize_lang_hint};

use super::ExtractOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Classified {
    pub kind: ArtifactKind,
    pub language: Option<String>,
}

impl Classified {
    fn new(kind: ArtifactKind, language: Option<&str>) -> Self {
        Self {
            kind,
            language: language.filter(|l| !l.is_empty()).map(String::from),
        }
    }
}

/// Decides whether a fenced block becomes an artifact and of which kind.
///
/// Returns `None` for blocks that stay inline: empty bodies, and short
/// blocks whose tag is missing or unknown.
pub(super) fn classify(info: &str, body: &str, options: &ExtractOptions) -> Option<Classified> {
    if body.trim().is_empty() {
        return None;
    }

    let tag = normalize_lang_hint(info);
    let tag = tag.as_str();

    match tag {
        "html" | "htm" | "xhtml" => return Some(Classified::new(ArtifactKind::Html, Some("html"))),
        "svg" => return Some(Classified::new(ArtifactKind::Svg, Some("svg"))),
        _ => {}
    }

    if looks_like_svg(body) {
        return Some(Classified::new(ArtifactKind::Svg, Some("svg")));
    }

    match tag {
        "json" | "jsonc" | "json5" => {
            return Some(if parses_as_json(body) {
                Classified::new(ArtifactKind::Json, Some("json"))
            } else {
                Classified::new(ArtifactKind::Code, Some("json"))
            });
        }
        "jsx" | "tsx" => return Some(Classified::new(ArtifactKind::React, Some(tag))),
        "javascript" | "typescript" if looks_like_component(body) => {
            let lang = if tag == "typescript" { "tsx" } else { "jsx" };
            return Some(Classified::new(ArtifactKind::React, Some(lang)));
        }
        "" => {}
        known if is_known_language(known) => {
            return Some(Classified::new(ArtifactKind::Code, Some(known)));
        }
        _ => {}
    }

    if tag.is_empty() {
        if looks_like_html_document(body) {
            return Some(Classified::new(ArtifactKind::Html, Some("html")));
        }
        if options.promote_untagged_json && looks_like_json_container(body) {
            return Some(Classified::new(ArtifactKind::Json, Some("json")));
        }
    }

    if body.lines().count() >= options.min_text_lines {
        return Some(Classified::new(ArtifactKind::Text, Some(tag)));
    }

    None
}

fn parses_as_json(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body).is_ok()
}

/// Untagged blocks only count as JSON when they hold an object or array,
/// so a bare `42` or `"word"` stays inline.
fn looks_like_json_container(body: &str) -> bool {
    let trimmed = body.trim_start();
    (trimmed.starts_with('{') || trimmed.starts_with('[')) && parses_as_json(body)
}

/// Skips leading whitespace, XML prologs, comments and doctype declarations.
fn skip_markup_preamble(mut s: &str) -> &str {
    loop {
        s = s.trim_start();
        let rest = if s.starts_with("<?") {
            s.find("?>").map(|end| &s[end + 2..])
        } else if s.starts_with("<!--") {
            s.find("-->").map(|end| &s[end + 3..])
        } else if s.get(..9).is_some_and(|p| p.eq_ignore_ascii_case("<!doctype")) {
            s.find('>').map(|end| &s[end + 1..])
        } else {
            None
        };
        match rest {
            Some(next) => s = next,
            None => return s,
        }
    }
}

fn starts_with_tag(s: &str, tag: &str) -> bool {
    let open = tag.len() + 1;
    if s.len() < open || !s.is_char_boundary(open) {
        return false;
    }
    if !s.starts_with('<') || !s[1..open].eq_ignore_ascii_case(tag) {
        return false;
    }
    matches!(
        s[open..].chars().next(),
        None | Some('>') | Some('/') | Some(' ') | Some('\n') | Some('\t') | Some('\r')
    )
}

pub(crate) fn looks_like_svg(body: &str) -> bool {
    starts_with_tag(skip_markup_preamble(body), "svg")
}

fn looks_like_html_document(body: &str) -> bool {
    let trimmed = body.trim_start();
    if trimmed
        .get(..14)
        .is_some_and(|p| p.eq_ignore_ascii_case("<!doctype html"))
    {
        return true;
    }
    starts_with_tag(skip_markup_preamble(body), "html")
}

fn looks_like_component(body: &str) -> bool {
    let imports_react = body.contains("from 'react'")
        || body.contains("from \"react\"")
        || body.contains("import React");
    let uses_hooks = body.contains("useState(") || body.contains("useEffect(");
    let returns_jsx = (body.contains("return (") || body.contains("=> (")) && body.contains("</");
    let exports_component =
        body.contains("export default function") || body.contains("export default class");
    imports_react || uses_hooks || (exports_component && returns_jsx)
}
