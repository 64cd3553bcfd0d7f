//! HTML for a single chat message.
//!
//! A streaming message is shown as escaped verbatim text, so a half-written
//! fence never flickers into and out of a code block. Once settled, the
//! residual text goes through markdown and each artifact gets a card.

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::core::artifact::Artifact;
use crate::core::message::{ChatMessage, MessageStatistics};
use crate::ui::render::{escape_html, ViewMode};
use crate::ui::theme::Theme;
use crate::ui::viewer::ArtifactViewer;
use crate::utils::syntax::highlight_code_block;

pub struct ViewContext<'a> {
    pub viewer: &'a ArtifactViewer,
    pub theme: &'a Theme,
    pub syntax: bool,
    /// Epoch milliseconds, for time-limited indicators.
    pub now: i64,
}

pub fn render_message(msg: &ChatMessage, ctx: &ViewContext<'_>) -> String {
    let mut out = format!(
        "<article class=\"message {}{}\" data-message-id=\"{}\">\n",
        msg.role.as_str(),
        if msg.is_streaming() { " streaming" } else { "" },
        escape_html(&msg.id)
    );
    if msg.is_streaming() {
        out.push_str("<pre class=\"message-raw\">");
        out.push_str(&escape_html(&msg.raw));
        out.push_str("</pre>\n");
    } else {
        out.push_str("<div class=\"message-body\">\n");
        out.push_str(&render_markdown(&msg.content, ctx.theme, ctx.syntax));
        out.push_str("</div>\n");
        for artifact in msg.artifacts() {
            out.push_str(&render_card(artifact, ctx));
        }
    }
    if let Some(stats) = &msg.statistics {
        if let Some(line) = statistics_line(stats) {
            out.push_str(&format!("<footer class=\"message-stats\">{line}</footer>\n"));
        }
    }
    out.push_str("</article>\n");
    out
}

/// Markdown to HTML. Raw HTML in the text is shown, not interpreted, and
/// fenced code left inline is highlighted when possible.
pub fn render_markdown(text: &str, theme: &Theme, syntax: bool) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut events = Vec::new();
    let mut code: Option<(String, String)> = None;
    for event in Parser::new_ext(text, options) {
        if let Some((_, body)) = code.as_mut() {
            match event {
                Event::Text(t) => body.push_str(&t),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, body)) = code.take() {
                        events.extend(code_block_events(&lang, body, theme));
                    }
                }
                _ => {}
            }
            continue;
        }
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) if syntax => {
                code = Some((lang.to_string(), String::new()));
            }
            Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(text.len() * 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn code_block_events<'a>(lang: &str, body: String, theme: &Theme) -> Vec<Event<'a>> {
    let tag = lang.split_whitespace().next().unwrap_or("");
    match highlight_code_block(tag, &body, theme) {
        Some(html) => vec![Event::Html(CowStr::from(html))],
        None => vec![
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(CowStr::from(
                tag.to_string(),
            )))),
            Event::Text(CowStr::from(body)),
            Event::End(TagEnd::CodeBlock),
        ],
    }
}

fn render_card(artifact: &Artifact, ctx: &ViewContext<'_>) -> String {
    let id = escape_html(&artifact.id);
    let mut classes = String::from("artifact-card");
    if ctx.viewer.is_fullscreen(&artifact.id) {
        classes.push_str(" fullscreen");
    }

    let mut out = format!(
        "<section class=\"{classes}\" data-artifact-id=\"{id}\" data-kind=\"{}\">\n<header>\n<h3>{}</h3>\n",
        artifact.kind,
        escape_html(&artifact.title)
    );
    if let Some(description) = &artifact.description {
        out.push_str(&format!(
            "<p class=\"artifact-description\">{}</p>\n",
            escape_html(description)
        ));
    }

    let copy_label = if ctx.viewer.is_copied(&artifact.id, ctx.now) {
        "Copied"
    } else {
        "Copy"
    };
    out.push_str(&format!(
        "<button data-action=\"copy\">{copy_label}</button>\n<button data-action=\"download\">Download</button>\n"
    ));
    if artifact.kind.has_preview() {
        let label = match ctx.viewer.view_mode(&artifact.id) {
            ViewMode::Preview => "Source",
            ViewMode::Raw => "Preview",
        };
        out.push_str(&format!(
            "<button data-action=\"toggle-view\">{label}</button>\n"
        ));
    }
    if artifact.kind.can_open_in_window() {
        out.push_str("<button data-action=\"open-window\">Open</button>\n");
    }
    let fullscreen_label = if ctx.viewer.is_fullscreen(&artifact.id) {
        "Exit fullscreen"
    } else {
        "Fullscreen"
    };
    out.push_str(&format!(
        "<button data-action=\"fullscreen\">{fullscreen_label}</button>\n</header>\n"
    ));

    out.push_str(&ctx.viewer.plan(artifact, ctx.theme, ctx.syntax).to_html());
    out.push_str("\n</section>\n");
    out
}

fn statistics_line(stats: &MessageStatistics) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(tokens) = stats.tokens {
        parts.push(format!("{tokens} tokens"));
    }
    if let Some(rate) = stats.tokens_per_second {
        parts.push(format!("{rate:.1} tok/s"));
    }
    if let Some(ms) = stats.duration_ms {
        parts.push(format!("{:.1}s", ms as f64 / 1000.0));
    }
    (!parts.is_empty()).then(|| parts.join(" · "))
}
