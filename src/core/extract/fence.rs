use memchr::memchr;

/// A complete fenced block located in a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FencedBlock<'a> {
    /// Byte offset of the first character of the opening fence line.
    pub start: usize,
    /// Byte offset just past the closing fence line, including its newline.
    pub end: usize,
    /// First word of the info string, as written.
    pub info: &'a str,
    pub body: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum FenceScan<'a> {
    Complete(Vec<FencedBlock<'a>>),
    /// An opening fence was never closed; the text is still arriving.
    Unterminated { opened_at: usize },
}

struct Line<'a> {
    start: usize,
    /// Offset of the next line (past the `\n`), or `text.len()` on the last line.
    next: usize,
    text: &'a str,
}

fn lines_with_offsets(text: &str) -> impl Iterator<Item = Line<'_>> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= bytes.len() {
            return None;
        }
        let start = pos;
        let (line_end, next) = match memchr(b'\n', &bytes[start..]) {
            Some(rel) => (start + rel, start + rel + 1),
            None => (bytes.len(), bytes.len()),
        };
        pos = next;
        let raw = &text[start..line_end];
        Some(Line {
            start,
            next,
            text: raw.strip_suffix('\r').unwrap_or(raw),
        })
    })
}

/// Strips up to three leading spaces, matching how markdown treats fence indentation.
fn strip_fence_indent(line: &str) -> Option<&str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        None
    } else {
        Some(&line[indent..])
    }
}

/// Returns the fence length and info string if `line` opens a block.
fn parse_opening(line: &str) -> Option<(usize, &str)> {
    let rest = strip_fence_indent(line)?;
    let ticks = rest.len() - rest.trim_start_matches('`').len();
    if ticks < 3 {
        return None;
    }
    let info = rest[ticks..].trim();
    // ```inline``` on one line is a code span, not a fence
    if info.contains('`') {
        return None;
    }
    Some((ticks, info))
}

fn is_closing(line: &str, open_ticks: usize) -> bool {
    let Some(rest) = strip_fence_indent(line) else {
        return false;
    };
    let ticks = rest.len() - rest.trim_start_matches('`').len();
    ticks >= open_ticks && rest[ticks..].trim().is_empty()
}

pub(super) fn scan_fences(text: &str) -> FenceScan<'_> {
    let mut blocks = Vec::new();
    // (fence start, body start, tick count, info)
    let mut open: Option<(usize, usize, usize, &str)> = None;

    for line in lines_with_offsets(text) {
        match open {
            None => {
                if let Some((ticks, info)) = parse_opening(line.text) {
                    let lang = info.split_ascii_whitespace().next().unwrap_or("");
                    open = Some((line.start, line.next, ticks, lang));
                }
            }
            Some((start, body_start, ticks, info)) => {
                if is_closing(line.text, ticks) {
                    let body_end = line.start.max(body_start);
                    let raw_body = &text[body_start..body_end];
                    let body = raw_body
                        .strip_suffix('\n')
                        .map(|b| b.strip_suffix('\r').unwrap_or(b))
                        .unwrap_or(raw_body);
                    blocks.push(FencedBlock {
                        start,
                        end: line.next,
                        info,
                        body,
                    });
                    open = None;
                }
            }
        }
    }

    match open {
        Some((opened_at, ..)) => FenceScan::Unterminated { opened_at },
        None => FenceScan::Complete(blocks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(text: &str) -> Vec<FencedBlock<'_>> {
        match scan_fences(text) {
            FenceScan::Complete(blocks) => blocks,
            other => panic!("expected complete scan, got {other:?}"),
        }
    }

    #[test]
    fn finds_block_offsets_and_body() {
        let text = "Here:\n```html\n<b>hi</b>\n```\nafter";
        let blocks = complete(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].info, "html");
        assert_eq!(blocks[0].body, "<b>hi</b>");
        assert_eq!(&text[..blocks[0].start], "Here:\n");
        assert_eq!(&text[blocks[0].end..], "after");
    }

    #[test]
    fn closing_fence_at_end_of_input_without_newline() {
        let blocks = complete("```json\n{\"a\":1}\n```");
        assert_eq!(blocks[0].body, "{\"a\":1}");
        assert_eq!(blocks[0].end, "```json\n{\"a\":1}\n```".len());
    }

    #[test]
    fn info_string_keeps_only_first_word() {
        let blocks = complete("``` rust title=\"main.rs\"\nfn main() {}\n```\n");
        assert_eq!(blocks[0].info, "rust");
    }

    #[test]
    fn longer_fence_needs_matching_close() {
        let text = "````md\n```js\nx\n```\n````\n";
        let blocks = complete(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].info, "md");
        assert_eq!(blocks[0].body, "```js\nx\n```");
    }

    #[test]
    fn inline_triple_backticks_are_not_fences() {
        assert!(complete("use ```code``` inline").is_empty());
    }

    #[test]
    fn deeply_indented_fences_are_ignored() {
        assert!(complete("    ```\n    code\n    ```\n").is_empty());
    }

    #[test]
    fn dangling_fence_reports_unterminated() {
        let text = "ok\n```python\nprint(1)\n";
        assert_eq!(scan_fences(text), FenceScan::Unterminated { opened_at: 3 });
    }

    #[test]
    fn empty_body_block_is_found() {
        let blocks = complete("```\n```\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "");
    }

    #[test]
    fn crlf_lines_are_handled() {
        let blocks = complete("```svg\r\n<svg/>\r\n```\r\n");
        assert_eq!(blocks[0].info, "svg");
        assert_eq!(blocks[0].body, "<svg/>");
    }
}
