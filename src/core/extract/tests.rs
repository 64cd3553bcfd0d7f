use super::*;

const T0: i64 = 1_700_000_000_000;

fn extract(text: &str) -> Extraction {
    extract_artifacts_at(text, "msg-1", &ExtractOptions::default(), T0)
}

#[test]
fn text_without_fences_is_returned_unchanged() {
    for text in ["", "plain reply", "use `x` and ``y``\n\n- a\n- b\n", "a\n\n\n\nb"] {
        let out = extract(text);
        assert_eq!(out.content, text);
        assert!(out.artifacts.is_empty());
    }
}

#[test]
fn html_block_is_promoted_and_removed() {
    let out = extract("Here:\n```html\n<b>hi</b>\n```\n");
    assert_eq!(out.content, "Here:\n");
    assert_eq!(out.artifacts.len(), 1);
    let a = &out.artifacts[0];
    assert_eq!(a.kind, ArtifactKind::Html);
    assert_eq!(a.content, "<b>hi</b>");
    assert_eq!(a.title, "HTML Preview");
    assert_eq!(a.created_at, T0);
    assert_eq!(a.updated_at, T0);
    assert!(a.id.starts_with("msg-1-0-"));
}

#[test]
fn valid_json_block_round_trips_through_artifact_content() {
    let out = extract("```json\n{\"a\":1,\"b\":[true,null]}\n```");
    assert_eq!(out.artifacts.len(), 1);
    assert_eq!(out.artifacts[0].kind, ArtifactKind::Json);
    let parsed: serde_json::Value = serde_json::from_str(&out.artifacts[0].content).unwrap();
    assert_eq!(parsed, serde_json::json!({"a": 1, "b": [true, null]}));
    assert_eq!(out.content, "");
}

#[test]
fn malformed_json_block_becomes_code() {
    let out = extract("```json\n{a:1}\n```");
    assert_eq!(out.artifacts.len(), 1);
    assert_eq!(out.artifacts[0].kind, ArtifactKind::Code);
    assert_eq!(out.artifacts[0].language.as_deref(), Some("json"));
    assert_eq!(out.artifacts[0].title, "JSON Code");
}

#[test]
fn unterminated_fence_defers_everything() {
    let text = "```html\n<p>done</p>\n```\nand now\n```python\nprint(";
    let out = extract(text);
    assert_eq!(out.content, text);
    assert!(out.artifacts.is_empty());
}

#[test]
fn extraction_is_idempotent() {
    let text = "Intro\n\n```rust\nfn main() {}\n```\n\nMiddle\n\n```svg\n<svg></svg>\n```\n\nEnd";
    let first = extract_artifacts_with(text, "m", &ExtractOptions::default());
    let second = extract_artifacts_with(text, "m", &ExtractOptions::default());
    assert_eq!(first.content, second.content);
    let key = |e: &Extraction| {
        e.artifacts
            .iter()
            .map(|a| (a.id.clone(), a.kind, a.content.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(key(&first), key(&second));
}

#[test]
fn residual_collapses_blank_lines_at_removal_seams() {
    let out = extract("Intro\n\n```rust\nfn main() {}\n```\n\nMiddle\n\n```svg\n<svg></svg>\n```\n\nEnd");
    assert_eq!(out.content, "Intro\n\nMiddle\n\nEnd");
    assert_eq!(out.artifacts.len(), 2);
    assert_eq!(out.artifacts[0].title, "Rust Code");
    assert_eq!(out.artifacts[1].kind, ArtifactKind::Svg);
}

#[test]
fn crlf_seams_collapse_like_lf_seams() {
    let out = extract(
        "Intro\r\n\r\n```rust\r\nfn main() {}\r\n```\r\n\r\nMiddle\r\n\r\n```json\r\n{}\r\n```\r\n\r\nEnd",
    );
    assert_eq!(out.content, "Intro\r\n\r\nMiddle\r\n\r\nEnd");
    assert_eq!(out.artifacts.len(), 2);

    let leading = extract("```html\r\n<i>x</i>\r\n```\r\n\r\nThat is the page.");
    assert_eq!(leading.content, "That is the page.");
}

#[test]
fn leading_block_leaves_no_leading_newlines() {
    let out = extract("```html\n<i>x</i>\n```\n\nThat is the page.");
    assert_eq!(out.content, "That is the page.");
}

#[test]
fn inline_blocks_stay_and_promoted_blocks_go() {
    let text = "Run:\n```\nls\n```\nThen:\n```bash\nmake test\n```\nDone.";
    let out = extract(text);
    assert_eq!(out.content, "Run:\n```\nls\n```\nThen:\nDone.");
    assert_eq!(out.artifacts.len(), 1);
    assert_eq!(out.artifacts[0].language.as_deref(), Some("bash"));
}

#[test]
fn nothing_is_lost_once_settled() {
    let text = "a\n```\nshort\n```\nb\n```css\np { color: red }\n```\nc\n```\n```\n";
    let out = extract(text);
    for artifact in &out.artifacts {
        assert!(text.contains(&artifact.content));
        assert!(!out.content.contains(&artifact.content));
    }
    assert!(out.content.contains("short"));
    assert!(out.content.contains("```\n```"));
    assert_eq!(out.artifacts.len(), 1);
}

#[test]
fn empty_blocks_are_not_promoted() {
    let out = extract("```html\n```\n");
    assert!(out.artifacts.is_empty());
    assert_eq!(out.content, "```html\n```\n");
}

#[test]
fn ids_differ_by_position_and_content() {
    let out = extract("```py\nx = 1\n```\n```py\nx = 1\n```\n```py\nx = 2\n```\n");
    let ids: Vec<_> = out.artifacts.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_eq!(ids[0].rsplit('-').next(), ids[1].rsplit('-').next());
}

#[test]
fn repeated_titles_are_numbered() {
    let out = extract("```py\na\n```\n```py\nb\n```\n```py\nc\n```\n");
    let titles: Vec<_> = out.artifacts.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["Python Code", "Python Code (2)", "Python Code (3)"]);
}

#[test]
fn scope_prefixes_ids() {
    let a = extract_artifacts_at("```svg\n<svg/>\n```", "one", &ExtractOptions::default(), T0);
    let b = extract_artifacts_at("```svg\n<svg/>\n```", "two", &ExtractOptions::default(), T0);
    assert!(a.artifacts[0].id.starts_with("one-0-"));
    assert!(b.artifacts[0].id.starts_with("two-0-"));
}

#[test]
fn description_counts_lines() {
    let out = extract("```go\npackage main\n\nfunc main() {}\n```");
    assert_eq!(out.artifacts[0].description.as_deref(), Some("3 lines of go"));
}

#[test]
fn extractor_trait_uses_configured_options() {
    let body = (0..3).map(|i| format!("row {i}")).collect::<Vec<_>>().join("\n");
    let text = format!("```\n{body}\n```");
    assert!(FenceExtractor::default().extract(&text, "m").artifacts.is_empty());

    let eager = FenceExtractor::new(ExtractOptions {
        min_text_lines: 3,
        ..ExtractOptions::default()
    });
    let out = eager.extract(&text, "m");
    assert_eq!(out.artifacts.len(), 1);
    assert_eq!(out.artifacts[0].kind, ArtifactKind::Text);
    assert_eq!(out.artifacts[0].title, "Text");
}
