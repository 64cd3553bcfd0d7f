use crate::ui::theme::Theme;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, OnceLock};

// Simple FIFO cache (bounded) for highlighted blocks
// key = (lang_norm, hash)

fn hash_code(lang: &str, code: &str, theme_sig: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    theme_sig.hash(&mut hasher);
    hasher.finish()
}

struct SimpleCache {
    map: HashMap<(String, u64), String>,
    order: VecDeque<(String, u64)>,
    cap: usize,
}

impl SimpleCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }
    fn get(&self, k: &(String, u64)) -> Option<String> {
        self.map.get(k).cloned()
    }
    fn put(&mut self, k: (String, u64), v: String) {
        if !self.map.contains_key(&k) {
            self.order.push_back(k.clone());
        }
        self.map.insert(k, v);
        while self.map.len() > self.cap {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
    }
}

static SYNTAX_CACHE: Mutex<Option<SimpleCache>> = Mutex::new(None);

fn get_cache() -> MutexGuard<'static, Option<SimpleCache>> {
    // A poisoned cache only ever holds rendered strings; keep using it.
    SYNTAX_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn ensure_cache(cap: usize) {
    let mut guard = get_cache();
    if guard.is_none() {
        *guard = Some(SimpleCache::new(cap));
    }
}

fn syntax_set() -> &'static syntect::parsing::SyntaxSet {
    static SYNTAX_SET: OnceLock<syntect::parsing::SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(syntect::parsing::SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static syntect::highlighting::ThemeSet {
    static THEME_SET: OnceLock<syntect::highlighting::ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(syntect::highlighting::ThemeSet::load_defaults)
}

/// Canonical name for a fence language tag. `jsx` and `tsx` stay distinct
/// from plain JavaScript/TypeScript because they mark components.
pub fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" | "python3" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" | "console" => "bash".into(),
        "js" | "javascript" | "mjs" | "cjs" | "node" => "javascript".into(),
        "ts" | "typescript" => "typescript".into(),
        "jsx" => "jsx".into(),
        "tsx" => "tsx".into(),
        "json" => "json".into(),
        "toml" => "toml".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "go" | "golang" => "go".into(),
        "c" | "h" => "c".into(),
        "cpp" | "c++" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "cs" | "csharp" | "c#" => "csharp".into(),
        "java" => "java".into(),
        "kotlin" | "kt" => "kotlin".into(),
        "swift" => "swift".into(),
        "rb" | "ruby" => "ruby".into(),
        "md" | "markdown" => "markdown".into(),
        "html" => "html".into(),
        "css" => "css".into(),
        "sql" => "sql".into(),
        other => other.into(),
    }
}

const KNOWN_LANGUAGES: &[&str] = &[
    "bash",
    "c",
    "clojure",
    "cpp",
    "csharp",
    "css",
    "dart",
    "diff",
    "dockerfile",
    "elixir",
    "erlang",
    "go",
    "graphql",
    "haskell",
    "ini",
    "java",
    "javascript",
    "json",
    "jsx",
    "kotlin",
    "less",
    "lua",
    "makefile",
    "markdown",
    "nix",
    "ocaml",
    "perl",
    "php",
    "powershell",
    "proto",
    "python",
    "r",
    "ruby",
    "rust",
    "sass",
    "scala",
    "scss",
    "sql",
    "svelte",
    "swift",
    "toml",
    "tsx",
    "typescript",
    "vue",
    "xml",
    "yaml",
    "zig",
];

/// Whether `lang` (already normalized) names a programming or data language.
pub fn is_known_language(lang: &str) -> bool {
    KNOWN_LANGUAGES.binary_search(&lang).is_ok()
}

/// Human-facing name for a normalized language tag.
pub fn language_display_name(lang: &str) -> String {
    let name = match lang {
        "javascript" => "JavaScript",
        "typescript" => "TypeScript",
        "jsx" => "JSX",
        "tsx" => "TSX",
        "json" => "JSON",
        "yaml" => "YAML",
        "toml" => "TOML",
        "html" => "HTML",
        "css" => "CSS",
        "scss" => "SCSS",
        "sql" => "SQL",
        "xml" => "XML",
        "svg" => "SVG",
        "cpp" => "C++",
        "csharp" => "C#",
        "php" => "PHP",
        "graphql" => "GraphQL",
        "powershell" => "PowerShell",
        other => {
            let mut chars = other.chars();
            return match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
        }
    };
    name.to_string()
}

/// Token syntect's default set understands for `lang`.
fn highlight_token(lang: &str) -> &str {
    match lang {
        "jsx" | "tsx" | "typescript" => "js",
        "svg" => "xml",
        "bash" => "sh",
        "csharp" => "cs",
        other => other,
    }
}

/// Returns true if the highlighter ships a grammar for `lang_hint`.
pub fn is_highlightable(lang_hint: &str) -> bool {
    let lang_norm = normalize_lang_hint(lang_hint);
    find_syntax(&lang_norm).is_some()
}

fn find_syntax(lang_norm: &str) -> Option<&'static syntect::parsing::SyntaxReference> {
    if lang_norm.is_empty() {
        return None;
    }
    let ps = syntax_set();
    let token = highlight_token(lang_norm);
    ps.find_syntax_by_token(token)
        .or_else(|| ps.find_syntax_by_extension(token))
}

// Helper to build the cache-relevant theme signature.
pub(crate) fn build_theme_signature(theme: &Theme) -> String {
    format!(
        "{}|{}|{}",
        theme.syntect_theme_name(),
        theme.code_background,
        theme.background
    )
}

/// Highlights `code` as an HTML `<pre>` fragment with inline styles.
///
/// Returns `None` when the language has no grammar in the fixed set, so
/// callers can fall back to a plain monospace block.
pub fn highlight_code_block(lang_hint: &str, code: &str, theme: &Theme) -> Option<String> {
    ensure_cache(64);
    let lang_norm = normalize_lang_hint(lang_hint);
    let syntax = find_syntax(&lang_norm)?;

    let ts = theme_set();
    let fallback_names = [
        "base16-ocean.light",
        "Solarized (light)",
        "base16-ocean.dark",
    ];
    let syn_theme = ts.themes.get(theme.syntect_theme_name()).or_else(|| {
        fallback_names
            .iter()
            .find_map(|name| ts.themes.get(*name))
    })?;

    let theme_sig = build_theme_signature(theme);
    let key = (lang_norm.clone(), hash_code(&lang_norm, code, &theme_sig));
    if let Some(html) = get_cache().as_ref().and_then(|c| c.get(&key)) {
        return Some(html);
    }

    let html =
        syntect::html::highlighted_html_for_string(code, syntax_set(), syntax, syn_theme).ok()?;

    if let Some(cache) = get_cache().as_mut() {
        cache.put(key, html.clone());
    }
    Some(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeMode;

    #[test]
    fn normalize_lang_hint_maps_common_aliases() {
        assert_eq!(normalize_lang_hint("py"), "python");
        assert_eq!(normalize_lang_hint("JS"), "javascript");
        assert_eq!(normalize_lang_hint("TsX"), "tsx");
        assert_eq!(normalize_lang_hint("yml"), "yaml");
        assert_eq!(normalize_lang_hint("hpp"), "cpp");
        assert_eq!(normalize_lang_hint("rs"), "rust");
        assert_eq!(normalize_lang_hint(" c# "), "csharp");
    }

    #[test]
    fn known_language_list_is_sorted_for_binary_search() {
        let mut sorted = KNOWN_LANGUAGES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, KNOWN_LANGUAGES);
        assert!(is_known_language("rust"));
        assert!(!is_known_language("klingon"));
    }

    #[test]
    fn display_names_special_case_acronyms() {
        assert_eq!(language_display_name("json"), "JSON");
        assert_eq!(language_display_name("cpp"), "C++");
        assert_eq!(language_display_name("python"), "Python");
        assert_eq!(language_display_name(""), "");
    }

    #[test]
    fn highlights_supported_language_as_html() {
        let theme = Theme::for_mode(ThemeMode::Dark, false);
        let html = highlight_code_block("rust", "fn main() {}\n", &theme).expect("rust grammar");
        assert!(html.starts_with("<pre"));
        assert!(html.contains("main"));
    }

    #[test]
    fn unsupported_language_returns_none() {
        let theme = Theme::for_mode(ThemeMode::Light, false);
        assert!(highlight_code_block("klingon", "qapla'", &theme).is_none());
        assert!(highlight_code_block("", "plain", &theme).is_none());
        assert!(!is_highlightable("klingon"));
        assert!(is_highlightable("jsx"));
    }

    #[test]
    fn theme_signature_changes_with_theme() {
        let dark = Theme::for_mode(ThemeMode::Dark, false);
        let light = Theme::for_mode(ThemeMode::Light, false);
        assert_ne!(build_theme_signature(&dark), build_theme_signature(&light));
    }
}
