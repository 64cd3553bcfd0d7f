use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::core::extract::ExtractOptions;
use crate::ui::theme::ThemeMode;
use crate::utils::url::normalize_base_url;

/// Server used when `base-url` is not configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";

/// A named bundle of model choice and behaviour, shown to the user and
/// applied to outgoing requests while active.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Persona {
    pub id: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Chat completions server, e.g. "https://api.example.com/v1"
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    /// Theme preference: "light", "dark" or "system"
    pub theme: Option<String>,
    /// Highlight code artifacts
    pub syntax: Option<bool>,
    /// Lines an untagged block needs before it becomes a text artifact
    pub min_text_lines: Option<usize>,
    /// Promote untagged blocks that parse as a JSON object or array
    pub promote_untagged_json: Option<bool>,
    /// Where downloaded artifacts land; defaults to the working directory
    pub download_dir: Option<PathBuf>,
    #[serde(default)]
    pub personas: Vec<Persona>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    /// The configured theme, falling back to `system` for unknown names.
    pub fn theme_mode(&self) -> ThemeMode {
        match self.theme.as_deref() {
            None => ThemeMode::System,
            Some(name) => ThemeMode::try_from(name).unwrap_or_else(|_| {
                warn!(theme = name, "unknown theme in config, using system");
                ThemeMode::System
            }),
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        let defaults = ExtractOptions::default();
        ExtractOptions {
            min_text_lines: self.min_text_lines.unwrap_or(defaults.min_text_lines),
            promote_untagged_json: self
                .promote_untagged_json
                .unwrap_or(defaults.promote_untagged_json),
        }
    }

    /// Normalized server base URL without a trailing slash.
    pub fn api_base_url(&self) -> String {
        normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
    }

    pub fn get_persona(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }
}
