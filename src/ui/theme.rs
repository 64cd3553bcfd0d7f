use serde::{Deserialize, Serialize};

/// User preference for light or dark rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    /// Follow the platform setting.
    #[default]
    System,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }
}

impl TryFrom<&str> for ThemeMode {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" | "auto" => Ok(ThemeMode::System),
            other => Err(format!("unknown theme: {other} (expected light, dark or system)")),
        }
    }
}

/// Resolved palette used by rendered artifacts and messages. Colors are CSS
/// color strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub is_dark: bool,
    pub background: String,
    pub foreground: String,
    pub code_background: String,
    pub muted: String,
    pub error: String,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            is_dark: true,
            background: "#1e1f22".into(),
            foreground: "#e6e6e6".into(),
            code_background: "#2b2d31".into(),
            muted: "#9aa0a6".into(),
            error: "#ff6b6b".into(),
        }
    }

    pub fn light() -> Self {
        Theme {
            is_dark: false,
            background: "#ffffff".into(),
            foreground: "#1f2328".into(),
            code_background: "#f6f8fa".into(),
            muted: "#656d76".into(),
            error: "#cf222e".into(),
        }
    }

    /// Resolves a preference; `system_prefers_dark` answers `System`.
    pub fn for_mode(mode: ThemeMode, system_prefers_dark: bool) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark_default(),
            ThemeMode::System if system_prefers_dark => Self::dark_default(),
            ThemeMode::System => Self::light(),
        }
    }

    // Higher contrast on light backgrounds.
    pub fn syntect_theme_name(&self) -> &'static str {
        if self.is_dark {
            "base16-ocean.dark"
        } else {
            "InspiredGitHub"
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_mode_follows_platform() {
        assert!(Theme::for_mode(ThemeMode::System, true).is_dark);
        assert!(!Theme::for_mode(ThemeMode::System, false).is_dark);
        assert!(Theme::for_mode(ThemeMode::Dark, false).is_dark);
    }

    #[test]
    fn theme_selection_matches_brightness() {
        assert_eq!(Theme::dark_default().syntect_theme_name(), "base16-ocean.dark");
        assert_eq!(Theme::light().syntect_theme_name(), "InspiredGitHub");
    }

    #[test]
    fn mode_parsing_accepts_aliases() {
        assert_eq!(ThemeMode::try_from("Auto"), Ok(ThemeMode::System));
        assert!(ThemeMode::try_from("sepia").is_err());
    }
}
