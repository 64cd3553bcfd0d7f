//! Simple setting handlers for single validated values.

use std::path::PathBuf;

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{mutate_config_with_message, success_set, success_unset};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::{path_display, Config};
use crate::core::extract::ExtractOptions;
use crate::ui::theme::ThemeMode;

/// Handler for the `theme` setting.
pub struct ThemeHandler;

impl SettingHandler for ThemeHandler {
    fn key(&self) -> &'static str {
        "theme"
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set a theme, specify light, dark or system:",
                example: "vellum set theme dark",
            });
        }

        let input = args.join(" ");
        let mode = ThemeMode::try_from(input.as_str())
            .map_err(|_| SettingError::UnknownTheme { input })?;
        let name = mode.as_str();

        mutate_config_with_message(
            ctx.config_path,
            move |config| config.theme = Some(name.to_string()),
            success_set("theme", name),
        )
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config_path,
            |config| config.theme = None,
            success_unset("theme"),
        )
    }

    fn format(&self, config: &Config) -> String {
        match &config.theme {
            Some(theme) => format!("  theme: {theme}"),
            None => "  theme: (unset, default: system)".to_string(),
        }
    }
}

/// Handler for the `min-text-lines` setting.
pub struct MinTextLinesHandler;

impl SettingHandler for MinTextLinesHandler {
    fn key(&self) -> &'static str {
        "min-text-lines"
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "To set how long an untagged block must be to become an artifact, give a line count:",
                example: "vellum set min-text-lines 12",
            });
        };

        let lines = match input.trim().parse::<usize>() {
            Ok(n) if n >= 1 => n,
            _ => {
                return Err(SettingError::InvalidValue {
                    key: "min-text-lines",
                    input: input.clone(),
                    expected: "a whole number of at least 1",
                })
            }
        };

        mutate_config_with_message(
            ctx.config_path,
            move |config| config.min_text_lines = Some(lines),
            success_set("min-text-lines", &lines.to_string()),
        )
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config_path,
            |config| config.min_text_lines = None,
            format!(
                "✅ Unset min-text-lines (will use default: {})",
                ExtractOptions::default().min_text_lines
            ),
        )
    }

    fn format(&self, config: &Config) -> String {
        match config.min_text_lines {
            Some(n) => format!("  min-text-lines: {n}"),
            None => format!(
                "  min-text-lines: (unset, default: {})",
                ExtractOptions::default().min_text_lines
            ),
        }
    }
}

/// Handler for the `download-dir` setting.
pub struct DownloadDirHandler;

impl SettingHandler for DownloadDirHandler {
    fn key(&self) -> &'static str {
        "download-dir"
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set where downloaded artifacts go, give a directory:",
                example: "vellum set download-dir ~/Downloads/artifacts",
            });
        }

        let dir = PathBuf::from(args.join(" "));
        if dir.is_file() {
            return Err(SettingError::InvalidValue {
                key: "download-dir",
                input: path_display(&dir),
                expected: "a directory, not a file",
            });
        }
        let message = success_set("download-dir", &path_display(&dir));

        mutate_config_with_message(
            ctx.config_path,
            move |config| config.download_dir = Some(dir),
            message,
        )
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config_path,
            |config| config.download_dir = None,
            "✅ Unset download-dir (will use the current directory)".to_string(),
        )
    }

    fn format(&self, config: &Config) -> String {
        match &config.download_dir {
            Some(dir) => format!("  download-dir: {}", path_display(dir)),
            None => "  download-dir: (unset, default: current directory)".to_string(),
        }
    }
}
