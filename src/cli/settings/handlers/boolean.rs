//! Boolean setting handlers for on/off settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{format_bool, mutate_config_with_message, parse_bool};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::Config;

/// Data-driven handler for boolean (on/off) settings.
pub struct BooleanHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    get: fn(&Config) -> Option<bool>,
    set_field: fn(&mut Config, Option<bool>),
}

impl SettingHandler for BooleanHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let input = args.join(" ");
        let value = parse_bool(&input).ok_or(SettingError::InvalidBoolean(input))?;
        let set_field = self.set_field;

        mutate_config_with_message(
            ctx.config_path,
            move |config| set_field(config, Some(value)),
            format!("✅ Set {} to: {}", self.key, format_bool(value)),
        )
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;

        mutate_config_with_message(
            ctx.config_path,
            move |config| set_field(config, None),
            format!(
                "✅ Unset {} (will use default: {})",
                self.key, self.default_display
            ),
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {}", self.key, format_bool(value)),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

/// Create a handler for the `syntax` setting.
pub fn syntax_handler() -> BooleanHandler {
    BooleanHandler {
        key: "syntax",
        hint: "To set syntax highlighting, specify on or off:",
        example: "vellum set syntax off",
        default_display: "on",
        get: |c| c.syntax,
        set_field: |c, v| c.syntax = v,
    }
}

/// Create a handler for the `promote-untagged-json` setting.
pub fn promote_untagged_json_handler() -> BooleanHandler {
    BooleanHandler {
        key: "promote-untagged-json",
        hint: "To control whether untagged JSON blocks become artifacts, specify on or off:",
        example: "vellum set promote-untagged-json off",
        default_display: "on",
        get: |c| c.promote_untagged_json,
        set_field: |c, v| c.promote_untagged_json = v,
    }
}
