//! String setting handlers for text-based settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{mutate_config_with_message, success_set};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::data::DEFAULT_BASE_URL;
use crate::core::config::Config;
use crate::utils::url::normalize_base_url;

/// Handler for the `base-url` setting.
pub struct BaseUrlHandler;

impl SettingHandler for BaseUrlHandler {
    fn key(&self) -> &'static str {
        "base-url"
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set the API endpoint, provide its base URL:",
                example: "vellum set base-url https://api.example.com/v1",
            });
        }

        let input = args.join(" ");
        if !(input.starts_with("http://") || input.starts_with("https://")) {
            return Err(SettingError::InvalidValue {
                key: "base-url",
                input,
                expected: "an http:// or https:// URL",
            });
        }
        let value = normalize_base_url(&input);
        let message = success_set("base-url", &value);

        mutate_config_with_message(
            ctx.config_path,
            move |config| config.base_url = Some(value),
            message,
        )
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config_path,
            |config| config.base_url = None,
            format!("✅ Unset base-url (will use default: {DEFAULT_BASE_URL})"),
        )
    }

    fn format(&self, config: &Config) -> String {
        match &config.base_url {
            Some(url) => format!("  base-url: {url}"),
            None => format!("  base-url: (unset, default: {DEFAULT_BASE_URL})"),
        }
    }
}

/// Handler for the `default-model` setting.
pub struct DefaultModelHandler;

impl SettingHandler for DefaultModelHandler {
    fn key(&self) -> &'static str {
        "default-model"
    }

    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set a default model, specify the model name:",
                example: "vellum set default-model llama-3.1-8b-instruct",
            });
        }

        let value = args.join(" ");
        let message = success_set("default-model", &value);

        mutate_config_with_message(
            ctx.config_path,
            move |config| config.default_model = Some(value),
            message,
        )
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.config_path,
            |config| config.default_model = None,
            "✅ Unset default-model (the server picks its default)".to_string(),
        )
    }

    fn format(&self, config: &Config) -> String {
        match &config.default_model {
            Some(model) => format!("  default-model: {model}"),
            None => "  default-model: (unset)".to_string(),
        }
    }
}
