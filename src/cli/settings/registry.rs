//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::boolean::{promote_untagged_json_handler, syntax_handler};
use super::handlers::{
    BaseUrlHandler, DefaultModelHandler, DownloadDirHandler, MinTextLinesHandler, ThemeHandler,
};
use super::{SetContext, SettingError, SettingHandler};
use crate::core::config::Config;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `vellum set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        // Register handlers in display order
        registry.register(Box::new(BaseUrlHandler));
        registry.register(Box::new(DefaultModelHandler));
        registry.register(Box::new(ThemeHandler));
        registry.register(Box::new(syntax_handler()));
        registry.register(Box::new(MinTextLinesHandler));
        registry.register(Box::new(promote_untagged_json_handler()));
        registry.register(Box::new(DownloadDirHandler));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    /// Get a handler by key.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Get all keys in sorted order.
    pub fn keys_sorted(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.handlers.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Get all keys in display order.
    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }

    pub fn set(
        &self,
        key: &str,
        args: &[String],
        ctx: &SetContext<'_>,
    ) -> Result<String, SettingError> {
        self.lookup(key)?.set(args, ctx)
    }

    pub fn unset(&self, key: &str, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        self.lookup(key)?.unset(ctx)
    }

    /// One line per key with its current value.
    pub fn format_all(&self, config: &Config) -> Vec<String> {
        self.display_order
            .iter()
            .filter_map(|key| self.get(key))
            .map(|handler| handler.format(config))
            .collect()
    }

    fn lookup(&self, key: &str) -> Result<&dyn SettingHandler, SettingError> {
        self.get(key)
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
