use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::extract::ExtractOptions;
use crate::ui::theme::ThemeMode;

use super::observers::{Observers, SubscriptionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub theme: ThemeMode,
    /// Highlight code artifacts; off renders plain monospace.
    pub syntax: bool,
    pub extract: ExtractOptions,
    pub download_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: ThemeMode::System,
            syntax: true,
            extract: ExtractOptions::default(),
            download_dir: None,
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            theme: config.theme_mode(),
            syntax: config.syntax.unwrap_or(true),
            extract: config.extract_options(),
            download_dir: config.download_dir.clone(),
        }
    }
}

pub enum SettingsAction {
    SetTheme(ThemeMode),
    SetSyntax(bool),
    SetExtractOptions(ExtractOptions),
    SetDownloadDir(Option<PathBuf>),
}

#[derive(Debug, Default)]
pub struct SettingsStore {
    state: Arc<Settings>,
    observers: Observers<Arc<Settings>>,
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Self {
        Self {
            state: Arc::new(initial),
            observers: Observers::default(),
        }
    }

    pub fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&self.state)
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&Arc<Settings>) + Send + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Applies `action`; listeners only hear about actual changes.
    pub fn dispatch(&mut self, action: SettingsAction) {
        let mut next = (*self.state).clone();
        match action {
            SettingsAction::SetTheme(mode) => next.theme = mode,
            SettingsAction::SetSyntax(on) => next.syntax = on,
            SettingsAction::SetExtractOptions(options) => next.extract = options,
            SettingsAction::SetDownloadDir(dir) => next.download_dir = dir,
        }
        if next != *self.state {
            self.state = Arc::new(next);
            self.observers.notify(&self.state);
        }
    }
}
