//! Settings management for CLI set/unset commands.
//!
//! Each configuration key has a [`SettingHandler`]. Handler types cover the
//! patterns in use:
//!
//! - String settings (`base-url`, `default-model`)
//! - Boolean settings (`syntax`, `promote-untagged-json`)
//! - Validated single-value settings (`theme`, `min-text-lines`, `download-dir`)

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

use std::path::Path;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::Config;

/// Context provided to setting handlers during set/unset operations.
pub struct SetContext<'a> {
    /// Snapshot of the config before the change.
    pub config: &'a Config,
    /// File the change is written to.
    pub config_path: &'a Path,
}

/// Trait for handling a configuration setting.
///
/// Each implementation handles a specific configuration key,
/// providing set, unset, and format operations.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the configuration value from the words after the key. Returns
    /// the success message to display.
    fn set(&self, args: &[String], ctx: &SetContext<'_>) -> Result<String, SettingError>;

    /// Clear the configuration value so the default applies again.
    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError>;

    /// Format the current value for display in `vellum set` output.
    fn format(&self, config: &Config) -> String;
}
