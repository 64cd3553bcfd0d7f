//! Diagnostic logging setup.
//!
//! `RUST_LOG` selects what is recorded; without it only this crate's
//! `info` and above are kept. Output goes to stderr unless a log file is
//! given, in which case stderr stays clean for the command's own output.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "vellum=info";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Calling it twice keeps the first one.
pub fn init(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    let result = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if let Err(err) = result {
        tracing::debug!(error = %err, "subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_file_is_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vellum.log");
        init(Some(&path)).unwrap();
        assert!(path.exists());
        // A second install is tolerated.
        init(None).unwrap();
    }

    #[test]
    fn unwritable_log_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("vellum.log");
        assert!(init(Some(&path)).is_err());
    }
}
