//! Side-effecting artifact actions: clipboard, download and open in a new
//! window.

use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::artifact::{Artifact, ArtifactKind};
use crate::core::config::path_display;
use crate::utils::{clipboard, opener};

/// Collisions beyond this many numbered names give up.
const MAX_NAME_ATTEMPTS: usize = 1000;

#[derive(Debug)]
pub enum ArtifactActionError {
    Clipboard(String),
    Io { path: PathBuf, source: io::Error },
    /// Only HTML and React artifacts open in a separate window.
    NotOpenable(ArtifactKind),
    Opener(String),
}

impl fmt::Display for ArtifactActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactActionError::Clipboard(msg) => write!(f, "Copy failed: {msg}"),
            ArtifactActionError::Io { path, source } => {
                write!(f, "Failed to write {}: {}", path_display(path), source)
            }
            ArtifactActionError::NotOpenable(kind) => {
                write!(f, "{kind} artifacts cannot be opened in a new window")
            }
            ArtifactActionError::Opener(msg) => write!(f, "Failed to open window: {msg}"),
        }
    }
}

impl StdError for ArtifactActionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ArtifactActionError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub fn copy_artifact(artifact: &Artifact) -> Result<(), ArtifactActionError> {
    clipboard::copy_to_clipboard(&artifact.content).map_err(ArtifactActionError::Clipboard)
}

/// Writes the artifact into `dir` as `slug(title).ext`, numbering the name
/// when it is taken. Returns the final path.
pub fn download_artifact(artifact: &Artifact, dir: &Path) -> Result<PathBuf, ArtifactActionError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ArtifactActionError::Io { path, source }
    };
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(io_err(dir))?;
    temp.write_all(artifact.content.as_bytes())
        .map_err(io_err(dir))?;
    temp.as_file_mut().sync_all().map_err(io_err(dir))?;

    let file_name = artifact.file_name();
    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let target = dir.join(numbered_name(&file_name, attempt));
        match temp.persist_noclobber(&target) {
            Ok(_) => {
                debug!(id = %artifact.id, path = %target.display(), "artifact saved");
                return Ok(target);
            }
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => temp = err.file,
            Err(err) => return Err(io_err(&target)(err.error)),
        }
    }
    Err(io_err(&dir.join(&file_name))(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "no free file name",
    )))
}

/// `name.ext` for the first attempt, then `name-2.ext`, `name-3.ext`, ...
pub fn numbered_name(file_name: &str, attempt: usize) -> String {
    if attempt <= 1 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{attempt}.{ext}"),
        _ => format!("{file_name}-{attempt}"),
    }
}

/// Writes the raw content to a fresh temporary `.html` document that
/// outlives the process, so the viewer can still read it.
pub fn write_window_document(artifact: &Artifact) -> Result<PathBuf, ArtifactActionError> {
    if !artifact.kind.can_open_in_window() {
        return Err(ArtifactActionError::NotOpenable(artifact.kind));
    }
    let tmp_dir = std::env::temp_dir();
    let io_err = |source| ArtifactActionError::Io {
        path: tmp_dir.clone(),
        source,
    };
    let mut file = tempfile::Builder::new()
        .prefix("vellum-")
        .suffix(".html")
        .tempfile()
        .map_err(io_err)?;
    file.write_all(artifact.content.as_bytes()).map_err(io_err)?;
    let (_, path) = file.keep().map_err(|err| io_err(err.error))?;
    Ok(path)
}

pub fn open_in_window(artifact: &Artifact) -> Result<PathBuf, ArtifactActionError> {
    let path = write_window_document(artifact)?;
    opener::open_path(&path).map_err(|msg| {
        warn!(id = %artifact.id, error = %msg, "could not open artifact window");
        ArtifactActionError::Opener(msg)
    })?;
    Ok(path)
}
