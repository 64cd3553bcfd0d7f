//! Observable application state.
//!
//! Each store owns an immutable snapshot behind an `Arc`, accepts typed
//! actions and notifies subscribers after every change.

pub mod chat;
pub mod observers;
pub mod settings;

use std::error::Error as StdError;
use std::fmt;

pub use chat::{ChatAction, ChatState, ChatStore, Session, Toast, ToastKind};
pub use observers::SubscriptionId;
pub use settings::{Settings, SettingsAction, SettingsStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    UnknownSession(String),
    DuplicateSession(String),
    UnknownMessage(String),
    NoActiveSession,
    /// Another reply is still streaming.
    StreamInProgress,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UnknownSession(id) => write!(f, "no session with id {id}"),
            StoreError::DuplicateSession(id) => write!(f, "session {id} already exists"),
            StoreError::UnknownMessage(id) => write!(f, "no message with id {id}"),
            StoreError::NoActiveSession => f.write_str("no active session"),
            StoreError::StreamInProgress => f.write_str("a reply is still streaming"),
        }
    }
}

impl StdError for StoreError {}
