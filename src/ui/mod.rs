//! Presentation layer for messages and artifacts.
//!
//! Key submodules:
//! - [`render`]: the closed [`render::RenderPlan`] chosen for each artifact.
//! - [`viewer`]: per-view fullscreen, preview/raw and "copied" state.
//! - [`actions`]: copy, download and open-in-window side effects.
//! - [`message_view`]: HTML for a whole message, markdown plus artifact cards.
//! - [`theme`]: light/dark palettes and the matching highlighter theme.
//!
//! Ownership boundary: this layer reads snapshots from [`crate::core::store`]
//! and never mutates messages.

pub mod actions;
pub mod message_view;
pub mod render;
pub mod theme;
pub mod viewer;
