//! Vellum streams chat replies and pulls artifacts out of them.
//!
//! An artifact is a self-contained piece of a reply (an HTML page, an SVG
//! image, JSON data, a code listing, a React component or a long text
//! block) lifted out of a fenced block so it can be previewed, copied,
//! downloaded or opened on its own.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns extraction, the streaming re-parse gate, the observable
//!   stores, configuration, personas and the stream client.
//! - [`ui`] decides how messages and artifacts are rendered and performs
//!   the side-effecting artifact actions.
//! - [`api`] defines the chat payloads exchanged with the server.
//! - [`utils`] holds highlighting, clipboard, opener, logging and URL
//!   helpers.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
