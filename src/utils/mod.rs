pub mod clipboard;
pub mod logging;
pub mod opener;
pub mod syntax;
pub mod url;
