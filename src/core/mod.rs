pub mod artifact;
pub mod chat_stream;
pub mod config;
pub mod extract;
pub mod gate;
pub mod message;
pub mod persona;
pub mod store;
