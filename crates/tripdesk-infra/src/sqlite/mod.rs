//! SQLite persistence for the chat subsystem and user directory.

pub mod chat;
pub mod pool;
pub mod user;
