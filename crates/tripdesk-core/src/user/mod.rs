//! User directory port consumed by the chat subsystem.

pub mod repository;
