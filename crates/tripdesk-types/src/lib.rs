//! Shared domain types for Tripdesk.
//!
//! This crate contains the core domain types used across the Tripdesk
//! support-chat backend: users, chat sessions, messages, wire events, and
//! their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod user;
