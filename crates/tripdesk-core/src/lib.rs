//! Business logic and repository trait definitions for Tripdesk.
//!
//! This crate defines the "ports" (repository traits) that the
//! infrastructure layer implements, plus the chat service and room
//! registry. It depends only on `tripdesk-types` -- never on
//! `tripdesk-infra` or any database/IO crate.

pub mod chat;
pub mod user;
