//! Infrastructure layer for Tripdesk.
//!
//! Contains implementations of the repository traits defined in
//! `tripdesk-core`: SQLite storage (sqlx, split reader/writer pools),
//! password hashing and access tokens (argon2, SHA-256), and config
//! loading.

pub mod auth;
pub mod config;
pub mod sqlite;
