//! Chat subsystem: repository port, room registry, and the service that
//! ties session lifecycle, message routing, and read tracking together.

pub mod repository;
pub mod room;
pub mod service;
