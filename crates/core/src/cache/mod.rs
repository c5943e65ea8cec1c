//! SQLite-backed cache store with generation rotation.
//!
//! This module provides the persistent key-value store behind the gateway,
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Request-addressed entries keyed by SHA-256 over method + URL
//! - Named generations with atomic cutover by rotation
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::Entry;
