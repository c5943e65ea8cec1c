//! Core types and shared functionality for the portico gateway.
//!
//! This crate provides:
//! - The offline cache gateway and its lifecycle state machine
//! - SQLite-backed cache store with generation rotation
//! - Persistent preference store
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod net;
pub mod prefs;
pub mod request;
pub mod response;

pub use cache::{CacheDb, Entry};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use gateway::{FetchOutcome, Gateway, GatewayConfig, Lifecycle};
pub use net::Network;
pub use prefs::{Prefs, Theme};
pub use request::{Destination, Method, Request};
pub use response::{Response, ResponseKind};
