//! Network client for the portico gateway.
//!
//! This crate provides the reqwest-backed implementation of the core
//! `Network` trait, plus URL resolution against the site origin.

pub mod fetch;

pub use fetch::{HttpNetwork, NetConfig, UrlError, resolve};
