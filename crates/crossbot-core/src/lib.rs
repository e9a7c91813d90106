//! Core domain + application logic for the crossbot media relay.
//!
//! This crate is intentionally framework-agnostic. Discord and SQLite live
//! behind ports (traits) implemented in adapter crates.

pub mod classify;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod logging;
pub mod ports;
pub mod relay;
pub mod rewrite;

pub use errors::{Error, Result};
