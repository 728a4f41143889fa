//! camrelay Relay Server Library
//!
//! Core functionality for the camrelay relay:
//! - Key registration and versioning
//! - PIN gate with pluggable persistence
//! - Single-slot latest-frame channel fed by AES-256-CTR decryption
//! - Outbound command queue with a fixed TTL and drain-on-poll semantics
//! - HTTP surface (axum) exposing the above

pub mod commands;
pub mod error;
pub mod frame;
pub mod keys;
pub mod pin;
pub mod server;

pub use error::RelayError;
