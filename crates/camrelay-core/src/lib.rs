//! camrelay Core Library
//!
//! Shared functionality for camrelay components:
//! - Configuration resolution (defaults, config file, environment)
//! - Common error types
//! - Tracing/logging initialisation

pub mod config;
pub mod error;
pub mod tracing_init;

pub use config::{Config, PinConfig, PinPersistence, ServerConfig, UnsetPinPolicy};
pub use error::{Error, Result};
