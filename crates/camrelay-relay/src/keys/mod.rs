//! Versioned symmetric key registry.

pub mod store;

pub use store::{KeyRecord, KeyStore};
