//! Shared PIN gate.
//!
//! A single 4-digit PIN set from the web interface gates key registration
//! and command submission. The PIN is held in memory and written through to
//! a [`PinStore`] so it can survive restarts when configured to.

pub mod gate;
pub mod store;

pub use gate::{Access, Pin, PinGate};
pub use store::{FilePinStore, MemoryPinStore, PinStore};
