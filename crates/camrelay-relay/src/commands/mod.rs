//! Outbound command relay.
//!
//! Commands from the web controller are encrypted under the current key
//! version and parked until the phone polls. A poll drains everything that
//! has not expired; nothing is ever delivered twice.

pub mod envelope;
pub mod relay;

pub use envelope::{CommandEnvelope, CommandPayload};
pub use relay::{COMMAND_TTL, CommandRelay};
