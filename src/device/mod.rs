//! Device discovery and connection lifecycle.
//!
//! Scanning finds supported coolers by advertised name; a session owns
//! the link to one of them and all command writes to it.

pub mod discovery;
pub mod session;

pub use session::{ConnectionState, DeviceSession};
