//! Wire protocol for LCT21001/LCT22002 coolers.
//!
//! This module contains the command constants, frame builders and the
//! enums that map user-facing settings to device wire codes. The protocol
//! is write-only: the device never sends anything back.

pub mod commands;

pub use commands::*;
