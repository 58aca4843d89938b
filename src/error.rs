//! Custom error types for LCT cooler operations.
//!
//! This module provides fine-grained error handling for discovery,
//! connection lifecycle, command writes and configuration validation.

use thiserror::Error;

/// Main error type for cooler operations.
#[derive(Error, Debug)]
pub enum CoolerError {
    /// No Bluetooth adapter available on this host.
    #[error("No Bluetooth adapter found. Check that Bluetooth is enabled.")]
    NoAdapter,

    /// No supported cooler was seen during discovery.
    #[error("No supported cooler found. Expected LCT21001 or LCT22002.")]
    DeviceNotFound,

    /// Connection attempt exceeded its deadline.
    #[error("Connection to {address} timed out after {timeout_secs}s")]
    ConnectTimeout { address: String, timeout_secs: u64 },

    /// The device or the Bluetooth stack refused the connection.
    #[error("Connection to {address} failed: {reason}")]
    ConnectRejected { address: String, reason: String },

    /// A command write failed. The session drops back to disconnected.
    #[error("Command write failed: {reason}")]
    WriteFailed { reason: String },

    /// A command or parameter was rejected before encoding.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Curve point index outside the current point list.
    #[error("Curve point index {index} out of range (curve has {len} points)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Temperature sampling found no reading for the requested sensor.
    #[error("No temperature reading available for {sensor}")]
    NoSensorData { sensor: String },

    /// Settings could not be loaded or saved.
    #[error("Settings storage error: {0}")]
    Storage(String),

    /// Bluetooth stack error.
    #[error("Bluetooth error: {0}")]
    Ble(#[from] btleplug::Error),
}

/// Result type alias for cooler operations.
pub type Result<T> = std::result::Result<T, CoolerError>;
