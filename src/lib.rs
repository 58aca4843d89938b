//! LCT Cooler Library
//!
//! A Rust driver for LCT21001 and LCT22002 Bluetooth LE liquid coolers.
//!
//! # Features
//!
//! - Discover coolers over Bluetooth LE
//! - Control fan speed, pump voltage and RGB lighting
//! - Drive the fan from a CPU temperature curve
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use lct_cooler::device::{DeviceSession, discovery};
//! use lct_cooler::transport::BleTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Find a cooler and connect
//!     let transport = BleTransport::new().await?;
//!     let coolers = discovery::discover(&transport).await?;
//!     let Some(cooler) = coolers.first() else {
//!         return Err("no cooler in range".into());
//!     };
//!     println!("Found {} at {}", cooler.name, cooler.address);
//!     let address = cooler.address.clone();
//!
//!     let mut session = DeviceSession::new(transport);
//!     session.connect(&address, Duration::from_secs(5)).await?;
//!
//!     // Drive the fan at roughly half speed
//!     session.send_fan(128).await?;
//!
//!     session.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod cooling;
pub mod device;
pub mod error;
pub mod protocol;
pub mod storage;
pub mod transport;
pub mod utils;

// Re-exports for convenience
pub use cooling::{
    AutoController, ControlMode, ControlPoint, ControllerState, FanCurve, Intent,
    TemperatureProvider, TemperatureSample,
};
pub use device::{ConnectionState, DeviceSession};
pub use error::{CoolerError, Result};
pub use protocol::{FanPower, PumpVoltage, RgbColor, RgbMode};
pub use storage::Settings;
pub use transport::{BleTransport, DiscoveredDevice, Transport};
pub use utils::SystemSensors;
