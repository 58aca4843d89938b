//! Cooling control module.
//!
//! Provides fan curve interpolation, the temperature-driven controller
//! and the intent layer that feeds it.

pub mod controller;
pub mod curve;
pub mod orchestrator;

// Re-export commonly used items
pub use controller::{AutoController, ControlMode, ControllerState, TemperatureProvider, TemperatureSample};
pub use curve::{ControlPoint, FanCurve};
pub use orchestrator::Intent;
