//! Default values and timing constants for cooler control.

use std::time::Duration;

use crate::protocol::commands::PumpVoltage;

// =============================================================================
// Fan Curve Defaults
// =============================================================================

/// Factory fan curve as (temperature °C, duty %) points.
pub const DEFAULT_CURVE_POINTS: [(u8, u8); 3] = [(20, 31), (60, 58), (100, 100)];

/// Minimum temperature for a curve point.
pub const CURVE_TEMP_MIN: u8 = 20;

/// Maximum temperature for a curve point.
pub const CURVE_TEMP_MAX: u8 = 100;

/// Maximum duty percentage for a curve point.
pub const CURVE_DUTY_MAX: u8 = 100;

// =============================================================================
// Controller Timing
// =============================================================================

/// Poll intervals selectable for the automatic controller, in seconds.
pub const POLL_INTERVALS_SECS: [f64; 5] = [0.5, 1.0, 2.0, 5.0, 10.0];

/// Default poll interval for the automatic controller.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

// =============================================================================
// Discovery and Connection
// =============================================================================

/// Length of one BLE scan window.
pub const SCAN_WINDOW: Duration = Duration::from_secs(5);

/// Delay between retries when scanning until a cooler appears.
pub const DISCOVERY_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Deadline for one connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Connect Baseline
// =============================================================================

/// Fan duty pushed right after connecting.
pub const BASELINE_FAN_DUTY: u8 = 150;

/// Pump voltage pushed right after connecting.
pub const BASELINE_PUMP_VOLTAGE: PumpVoltage = PumpVoltage::V8;
