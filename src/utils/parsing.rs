//! Parsing utilities for CLI arguments and configuration values.
//!
//! This module provides reusable parsing functions for common input formats
//! used throughout the application.

use std::time::Duration;

use crate::config::{CURVE_DUTY_MAX, CURVE_TEMP_MAX, CURVE_TEMP_MIN, POLL_INTERVALS_SECS};
use crate::cooling::curve::ControlPoint;
use crate::error::{CoolerError, Result};
use crate::protocol::commands::{FanPower, PumpVoltage, RgbColor, RgbMode};

/// Color names accepted by `parse_color`.
const COLOR_MAP: [(&str, RgbColor); 7] = [
    ("red", RgbColor::new(255, 0, 0)),
    ("green", RgbColor::new(0, 255, 0)),
    ("blue", RgbColor::new(0, 0, 255)),
    ("white", RgbColor::new(255, 255, 255)),
    ("yellow", RgbColor::new(255, 255, 0)),
    ("cyan", RgbColor::new(0, 255, 255)),
    ("magenta", RgbColor::new(255, 0, 255)),
];

// =============================================================================
// Color Parsing
// =============================================================================

/// Parse a color string into an [`RgbColor`].
///
/// Accepts formats: a named color (`red`, `cyan`, ...), a decimal triple
/// `R,G,B`, or hex `#RRGGBB` / `RRGGBB`.
///
/// # Example
/// ```
/// use lct_cooler::utils::parsing::parse_color;
///
/// let c = parse_color("255,85,0").unwrap();
/// assert_eq!((c.red, c.green, c.blue), (255, 85, 0));
/// assert_eq!(parse_color("#FF5500").unwrap(), c);
/// ```
pub fn parse_color(input: &str) -> Result<RgbColor> {
    let lower = input.trim().to_lowercase();

    if let Some((_, color)) = COLOR_MAP.iter().find(|(name, _)| *name == lower) {
        return Ok(*color);
    }

    if lower.contains(',') {
        let parts: Vec<&str> = lower.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(CoolerError::InvalidCommand(format!(
                "Invalid color triple '{}'. Use R,G,B with values 0-255",
                input
            )));
        }
        let mut channels = [0u8; 3];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                CoolerError::InvalidCommand(format!(
                    "Invalid color component '{}'. Values must be 0-255",
                    part
                ))
            })?;
        }
        return Ok(RgbColor::new(channels[0], channels[1], channels[2]));
    }

    let hex = lower.trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        return Ok(RgbColor::new(r, g, b));
    }

    Err(CoolerError::InvalidCommand(format!(
        "Unknown color '{}'. Use a name (red, green, blue, white, yellow, cyan, magenta), R,G,B or #RRGGBB",
        input
    )))
}

// =============================================================================
// Cooling Parsing
// =============================================================================

/// Parse a fan power name into a [`FanPower`] preset.
///
/// # Arguments
/// * `name` - Power name: "low", "medium"/"med", or "max"/"high"
pub fn parse_fan_power(name: &str) -> Result<FanPower> {
    match name.to_lowercase().as_str() {
        "low" => Ok(FanPower::Low),
        "medium" | "med" => Ok(FanPower::Medium),
        "max" | "high" => Ok(FanPower::Max),
        _ => Err(CoolerError::InvalidCommand(format!(
            "Unknown fan power '{}'. Use: low, medium or max",
            name
        ))),
    }
}

/// Parse a pump voltage string into a [`PumpVoltage`].
///
/// Accepts the plain number or a trailing unit: "7", "8v", "11V", "12".
pub fn parse_pump_voltage(input: &str) -> Result<PumpVoltage> {
    let trimmed = input.trim().trim_end_matches(['v', 'V']);
    match trimmed {
        "7" => Ok(PumpVoltage::V7),
        "8" => Ok(PumpVoltage::V8),
        "11" => Ok(PumpVoltage::V11),
        "12" => Ok(PumpVoltage::V12),
        _ => Err(CoolerError::InvalidCommand(format!(
            "Unknown pump voltage '{}'. Use: 7, 8, 11 or 12",
            input
        ))),
    }
}

/// Parse an RGB mode name into an [`RgbMode`].
pub fn parse_rgb_mode(name: &str) -> Result<RgbMode> {
    match name.to_lowercase().as_str() {
        "static" => Ok(RgbMode::Static),
        "breathing" | "breath" => Ok(RgbMode::Breathing),
        "rainbow" => Ok(RgbMode::Rainbow),
        _ => Err(CoolerError::InvalidCommand(format!(
            "Unknown RGB mode '{}'. Use: static, breathing or rainbow",
            name
        ))),
    }
}

// =============================================================================
// Curve Parsing
// =============================================================================

/// Parse a polling interval in seconds into a [`Duration`].
///
/// Only the supported cadences are accepted: 0.5, 1, 2, 5 or 10 seconds.
pub fn parse_poll_interval(input: &str) -> Result<Duration> {
    let secs: f64 = input.trim().parse().map_err(|_| {
        CoolerError::InvalidCommand(format!("Invalid interval '{}'. Use a number of seconds", input))
    })?;
    if !POLL_INTERVALS_SECS.contains(&secs) {
        return Err(CoolerError::InvalidCommand(format!(
            "Unsupported interval '{}'. Use one of: 0.5, 1, 2, 5 or 10 seconds",
            input
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Parse a curve point given as `TEMP:DUTY`.
///
/// Temperature must be 20-100 °C and duty 0-100 percent.
///
/// # Example
/// ```
/// use lct_cooler::utils::parsing::parse_curve_point;
///
/// let point = parse_curve_point("40:50").unwrap();
/// assert_eq!((point.temp_c, point.duty_pct), (40, 50));
/// ```
pub fn parse_curve_point(input: &str) -> Result<ControlPoint> {
    let invalid = || {
        CoolerError::InvalidCommand(format!(
            "Invalid curve point '{}'. Use TEMP:DUTY, e.g. 40:50",
            input
        ))
    };
    let (temp_str, duty_str) = input.split_once(':').ok_or_else(invalid)?;
    let temp_c: i32 = temp_str.trim().parse().map_err(|_| invalid())?;
    let duty_pct: i32 = duty_str.trim().parse().map_err(|_| invalid())?;

    if temp_c < CURVE_TEMP_MIN as i32 || temp_c > CURVE_TEMP_MAX as i32 {
        return Err(CoolerError::InvalidCommand(format!(
            "Curve temperature {} out of range. Use {}-{} °C",
            temp_c, CURVE_TEMP_MIN, CURVE_TEMP_MAX
        )));
    }
    if duty_pct < 0 || duty_pct > CURVE_DUTY_MAX as i32 {
        return Err(CoolerError::InvalidCommand(format!(
            "Curve duty {} out of range. Use 0-{} percent",
            duty_pct, CURVE_DUTY_MAX
        )));
    }

    Ok(ControlPoint {
        temp_c: temp_c as u8,
        duty_pct: duty_pct as u8,
    })
}

// =============================================================================
// Tests
// =============================================================================
