//! Command frame definitions and builders for LCT21001/LCT22002 coolers.
//!
//! The device speaks a write-only protocol over the Nordic UART service:
//! every command is an eight-byte frame written to the TX characteristic
//! without response. Nothing can be read back.

use serde::{Deserialize, Serialize};
use uuid::{Uuid, uuid};

// =============================================================================
// Constants
// =============================================================================

/// First byte of every command frame.
pub const FRAME_HEADER: u8 = 0xFE;

/// Last byte of every command frame.
pub const FRAME_TRAILER: u8 = 0xEF;

/// Command frame length in bytes.
pub const FRAME_LENGTH: usize = 8;

/// Reset command. Returns the cooler to standalone control.
pub const CMD_RESET: u8 = 0x19;

/// Fan duty command.
pub const CMD_FAN: u8 = 0x1B;

/// Pump voltage command.
pub const CMD_PUMP: u8 = 0x1C;

/// RGB lighting command.
pub const CMD_RGB: u8 = 0x1E;

/// Fixed pump payload byte. The stock software always sends 100.
pub const PUMP_FIXED_PAYLOAD: u8 = 100;

/// Nordic UART service advertised by the cooler.
pub const UART_SERVICE_UUID: Uuid = uuid!("6e400001-b5a3-f393-e0a9-e50e24dcca9e");

/// Write-only TX characteristic all commands go to.
pub const UART_TX_CHAR_UUID: Uuid = uuid!("6e400002-b5a3-f393-e0a9-e50e24dcca9e");

/// Advertised device names of supported coolers.
pub const SUPPORTED_MODELS: [&str; 2] = ["LCT21001", "LCT22002"];

// =============================================================================
// Pump Voltage
// =============================================================================

/// Pump supply voltage levels.
///
/// The wire codes are device-defined and not monotonic in voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PumpVoltage {
    /// 7 volts - quietest, lowest flow.
    V7,
    /// 8 volts - stock default.
    V8,
    /// 11 volts.
    V11,
    /// 12 volts - maximum flow.
    V12,
}

impl PumpVoltage {
    /// Get the wire code for this voltage level.
    pub const fn code(&self) -> u8 {
        match self {
            PumpVoltage::V7 => 0x02,
            PumpVoltage::V8 => 0x03,
            PumpVoltage::V11 => 0x00,
            PumpVoltage::V12 => 0x01,
        }
    }

    /// Get the nominal voltage in volts.
    pub const fn volts(&self) -> u8 {
        match self {
            PumpVoltage::V7 => 7,
            PumpVoltage::V8 => 8,
            PumpVoltage::V11 => 11,
            PumpVoltage::V12 => 12,
        }
    }
}

impl std::fmt::Display for PumpVoltage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}V", self.volts())
    }
}

// =============================================================================
// RGB Lighting
// =============================================================================

/// RGB ring lighting modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RgbMode {
    /// Solid color.
    Static,
    /// Color fades in and out.
    Breathing,
    /// Device cycles hues on its own. The color payload is ignored.
    Rainbow,
}

impl RgbMode {
    /// Get the wire code for this mode.
    pub const fn code(&self) -> u8 {
        match self {
            RgbMode::Static => 0x00,
            RgbMode::Breathing => 0x01,
            RgbMode::Rainbow => 0x02,
        }
    }

    /// Whether the device reads the color payload in this mode.
    pub const fn uses_color(&self) -> bool {
        !matches!(self, RgbMode::Rainbow)
    }
}

impl std::fmt::Display for RgbMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RgbMode::Static => write!(f, "Static"),
            RgbMode::Breathing => write!(f, "Breathing"),
            RgbMode::Rainbow => write!(f, "Rainbow"),
        }
    }
}

/// An RGB color as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbColor {
    /// All channels off.
    pub const BLACK: RgbColor = RgbColor::new(0, 0, 0);

    /// Create a color from raw channel values.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

// =============================================================================
// Fan Power Presets
// =============================================================================

/// Manual fan power presets matching the stock control software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanPower {
    Low,
    Medium,
    Max,
}

impl FanPower {
    /// Get the raw duty byte sent for this preset.
    pub const fn duty(&self) -> u8 {
        match self {
            FanPower::Low => 80,
            FanPower::Medium => 150,
            FanPower::Max => 255,
        }
    }
}

impl std::fmt::Display for FanPower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FanPower::Low => write!(f, "Low"),
            FanPower::Medium => write!(f, "Medium"),
            FanPower::Max => write!(f, "Max"),
        }
    }
}

// =============================================================================
// Frame Builders
// =============================================================================

/// Build the eight-byte frame shared by every command.
const fn frame(cmd: u8, enable: u8, payload: [u8; 4]) -> [u8; FRAME_LENGTH] {
    [
        FRAME_HEADER,
        cmd,
        enable,
        payload[0],
        payload[1],
        payload[2],
        payload[3],
        FRAME_TRAILER,
    ]
}

/// Build a fan duty command.
///
/// `duty` is the raw device duty (0-255), not a percentage. Zero disables
/// the fan channel; any other value enables it.
pub const fn encode_fan(duty: u8) -> [u8; FRAME_LENGTH] {
    frame(CMD_FAN, (duty > 0) as u8, [duty, 0, 0, 0])
}

/// Build a pump voltage command.
pub const fn encode_pump(level: PumpVoltage) -> [u8; FRAME_LENGTH] {
    frame(CMD_PUMP, 0x01, [PUMP_FIXED_PAYLOAD, level.code(), 0, 0])
}

/// Build a pump off command.
pub const fn encode_pump_off() -> [u8; FRAME_LENGTH] {
    frame(CMD_PUMP, 0x00, [0, 0, 0, 0])
}

/// Build an RGB lighting command.
///
/// The color travels as given. Callers that want Rainbow's ignored payload
/// zeroed do that before encoding (the orchestrator does).
pub const fn encode_rgb(mode: RgbMode, color: RgbColor) -> [u8; FRAME_LENGTH] {
    frame(
        CMD_RGB,
        0x01,
        [color.red, color.green, color.blue, mode.code()],
    )
}

/// Build an RGB off command.
pub const fn encode_rgb_off() -> [u8; FRAME_LENGTH] {
    frame(CMD_RGB, 0x00, [0, 0, 0, 0])
}

/// Build the reset frame sent before dropping a connection.
pub const fn encode_reset() -> [u8; FRAME_LENGTH] {
    frame(CMD_RESET, 0x00, [0x01, 0, 0, 0])
}
