//! Persistence of user settings (settings.json).
//!
//! The CLI saves the last applied cooling and lighting settings so the
//! next invocation can restore them without repeating every flag.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{DEFAULT_POLL_INTERVAL, POLL_INTERVALS_SECS};
use crate::cooling::curve::{ControlPoint, FanCurve};
use crate::error::{CoolerError, Result};
use crate::protocol::commands::{FanPower, PumpVoltage, RgbColor, RgbMode};

const APP_NAME: &str = "lct-cooler";
const SETTINGS_FILE: &str = "settings.json";

// =============================================================================
// Settings
// =============================================================================

/// Settings persisted between CLI invocations.
///
/// Unknown or missing fields fall back to their defaults, so files
/// written by older versions keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub fan_power: FanPower,
    pub pump_voltage: PumpVoltage,
    pub rgb_mode: RgbMode,
    pub rgb_color: RgbColor,
    pub curve_points: Vec<ControlPoint>,
    pub poll_interval_secs: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fan_power: FanPower::Medium,
            pump_voltage: PumpVoltage::V8,
            rgb_mode: RgbMode::Static,
            rgb_color: RgbColor::new(255, 0, 0),
            curve_points: FanCurve::default().points().to_vec(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs_f64(),
        }
    }
}

impl Settings {
    /// Curve built from the stored points, or the default curve when the
    /// stored list is empty.
    pub fn fan_curve(&self) -> FanCurve {
        FanCurve::from_points(self.curve_points.clone()).unwrap_or_default()
    }

    /// Stored polling cadence, falling back to the default when the
    /// stored value is not one of the supported cadences.
    pub fn poll_interval(&self) -> Duration {
        if POLL_INTERVALS_SECS.contains(&self.poll_interval_secs) {
            Duration::from_secs_f64(self.poll_interval_secs)
        } else {
            DEFAULT_POLL_INTERVAL
        }
    }
}

// =============================================================================
// Load / Save
// =============================================================================

/// Get the application config directory.
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| CoolerError::Storage("Could not find config directory".into()))
}

/// Get the full path to the settings file.
pub fn settings_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(SETTINGS_FILE))
}

/// Load settings from disk, falling back to defaults on any failure.
pub fn load_settings() -> Settings {
    let path = match settings_path() {
        Ok(path) => path,
        Err(e) => {
            warn!("settings path unavailable: {}", e);
            return Settings::default();
        }
    };

    if !path.exists() {
        debug!("no settings file at {}, using defaults", path.display());
        return Settings::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("could not parse {}: {}", path.display(), e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("could not read {}: {}", path.display(), e);
            Settings::default()
        }
    }
}

/// Save settings to disk.
pub fn save_settings(settings: &Settings) -> Result<()> {
    let path = settings_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CoolerError::Storage(format!("Failed to create config dir: {}", e)))?;
    }

    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| CoolerError::Storage(format!("Failed to serialize settings: {}", e)))?;

    std::fs::write(&path, content)
        .map_err(|e| CoolerError::Storage(format!("Failed to write settings: {}", e)))?;

    debug!("settings saved to {}", path.display());
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.fan_power, FanPower::Medium);
        assert_eq!(settings.pump_voltage, PumpVoltage::V8);
        assert_eq!(settings.rgb_mode, RgbMode::Static);
        assert_eq!(settings.rgb_color, RgbColor::new(255, 0, 0));
        assert_eq!(settings.curve_points.len(), 3);
        assert_eq!(settings.poll_interval_secs, 2.0);
    }

    #[test]
    fn test_settings_roundtrip() {
        let mut settings = Settings::default();
        settings.fan_power = FanPower::Max;
        settings.pump_voltage = PumpVoltage::V12;
        settings.poll_interval_secs = 0.5;

        let json = serde_json::to_string_pretty(&settings).unwrap();
        assert!(json.contains("\"fanPower\": \"Max\""));
        assert!(json.contains("\"pumpVoltage\": \"V12\""));

        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.fan_power, FanPower::Max);
        assert_eq!(loaded.pump_voltage, PumpVoltage::V12);
        assert_eq!(loaded.poll_interval_secs, 0.5);
        assert_eq!(loaded.curve_points, settings.curve_points);
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let loaded: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded.fan_power, FanPower::Medium);
        assert_eq!(loaded.curve_points.len(), 3);
        assert_eq!(loaded.poll_interval_secs, 2.0);
    }

    #[test]
    fn test_poll_interval_sanitized() {
        let mut settings = Settings::default();
        settings.poll_interval_secs = 3.0;
        assert_eq!(settings.poll_interval(), DEFAULT_POLL_INTERVAL);

        settings.poll_interval_secs = 0.5;
        assert_eq!(settings.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_fan_curve_falls_back_when_empty() {
        let mut settings = Settings::default();
        settings.curve_points.clear();
        assert_eq!(settings.fan_curve(), FanCurve::default());
    }
}
