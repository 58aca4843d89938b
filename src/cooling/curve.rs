//! Piecewise-linear fan curve model.
//!
//! The curve maps CPU temperature to fan duty through editable control
//! points, exactly as the draggable curve widget in the stock software.

use serde::{Deserialize, Serialize};

use crate::config::{CURVE_DUTY_MAX, CURVE_TEMP_MAX, CURVE_TEMP_MIN, DEFAULT_CURVE_POINTS};
use crate::error::{CoolerError, Result};

/// One editable point on the fan curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlPoint {
    /// Temperature in °C.
    pub temp_c: u8,
    /// Fan duty in percent.
    pub duty_pct: u8,
}

/// Piecewise-linear mapping from temperature to fan duty.
///
/// Points keep their insertion order; evaluation sorts a copy by
/// temperature. Outside the covered range there is no extrapolation: the
/// last sorted point's duty is returned, below the first point as well as
/// above the last. A curve always has at least one point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanCurve {
    points: Vec<ControlPoint>,
}

impl Default for FanCurve {
    fn default() -> Self {
        let points = DEFAULT_CURVE_POINTS
            .iter()
            .map(|&(temp_c, duty_pct)| ControlPoint { temp_c, duty_pct })
            .collect();
        Self { points }
    }
}

impl FanCurve {
    /// Create a curve from explicit points.
    ///
    /// # Errors
    /// Returns `InvalidCommand` if `points` is empty.
    pub fn from_points(points: Vec<ControlPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(CoolerError::InvalidCommand(
                "Fan curve needs at least one point".into(),
            ));
        }
        Ok(Self { points })
    }

    /// Get the points in insertion order.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Move one point, clamping temperature to 20-100°C and duty to 0-100%.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if `index` does not name a point.
    pub fn move_point(&mut self, index: usize, temp_c: i32, duty_pct: i32) -> Result<()> {
        let len = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(CoolerError::IndexOutOfRange { index, len })?;

        point.temp_c = temp_c.clamp(CURVE_TEMP_MIN as i32, CURVE_TEMP_MAX as i32) as u8;
        point.duty_pct = duty_pct.clamp(0, CURVE_DUTY_MAX as i32) as u8;
        Ok(())
    }

    /// Evaluate the curve at `temp`.
    ///
    /// Returns the duty percentage from linear interpolation on the
    /// bracketing segment, or the last sorted point's duty when no segment
    /// brackets `temp`.
    pub fn interpolate(&self, temp: f32) -> f32 {
        let mut sorted = self.points.clone();
        sorted.sort_by_key(|p| p.temp_c);

        for window in sorted.windows(2) {
            let (t0, t1) = (window[0].temp_c as f32, window[1].temp_c as f32);

            if t0 <= temp && temp <= t1 {
                let (d0, d1) = (window[0].duty_pct as f32, window[1].duty_pct as f32);
                // Two points dragged onto the same temperature form a
                // zero-width segment; take its first duty.
                if t0 == t1 {
                    return d0;
                }
                return d0 + (d1 - d0) * (temp - t0) / (t1 - t0);
            }
        }

        // Constructors guarantee at least one point.
        sorted.last().map_or(0.0, |p| p.duty_pct as f32)
    }
}
