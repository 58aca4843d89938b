//! Intent handling: maps user requests onto session commands and
//! controller state.
//!
//! Every mutation of a running controller goes through [`Intent`] so the
//! control loop stays the single writer. The apply functions are also
//! called directly by one-shot CLI commands that never start a loop.

use std::time::Duration;

use tracing::{info, warn};

use crate::cooling::controller::{AutoController, ControlMode, TemperatureProvider};
use crate::error::Result;
use crate::protocol::commands::{FanPower, PumpVoltage, RgbColor, RgbMode};
use crate::transport::Transport;

// =============================================================================
// Intents
// =============================================================================

/// A request for the control loop, sent over its intent channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Fixed fan power and pump voltage; switches to manual mode.
    ApplyManual {
        power: FanPower,
        voltage: PumpVoltage,
    },
    /// Lighting change; does not affect the control mode.
    ApplyRgb { mode: RgbMode, color: RgbColor },
    /// Manual cooling settings plus lighting in one shot.
    ApplyAll {
        power: FanPower,
        voltage: PumpVoltage,
        mode: RgbMode,
        color: RgbColor,
    },
    /// Evaluate the curve right now and switch to automatic mode.
    ApplyCurve,
    /// Change the polling cadence of the control loop.
    SetInterval(Duration),
    /// Move one point of the fan curve.
    MoveCurvePoint {
        index: usize,
        temp_c: i32,
        duty_pct: i32,
    },
}

// =============================================================================
// Apply Operations
// =============================================================================

/// Send fixed fan and pump settings and switch to manual mode.
///
/// Both commands are attempted even when the first fails; the first
/// error wins. Disconnected sessions are a quiet no-op that leaves the
/// mode alone.
pub async fn apply_manual<T, P>(
    controller: &mut AutoController<T, P>,
    power: FanPower,
    voltage: PumpVoltage,
) -> Result<()>
where
    T: Transport,
    P: TemperatureProvider + Send + 'static,
{
    if !controller.session().is_connected() {
        return Ok(());
    }

    controller.set_mode(ControlMode::Manual);
    info!("applying manual settings: fan {}, pump {}", power, voltage);

    let fan = controller.session_mut().send_fan(power.duty()).await;
    if let Err(e) = &fan {
        warn!("fan command failed: {}", e);
    }
    let pump = controller.session_mut().send_pump(voltage).await;
    if let Err(e) = &pump {
        warn!("pump command failed: {}", e);
    }
    fan.and(pump)
}

/// Send a lighting command without touching the control mode.
///
/// Modes that ignore the color get zeroed color bytes on the wire.
pub async fn apply_rgb<T, P>(
    controller: &mut AutoController<T, P>,
    mode: RgbMode,
    color: RgbColor,
) -> Result<()>
where
    T: Transport,
    P: TemperatureProvider + Send + 'static,
{
    if !controller.session().is_connected() {
        return Ok(());
    }

    let payload = if mode.uses_color() {
        color
    } else {
        RgbColor::BLACK
    };
    info!("applying lighting: {} mode", mode);
    controller.session_mut().send_rgb(mode, payload).await
}

/// Manual cooling settings followed by lighting; the first error wins.
pub async fn apply_all<T, P>(
    controller: &mut AutoController<T, P>,
    power: FanPower,
    voltage: PumpVoltage,
    mode: RgbMode,
    color: RgbColor,
) -> Result<()>
where
    T: Transport,
    P: TemperatureProvider + Send + 'static,
{
    let manual = apply_manual(controller, power, voltage).await;
    let rgb = apply_rgb(controller, mode, color).await;
    manual.and(rgb)
}

/// Route one intent to its operation. Failures are logged, never fatal
/// to the control loop.
pub async fn dispatch<T, P>(controller: &mut AutoController<T, P>, intent: Intent)
where
    T: Transport,
    P: TemperatureProvider + Send + 'static,
{
    let result = match intent {
        Intent::ApplyManual { power, voltage } => apply_manual(controller, power, voltage).await,
        Intent::ApplyRgb { mode, color } => apply_rgb(controller, mode, color).await,
        Intent::ApplyAll {
            power,
            voltage,
            mode,
            color,
        } => apply_all(controller, power, voltage, mode, color).await,
        Intent::ApplyCurve => controller.apply_curve_now().await.map(|_| ()),
        Intent::SetInterval(interval) => {
            controller.set_poll_interval(interval);
            Ok(())
        }
        Intent::MoveCurvePoint {
            index,
            temp_c,
            duty_pct,
        } => controller.move_curve_point(index, temp_c, duty_pct),
    };

    if let Err(e) = result {
        warn!("intent {:?} failed: {}", intent, e);
    }
}

// =============================================================================
// Tests
// =============================================================================
