//! Temperature-driven automatic fan control.
//!
//! The controller owns the device session, the fan curve and the last
//! seen temperatures, and runs them from a single task: intents from the
//! presentation layer and periodic ticks interleave on one loop, never
//! concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::cooling::curve::FanCurve;
use crate::cooling::orchestrator::{self, Intent};
use crate::device::session::DeviceSession;
use crate::error::Result;
use crate::transport::Transport;

// =============================================================================
// Temperature Sources
// =============================================================================

/// One reading of the host temperature sensors.
///
/// Absent slots mean the sensor could not be read this time, not that it
/// does not exist.
#[derive(Debug, Clone, Copy)]
pub struct TemperatureSample {
    pub cpu: Option<f32>,
    pub gpu: Option<f32>,
    pub observed_at: Instant,
}

impl TemperatureSample {
    pub fn new(cpu: Option<f32>, gpu: Option<f32>) -> Self {
        Self {
            cpu,
            gpu,
            observed_at: Instant::now(),
        }
    }
}

/// Where the controller gets its temperatures.
///
/// Reading is synchronous; the controller moves it off the scheduling
/// path with `spawn_blocking` because a sensor refresh can take tens of
/// milliseconds.
pub trait TemperatureProvider: Send {
    fn sample(&mut self) -> TemperatureSample;
}

// =============================================================================
// Control Mode and State
// =============================================================================

/// Who decides the fan duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Fixed duty chosen by the user.
    Manual,
    /// Duty follows the fan curve on every tick.
    Automatic,
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlMode::Manual => write!(f, "Manual"),
            ControlMode::Automatic => write!(f, "Automatic"),
        }
    }
}

/// Mutable control context: mode, curve and last seen temperatures.
///
/// Owned by the controller; the presentation layer reads it through the
/// accessors.
#[derive(Debug, Clone)]
pub struct ControllerState {
    mode: ControlMode,
    curve: FanCurve,
    last_cpu: Option<f32>,
    last_gpu: Option<f32>,
}

impl ControllerState {
    fn new(curve: FanCurve) -> Self {
        Self {
            mode: ControlMode::Manual,
            curve,
            last_cpu: None,
            last_gpu: None,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn curve(&self) -> &FanCurve {
        &self.curve
    }

    /// Last CPU temperature ever observed, if any.
    pub fn last_cpu(&self) -> Option<f32> {
        self.last_cpu
    }

    /// Last GPU temperature ever observed, if any.
    pub fn last_gpu(&self) -> Option<f32> {
        self.last_gpu
    }

    /// Fold a sample in, keeping previous values for absent slots.
    fn absorb(&mut self, sample: &TemperatureSample) {
        if let Some(cpu) = sample.cpu {
            self.last_cpu = Some(cpu);
        }
        if let Some(gpu) = sample.gpu {
            self.last_gpu = Some(gpu);
        }
    }
}

// =============================================================================
// Auto Controller
// =============================================================================

/// Owns a device session and drives the fan from the curve.
pub struct AutoController<T: Transport, P: TemperatureProvider> {
    session: DeviceSession<T>,
    provider: Arc<Mutex<P>>,
    state: ControllerState,
    poll_interval: Duration,
}

impl<T, P> AutoController<T, P>
where
    T: Transport,
    P: TemperatureProvider + Send + 'static,
{
    /// Create a controller with the default curve and poll interval.
    pub fn new(session: DeviceSession<T>, provider: P) -> Self {
        Self {
            session,
            provider: Arc::new(Mutex::new(provider)),
            state: ControllerState::new(FanCurve::default()),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Replace the curve, builder style.
    pub fn with_curve(mut self, curve: FanCurve) -> Self {
        self.state.curve = curve;
        self
    }

    pub fn session(&self) -> &DeviceSession<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DeviceSession<T> {
        &mut self.session
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn set_mode(&mut self, mode: ControlMode) {
        if self.state.mode != mode {
            debug!("control mode -> {}", mode);
        }
        self.state.mode = mode;
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Change the polling cadence. Takes effect on the next loop pass.
    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Move one curve point, clamping to the editable ranges.
    pub fn move_curve_point(&mut self, index: usize, temp_c: i32, duty_pct: i32) -> Result<()> {
        self.state.curve.move_point(index, temp_c, duty_pct)
    }

    /// One controller beat: sample, fold in, maybe drive the fan.
    ///
    /// The fan is only driven when the mode is automatic, a CPU
    /// temperature has ever been observed and the session is connected.
    /// A failed write is logged and tolerated; the session has already
    /// dropped to disconnected by then.
    pub async fn tick(&mut self) {
        let Some(sample) = self.sample_off_thread().await else {
            return;
        };
        self.state.absorb(&sample);

        if self.state.mode != ControlMode::Automatic {
            return;
        }
        let Some(cpu) = self.state.last_cpu else {
            debug!("no CPU temperature observed yet");
            return;
        };
        if !self.session.is_connected() {
            return;
        }

        let duty = self.state.curve.interpolate(cpu);
        debug!("tick: cpu {:.1}°C -> fan duty {:.1}", cpu, duty);
        if let Err(e) = self.session.send_fan(duty.round() as u8).await {
            warn!("fan update failed: {}", e);
        }
    }

    /// Apply the curve immediately from a fresh sensor reading.
    ///
    /// On success the mode switches to automatic and the duty sent is
    /// returned. When no CPU temperature could be read, nothing is sent
    /// and the mode is left untouched. The sticky cache is not updated;
    /// the next tick samples again.
    pub async fn apply_curve_now(&mut self) -> Result<Option<u8>> {
        if !self.session.is_connected() {
            return Ok(None);
        }

        let cpu = self.sample_off_thread().await.and_then(|sample| sample.cpu);
        let Some(cpu) = cpu else {
            debug!("no CPU reading, curve not applied");
            return Ok(None);
        };

        self.set_mode(ControlMode::Automatic);
        let duty = self.state.curve.interpolate(cpu).round() as u8;
        self.session.send_fan(duty).await?;
        Ok(Some(duty))
    }

    /// Run the control loop until `cancel` fires.
    ///
    /// Intents and ticks are handled one at a time on this task. Ticks
    /// that pile up behind a slow operation are skipped, not bursted.
    pub async fn run(&mut self, mut intents: mpsc::Receiver<Intent>, cancel: CancellationToken) {
        let mut ticker = self.make_ticker();
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("control loop cancelled");
                    break;
                }
                maybe_intent = intents.recv() => {
                    let Some(intent) = maybe_intent else {
                        debug!("intent channel closed");
                        break;
                    };
                    let interval_changed = matches!(intent, Intent::SetInterval(_));
                    orchestrator::dispatch(self, intent).await;
                    if interval_changed {
                        ticker = self.make_ticker();
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    fn make_ticker(&self) -> Interval {
        let start = tokio::time::Instant::now() + self.poll_interval;
        let mut ticker = interval_at(start, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    async fn sample_off_thread(&self) -> Option<TemperatureSample> {
        let provider = Arc::clone(&self.provider);
        match tokio::task::spawn_blocking(move || provider.lock().sample()).await {
            Ok(sample) => Some(sample),
            Err(e) => {
                warn!("sensor sampling task failed: {}", e);
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! Queue-backed provider for controller and orchestrator tests.

    use std::collections::VecDeque;

    use super::{TemperatureProvider, TemperatureSample};

    pub struct ScriptedProvider {
        samples: VecDeque<(Option<f32>, Option<f32>)>,
        fallback: (Option<f32>, Option<f32>),
    }

    impl ScriptedProvider {
        /// Returns the same reading forever.
        pub fn always(cpu: Option<f32>, gpu: Option<f32>) -> Self {
            Self {
                samples: VecDeque::new(),
                fallback: (cpu, gpu),
            }
        }

        /// Returns the queued readings in order, then empty readings.
        pub fn sequence(samples: Vec<(Option<f32>, Option<f32>)>) -> Self {
            Self {
                samples: samples.into(),
                fallback: (None, None),
            }
        }
    }

    impl TemperatureProvider for ScriptedProvider {
        fn sample(&mut self) -> TemperatureSample {
            let (cpu, gpu) = self.samples.pop_front().unwrap_or(self.fallback);
            TemperatureSample::new(cpu, gpu)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;
    use crate::protocol::commands::{FanPower, PumpVoltage, encode_fan, encode_pump};
    use crate::transport::mock::MockTransport;

    const DEADLINE: Duration = Duration::from_secs(5);

    async fn connected_controller(
        provider: ScriptedProvider,
    ) -> (MockTransport, AutoController<MockTransport, ScriptedProvider>) {
        let transport = MockTransport::new();
        let session = DeviceSession::new(transport.clone());
        let mut controller = AutoController::new(session, provider);
        controller
            .session_mut()
            .connect("aa", DEADLINE)
            .await
            .unwrap();
        (transport, controller)
    }

    #[tokio::test]
    async fn test_tick_keeps_sticky_temperatures() {
        let transport = MockTransport::new();
        let session = DeviceSession::new(transport);
        let provider = ScriptedProvider::sequence(vec![
            (Some(55.0), Some(70.0)),
            (None, Some(62.0)),
            (None, None),
        ]);
        let mut controller = AutoController::new(session, provider);

        controller.tick().await;
        assert_eq!(controller.state().last_cpu(), Some(55.0));
        assert_eq!(controller.state().last_gpu(), Some(70.0));

        controller.tick().await;
        assert_eq!(controller.state().last_cpu(), Some(55.0));
        assert_eq!(controller.state().last_gpu(), Some(62.0));

        controller.tick().await;
        assert_eq!(controller.state().last_cpu(), Some(55.0));
        assert_eq!(controller.state().last_gpu(), Some(62.0));
    }

    #[tokio::test]
    async fn test_tick_idles_in_manual_mode() {
        let (transport, mut controller) =
            connected_controller(ScriptedProvider::always(Some(80.0), None)).await;

        controller.tick().await;

        // Baseline frames only, no curve-driven fan command.
        assert_eq!(transport.written().len(), 2);
        assert_eq!(controller.state().last_cpu(), Some(80.0));
    }

    #[tokio::test]
    async fn test_tick_requires_connection() {
        let transport = MockTransport::new();
        let session = DeviceSession::new(transport.clone());
        let mut controller =
            AutoController::new(session, ScriptedProvider::always(Some(80.0), None));
        controller.set_mode(ControlMode::Automatic);

        controller.tick().await;

        assert!(transport.written().is_empty());
    }

    #[tokio::test]
    async fn test_tick_drives_fan_from_curve() {
        let (transport, mut controller) =
            connected_controller(ScriptedProvider::always(Some(60.0), None)).await;
        controller.set_mode(ControlMode::Automatic);

        controller.tick().await;

        assert_eq!(transport.written().last().unwrap(), &encode_fan(58).to_vec());
    }

    #[tokio::test]
    async fn test_tick_rounds_interpolated_duty() {
        let (transport, mut controller) =
            connected_controller(ScriptedProvider::always(Some(40.0), None)).await;
        controller.set_mode(ControlMode::Automatic);

        controller.tick().await;

        // interpolate(40) = 44.5, rounded away from zero.
        assert_eq!(transport.written().last().unwrap(), &encode_fan(45).to_vec());
    }

    #[tokio::test]
    async fn test_apply_curve_now_sends_and_switches_mode() {
        let (transport, mut controller) =
            connected_controller(ScriptedProvider::always(Some(60.0), None)).await;

        let duty = controller.apply_curve_now().await.unwrap();

        assert_eq!(duty, Some(58));
        assert_eq!(controller.state().mode(), ControlMode::Automatic);
        assert_eq!(transport.written().last().unwrap(), &encode_fan(58).to_vec());
        // Fresh read only; the sticky cache stays untouched.
        assert_eq!(controller.state().last_cpu(), None);
    }

    #[tokio::test]
    async fn test_apply_curve_now_without_cpu_reading() {
        let (transport, mut controller) =
            connected_controller(ScriptedProvider::always(None, Some(50.0))).await;

        let duty = controller.apply_curve_now().await.unwrap();

        assert_eq!(duty, None);
        assert_eq!(controller.state().mode(), ControlMode::Manual);
        assert_eq!(transport.written().len(), 2);
    }

    #[tokio::test]
    async fn test_apply_curve_now_requires_connection() {
        let transport = MockTransport::new();
        let session = DeviceSession::new(transport.clone());
        let mut controller =
            AutoController::new(session, ScriptedProvider::always(Some(60.0), None));

        let duty = controller.apply_curve_now().await.unwrap();

        assert_eq!(duty, None);
        assert_eq!(controller.state().mode(), ControlMode::Manual);
        assert!(transport.written().is_empty());
    }

    #[tokio::test]
    async fn test_move_curve_point() {
        let transport = MockTransport::new();
        let session = DeviceSession::new(transport);
        let mut controller = AutoController::new(session, ScriptedProvider::always(None, None));

        controller.move_curve_point(1, 60, 80).unwrap();
        assert_eq!(controller.state().curve().interpolate(60.0), 80.0);

        assert!(controller.move_curve_point(9, 50, 50).is_err());
    }

    #[tokio::test]
    async fn test_run_consumes_intents_and_stops_on_cancel() {
        let (transport, mut controller) =
            connected_controller(ScriptedProvider::always(Some(40.0), None)).await;
        controller.set_poll_interval(Duration::from_millis(10));

        let (intents, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let run_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            controller.run(rx, run_cancel).await;
            controller
        });

        intents
            .send(Intent::ApplyManual {
                power: FanPower::Low,
                voltage: PumpVoltage::V7,
            })
            .await
            .unwrap();
        intents
            .send(Intent::SetInterval(Duration::from_millis(20)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let controller = task.await.unwrap();

        let written = transport.written();
        assert!(written.contains(&encode_fan(FanPower::Low.duty()).to_vec()));
        assert!(written.contains(&encode_pump(PumpVoltage::V7).to_vec()));
        assert_eq!(controller.state().mode(), ControlMode::Manual);
        assert_eq!(controller.poll_interval(), Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_run_ticks_in_automatic_mode() {
        let (transport, mut controller) =
            connected_controller(ScriptedProvider::always(Some(80.0), None)).await;
        controller.set_mode(ControlMode::Automatic);
        controller.set_poll_interval(Duration::from_millis(10));

        let (_intents, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let run_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            controller.run(rx, run_cancel).await;
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();
        task.await.unwrap();

        assert!(transport.written().contains(&encode_fan(79).to_vec()));
    }
}
