//! Connection lifecycle for one cooler.
//!
//! A [`DeviceSession`] owns the transport link and every command write
//! goes through it. Commands while disconnected are silent no-ops, so
//! callers never special-case a missing device; a failed write drops the
//! session back to disconnected on its own.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::{BASELINE_FAN_DUTY, BASELINE_PUMP_VOLTAGE};
use crate::error::{CoolerError, Result};
use crate::protocol::commands::{
    FRAME_LENGTH, PumpVoltage, RgbColor, RgbMode, UART_TX_CHAR_UUID, encode_fan, encode_pump,
    encode_pump_off, encode_reset, encode_rgb, encode_rgb_off,
};
use crate::transport::Transport;

// =============================================================================
// Connection State
// =============================================================================

/// Link state owned by a [`DeviceSession`].
#[derive(Debug)]
pub enum ConnectionState<H> {
    /// No link. Commands are dropped.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting { address: String },
    /// Link up; commands go to the device.
    Connected(H),
}

impl<H> ConnectionState<H> {
    /// Short status line for the presentation layer.
    pub fn status_text(&self) -> String {
        match self {
            ConnectionState::Disconnected => "disconnected".to_string(),
            ConnectionState::Connecting { address } => format!("connecting to {}", address),
            ConnectionState::Connected(_) => "connected".to_string(),
        }
    }
}

// =============================================================================
// Device Session
// =============================================================================

/// Owns the transport link to one cooler and the write path to it.
pub struct DeviceSession<T: Transport> {
    transport: T,
    state: ConnectionState<T::Handle>,
}

impl<T: Transport> DeviceSession<T> {
    /// Create a disconnected session over `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Short status line for the presentation layer.
    pub fn status_text(&self) -> String {
        self.state.status_text()
    }

    /// Connect to `address` and push the baseline fan/pump setting.
    ///
    /// Any existing link is dropped first. On failure the session is back
    /// in the disconnected state.
    ///
    /// # Errors
    /// `ConnectTimeout` when the attempt exceeds `deadline`,
    /// `ConnectRejected` when the stack refuses.
    pub async fn connect(&mut self, address: &str, deadline: Duration) -> Result<()> {
        self.disconnect().await;
        self.state = ConnectionState::Connecting {
            address: address.to_string(),
        };

        let attempt = timeout(deadline, self.transport.connect(address)).await;
        let handle = match attempt {
            Ok(Ok(handle)) => handle,
            Ok(Err(e @ (CoolerError::ConnectRejected { .. } | CoolerError::DeviceNotFound))) => {
                self.state = ConnectionState::Disconnected;
                return Err(e);
            }
            Ok(Err(e)) => {
                self.state = ConnectionState::Disconnected;
                return Err(CoolerError::ConnectRejected {
                    address: address.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                self.state = ConnectionState::Disconnected;
                return Err(CoolerError::ConnectTimeout {
                    address: address.to_string(),
                    timeout_secs: deadline.as_secs(),
                });
            }
        };

        self.state = ConnectionState::Connected(handle);
        info!("connected to {}", address);

        // Same baseline the stock software pushes right after connecting.
        self.send_fan(BASELINE_FAN_DUTY).await?;
        self.send_pump(BASELINE_PUMP_VOLTAGE).await?;
        Ok(())
    }

    /// Set the fan duty (raw 0-255; 0 turns the fan channel off).
    pub async fn send_fan(&mut self, duty: u8) -> Result<()> {
        self.write(encode_fan(duty)).await
    }

    /// Set the pump voltage.
    pub async fn send_pump(&mut self, level: PumpVoltage) -> Result<()> {
        self.write(encode_pump(level)).await
    }

    /// Set the RGB ring mode and color.
    pub async fn send_rgb(&mut self, mode: RgbMode, color: RgbColor) -> Result<()> {
        self.write(encode_rgb(mode, color)).await
    }

    /// Turn the pump channel off.
    pub async fn send_pump_off(&mut self) -> Result<()> {
        self.write(encode_pump_off()).await
    }

    /// Turn the lighting off.
    pub async fn send_rgb_off(&mut self) -> Result<()> {
        self.write(encode_rgb_off()).await
    }

    /// Drop the link if one is up. Never fails and is safe to repeat.
    ///
    /// A reset frame goes out first so the cooler returns to standalone
    /// control; if it cannot be delivered the link is dropped anyway.
    pub async fn disconnect(&mut self) {
        let state = std::mem::replace(&mut self.state, ConnectionState::Disconnected);
        if let ConnectionState::Connected(handle) = state {
            if let Err(e) = self
                .transport
                .write_command(&handle, UART_TX_CHAR_UUID, &encode_reset())
                .await
            {
                debug!("reset frame not delivered: {}", e);
            }
            if let Err(e) = self.transport.disconnect(&handle).await {
                warn!("disconnect reported an error: {}", e);
            }
            info!("disconnected");
        }
    }

    /// Write one frame, dropping to disconnected if the link fails.
    async fn write(&mut self, frame: [u8; FRAME_LENGTH]) -> Result<()> {
        let result = match &self.state {
            ConnectionState::Connected(handle) => {
                self.transport
                    .write_command(handle, UART_TX_CHAR_UUID, &frame)
                    .await
            }
            other => {
                debug!("dropping command while {}", other.status_text());
                return Ok(());
            }
        };

        if let Err(e) = result {
            warn!("write failed, dropping connection: {}", e);
            self.state = ConnectionState::Disconnected;
            return Err(CoolerError::WriteFailed {
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    const DEADLINE: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_connect_sends_baseline() {
        let transport = MockTransport::new();
        let mut session = DeviceSession::new(transport.clone());

        session.connect("aa:bb:cc:dd:ee:ff", DEADLINE).await.unwrap();

        assert!(session.is_connected());
        assert_eq!(transport.connections(), vec!["aa:bb:cc:dd:ee:ff"]);
        assert_eq!(
            transport.written(),
            vec![
                encode_fan(BASELINE_FAN_DUTY).to_vec(),
                encode_pump(BASELINE_PUMP_VOLTAGE).to_vec(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout() {
        let transport = MockTransport::new();
        transport.set_connect_delay(Duration::from_secs(60));
        let mut session = DeviceSession::new(transport.clone());

        let result = session.connect("aa", DEADLINE).await;

        assert!(matches!(
            result,
            Err(CoolerError::ConnectTimeout {
                timeout_secs: 5,
                ..
            })
        ));
        assert!(!session.is_connected());
        assert_eq!(session.status_text(), "disconnected");
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let transport = MockTransport::new();
        transport.refuse_connections();
        let mut session = DeviceSession::new(transport.clone());

        let result = session.connect("aa", DEADLINE).await;

        assert!(matches!(result, Err(CoolerError::ConnectRejected { .. })));
        assert!(!session.is_connected());
        assert!(transport.written().is_empty());
    }

    #[tokio::test]
    async fn test_commands_noop_while_disconnected() {
        let transport = MockTransport::new();
        let mut session = DeviceSession::new(transport.clone());

        session.send_fan(200).await.unwrap();
        session.send_pump(PumpVoltage::V12).await.unwrap();
        session
            .send_rgb(RgbMode::Static, RgbColor::new(1, 2, 3))
            .await
            .unwrap();

        assert!(transport.written().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_drops_connection() {
        let transport = MockTransport::new();
        let mut session = DeviceSession::new(transport.clone());
        session.connect("aa", DEADLINE).await.unwrap();

        // Baseline already consumed two writes.
        transport.fail_writes_after(2);
        let result = session.send_fan(200).await;

        assert!(matches!(result, Err(CoolerError::WriteFailed { .. })));
        assert!(!session.is_connected());

        // Follow-up commands are silent no-ops again.
        session.send_fan(90).await.unwrap();
        assert_eq!(transport.written().len(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_sends_reset_and_is_idempotent() {
        let transport = MockTransport::new();
        let mut session = DeviceSession::new(transport.clone());
        session.connect("aa", DEADLINE).await.unwrap();

        session.disconnect().await;
        assert!(!session.is_connected());
        assert_eq!(transport.disconnects(), 1);
        assert_eq!(transport.written().last().unwrap(), &encode_reset().to_vec());

        session.disconnect().await;
        assert_eq!(transport.disconnects(), 1);
    }
}
