//! Transport abstraction over the Bluetooth LE link.
//!
//! The session and discovery layers drive this trait instead of a concrete
//! Bluetooth stack, so the control logic can run against a scripted
//! transport in tests. [`BleTransport`] is the real btleplug-backed
//! implementation.

pub mod ble;

pub use ble::BleTransport;

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// A device seen during a scan window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Advertised local name.
    pub name: String,
    /// Stack address used to connect.
    pub address: String,
    /// Signal strength at scan time, if the stack reported one.
    pub rssi: Option<i16>,
}

/// Write-only Bluetooth LE link to a cooler.
#[async_trait]
pub trait Transport {
    /// Handle to a connected peripheral.
    type Handle: Send + Sync;

    /// Scan for `window` and return every named device seen.
    async fn scan(&self, window: Duration) -> Result<Vec<DiscoveredDevice>>;

    /// Connect to `address` and resolve its services.
    async fn connect(&self, address: &str) -> Result<Self::Handle>;

    /// Write one command frame to `characteristic` without response.
    async fn write_command(
        &self,
        handle: &Self::Handle,
        characteristic: Uuid,
        frame: &[u8],
    ) -> Result<()>;

    /// Drop the link.
    async fn disconnect(&self, handle: &Self::Handle) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted transport for exercising session and controller logic.

    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use uuid::Uuid;

    use super::{DiscoveredDevice, Transport};
    use crate::error::{CoolerError, Result};

    #[derive(Default)]
    struct MockState {
        scan_results: VecDeque<Vec<DiscoveredDevice>>,
        scan_calls: usize,
        connect_delay: Option<Duration>,
        refuse_connect: bool,
        fail_writes_after: Option<usize>,
        connections: Vec<String>,
        written: Vec<Vec<u8>>,
        disconnects: usize,
    }

    /// Transport double whose behavior is scripted up front.
    ///
    /// Clones share the same script and recording, so a test can keep one
    /// clone for assertions while a session owns the other.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    pub struct MockHandle;

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the result of the next scan. Unqueued scans come back empty.
        pub fn push_scan(&self, devices: Vec<DiscoveredDevice>) {
            self.state.lock().scan_results.push_back(devices);
        }

        pub fn set_connect_delay(&self, delay: Duration) {
            self.state.lock().connect_delay = Some(delay);
        }

        pub fn refuse_connections(&self) {
            self.state.lock().refuse_connect = true;
        }

        /// Writes start failing once `count` frames have been accepted.
        pub fn fail_writes_after(&self, count: usize) {
            self.state.lock().fail_writes_after = Some(count);
        }

        pub fn written(&self) -> Vec<Vec<u8>> {
            self.state.lock().written.clone()
        }

        pub fn scan_calls(&self) -> usize {
            self.state.lock().scan_calls
        }

        pub fn connections(&self) -> Vec<String> {
            self.state.lock().connections.clone()
        }

        pub fn disconnects(&self) -> usize {
            self.state.lock().disconnects
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        type Handle = MockHandle;

        async fn scan(&self, _window: Duration) -> Result<Vec<DiscoveredDevice>> {
            let mut state = self.state.lock();
            state.scan_calls += 1;
            Ok(state.scan_results.pop_front().unwrap_or_default())
        }

        async fn connect(&self, address: &str) -> Result<Self::Handle> {
            let delay = self.state.lock().connect_delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut state = self.state.lock();
            if state.refuse_connect {
                return Err(CoolerError::ConnectRejected {
                    address: address.to_string(),
                    reason: "scripted refusal".to_string(),
                });
            }
            state.connections.push(address.to_string());
            Ok(MockHandle)
        }

        async fn write_command(
            &self,
            _handle: &Self::Handle,
            _characteristic: Uuid,
            frame: &[u8],
        ) -> Result<()> {
            let mut state = self.state.lock();
            if let Some(limit) = state.fail_writes_after {
                if state.written.len() >= limit {
                    return Err(CoolerError::WriteFailed {
                        reason: "scripted write failure".to_string(),
                    });
                }
            }
            state.written.push(frame.to_vec());
            Ok(())
        }

        async fn disconnect(&self, _handle: &Self::Handle) -> Result<()> {
            self.state.lock().disconnects += 1;
            Ok(())
        }
    }
}
