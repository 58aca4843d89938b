//! btleplug-backed transport implementation.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SCAN_WINDOW;
use crate::error::{CoolerError, Result};
use crate::protocol::commands::UART_SERVICE_UUID;
use crate::transport::{DiscoveredDevice, Transport};

/// Bluetooth LE transport on the first adapter of the host.
pub struct BleTransport {
    adapter: Adapter,
}

impl BleTransport {
    /// Open the first Bluetooth adapter on this machine.
    ///
    /// # Errors
    /// Returns `NoAdapter` when the host has none.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(CoolerError::NoAdapter)?;
        Ok(Self { adapter })
    }

    /// Look up a peripheral by address in the adapter cache.
    async fn find_peripheral(&self, address: &str) -> Result<Option<Peripheral>> {
        for peripheral in self.adapter.peripherals().await? {
            if peripheral.address().to_string().eq_ignore_ascii_case(address) {
                return Ok(Some(peripheral));
            }
        }
        Ok(None)
    }

    async fn scan_window(&self, window: Duration) -> Result<()> {
        self.adapter.start_scan(ScanFilter::default()).await?;
        tokio::time::sleep(window).await;
        self.adapter.stop_scan().await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for BleTransport {
    type Handle = Peripheral;

    async fn scan(&self, window: Duration) -> Result<Vec<DiscoveredDevice>> {
        self.scan_window(window).await?;

        let mut devices = Vec::new();
        for peripheral in self.adapter.peripherals().await? {
            let Some(props) = peripheral.properties().await? else {
                continue;
            };
            // Nameless advertisements cannot be matched against a model.
            let Some(name) = props.local_name else {
                continue;
            };
            devices.push(DiscoveredDevice {
                name,
                address: props.address.to_string(),
                rssi: props.rssi,
            });
        }
        debug!("scan window closed, {} named device(s) visible", devices.len());
        Ok(devices)
    }

    async fn connect(&self, address: &str) -> Result<Self::Handle> {
        let peripheral = match self.find_peripheral(address).await? {
            Some(peripheral) => peripheral,
            None => {
                // The cache forgets devices between runs; one more scan
                // window usually brings the target back.
                debug!("{} not cached, rescanning", address);
                self.scan_window(SCAN_WINDOW).await?;
                self.find_peripheral(address)
                    .await?
                    .ok_or(CoolerError::DeviceNotFound)?
            }
        };

        peripheral
            .connect()
            .await
            .map_err(|e| CoolerError::ConnectRejected {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        peripheral.discover_services().await?;

        if !peripheral
            .services()
            .iter()
            .any(|service| service.uuid == UART_SERVICE_UUID)
        {
            warn!("{} does not expose the Nordic UART service", address);
        }
        Ok(peripheral)
    }

    async fn write_command(
        &self,
        handle: &Self::Handle,
        characteristic: Uuid,
        frame: &[u8],
    ) -> Result<()> {
        let target = handle
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic)
            .ok_or_else(|| CoolerError::WriteFailed {
                reason: format!("characteristic {} not found", characteristic),
            })?;

        handle
            .write(&target, frame, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }

    async fn disconnect(&self, handle: &Self::Handle) -> Result<()> {
        handle.disconnect().await?;
        Ok(())
    }
}
