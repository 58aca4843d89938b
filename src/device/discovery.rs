//! Scan-side discovery of supported coolers.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{DISCOVERY_RETRY_DELAY, SCAN_WINDOW};
use crate::error::Result;
use crate::protocol::commands::SUPPORTED_MODELS;
use crate::transport::{DiscoveredDevice, Transport};

/// Whether `name` matches one of the supported cooler models.
///
/// Matching is a case-insensitive substring test, since some units
/// advertise suffixed names like "LCT21001 BLE".
pub fn is_supported_model(name: &str) -> bool {
    let lowered = name.to_lowercase();
    SUPPORTED_MODELS
        .iter()
        .any(|model| lowered.contains(&model.to_lowercase()))
}

/// Run one scan window and keep only supported coolers.
pub async fn discover<T: Transport>(transport: &T) -> Result<Vec<DiscoveredDevice>> {
    let devices = transport.scan(SCAN_WINDOW).await?;
    let coolers: Vec<DiscoveredDevice> = devices
        .into_iter()
        .filter(|device| is_supported_model(&device.name))
        .collect();
    debug!("{} supported cooler(s) in scan results", coolers.len());
    Ok(coolers)
}

/// Scan repeatedly until a cooler shows up or `cancel` fires.
///
/// Empty scans retry after a fixed delay; scan errors propagate
/// immediately. Cancellation is observed between scan windows and returns
/// `Ok(None)`.
pub async fn discover_until_found<T: Transport>(
    transport: &T,
    cancel: &CancellationToken,
) -> Result<Option<Vec<DiscoveredDevice>>> {
    loop {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let coolers = discover(transport).await?;
        if !coolers.is_empty() {
            info!("found {} cooler(s)", coolers.len());
            return Ok(Some(coolers));
        }

        debug!("no cooler visible, retrying in {:?}", DISCOVERY_RETRY_DELAY);
        tokio::select! {
            () = cancel.cancelled() => return Ok(None),
            () = tokio::time::sleep(DISCOVERY_RETRY_DELAY) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::transport::mock::MockTransport;

    fn device(name: &str) -> DiscoveredDevice {
        DiscoveredDevice {
            name: name.to_string(),
            address: format!("addr-{}", name),
            rssi: Some(-52),
        }
    }

    #[test]
    fn test_is_supported_model() {
        assert!(is_supported_model("LCT21001"));
        assert!(is_supported_model("LCT22002"));
        assert!(is_supported_model("lct21001 BLE"));
        assert!(!is_supported_model("Hydro H100i"));
        assert!(!is_supported_model(""));
    }

    #[tokio::test]
    async fn test_discover_filters_unsupported() {
        let transport = MockTransport::new();
        transport.push_scan(vec![
            device("LCT21001"),
            device("Some Headphones"),
            device("lct22002"),
        ]);

        let coolers = discover(&transport).await.unwrap();

        let names: Vec<&str> = coolers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["LCT21001", "lct22002"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_until_found_retries() {
        let transport = MockTransport::new();
        transport.push_scan(Vec::new());
        transport.push_scan(vec![device("LCT21001")]);
        let cancel = CancellationToken::new();

        let found = discover_until_found(&transport, &cancel).await.unwrap();

        assert_eq!(found.unwrap().len(), 1);
        assert_eq!(transport.scan_calls(), 2);
    }

    #[tokio::test]
    async fn test_discover_until_found_pre_cancelled() {
        let transport = MockTransport::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let found = discover_until_found(&transport, &cancel).await.unwrap();

        assert!(found.is_none());
        assert_eq!(transport.scan_calls(), 0);
    }

    #[tokio::test]
    async fn test_discover_until_found_cancelled_between_retries() {
        let transport = MockTransport::new();
        let task_transport = transport.clone();
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();

        let task =
            tokio::spawn(async move { discover_until_found(&task_transport, &loop_cancel).await });
        // Let the first empty scan happen, then stop the loop.
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let found = task.await.unwrap().unwrap();
        assert!(found.is_none());
        assert!(transport.scan_calls() >= 1);
    }
}
