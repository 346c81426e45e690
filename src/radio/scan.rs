use std::fmt::Debug;
use futures::{SinkExt, StreamExt};
use futures::channel::mpsc::Sender;
use btleplug::api::{BDAddr, Central, CentralEvent, CentralState, Peripheral as _, PeripheralProperties, ScanFilter};
use btleplug::platform::{Adapter, Peripheral, PeripheralId};
use log::{debug, info, warn};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::device::types::{CoreEvent, DeviceAddress, DiscoveredDevice};
use crate::error::{DeviceError, ScanError};
use crate::radio::constants::{HIDDEN_ADDRESS_PREFIX, STOP_SCAN_DEADLINE};

/// The hardware address when the host reports one, otherwise the platform peripheral id.
pub fn address_for(address: BDAddr, id: &impl Debug) -> DeviceAddress {
    if address == BDAddr::default() {
        DeviceAddress::new(format!("{}{:?}", HIDDEN_ADDRESS_PREFIX, id))
    } else {
        DeviceAddress::new(address.to_string())
    }
}

pub fn peripheral_address(peripheral: &Peripheral) -> DeviceAddress {
    address_for(peripheral.address(), &peripheral.id())
}

/// Sightings without a signal strength are property changes rather than advertisements, those
/// are skipped.
pub fn device_from_properties(address: DeviceAddress, properties: PeripheralProperties) -> Option<DiscoveredDevice> {
    let rssi = properties.rssi?;

    Some(DiscoveredDevice {
        address,
        name: properties.local_name,
        rssi,
        // btleplug does not report whether an advertisement is connectable
        connectable: None,
    })
}

/// The scan can not continue once the adapter is switched off.
pub fn failure_for_state(state: &CentralState) -> Option<ScanError> {
    match state {
        CentralState::PoweredOff => Some(ScanError::RadioUnavailable),
        _ => None,
    }
}

pub async fn ensure_powered(adapter: &Adapter) -> Result<(), DeviceError> {
    let state = adapter.adapter_state().await?;

    match failure_for_state(&state) {
        Some(_) => Err(DeviceError::PoweredOff),
        None => Ok(()),
    }
}

async fn read_device(adapter: &Adapter, id: &PeripheralId) -> Result<Option<DiscoveredDevice>, DeviceError> {
    let peripheral = adapter.peripheral(id).await?;

    match peripheral.properties().await? {
        Some(properties) => Ok(device_from_properties(peripheral_address(&peripheral), properties)),
        None => Ok(None),
    }
}

async fn forward_scan_results(
    adapter: Adapter,
    mut central_events: impl futures::Stream<Item = CentralEvent> + Unpin,
    cancel: CancellationToken,
    mut events: Sender<CoreEvent>,
) {
    'mainloop: loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break 'mainloop;
            },
            event = central_events.next() => match event {
                Some(CentralEvent::DeviceDiscovered(id)) | Some(CentralEvent::DeviceUpdated(id)) => {
                    let device = match read_device(&adapter, &id).await {
                        Ok(Some(device)) => device,
                        Ok(None) => {
                            debug!("Peripheral {:?} has no signal strength yet", id);
                            continue 'mainloop;
                        },
                        Err(err) => {
                            warn!("Could not query peripheral for properties: {:?}", err);
                            continue 'mainloop;
                        },
                    };

                    if events.send(CoreEvent::ScanResult(device)).await.is_err() {
                        break 'mainloop;
                    }
                },
                Some(CentralEvent::StateUpdate(state)) => match failure_for_state(&state) {
                    Some(failure) => {
                        warn!("Adapter state changed to {:?} while scanning", state);
                        let _ = events.send(CoreEvent::ScanFailed(failure)).await;
                        break 'mainloop;
                    },
                    None => debug!("Adapter state changed to {:?}", state),
                },
                Some(_) => {},
                None => {
                    warn!("Adapter event stream ended while scanning");
                    let failure = ScanError::Failure { reason: DeviceError::EventStreamEnded.to_string() };
                    let _ = events.send(CoreEvent::ScanFailed(failure)).await;
                    break 'mainloop;
                },
            },
        }
    }

    debug!("Scan result forwarding stopped");
}

/// Start an unfiltered scan and forward every sighting as a `CoreEvent::ScanResult` until
/// `cancel` fires.
pub async fn start_scan(
    adapter: &Adapter,
    cancel: CancellationToken,
    events: Sender<CoreEvent>,
) -> Result<JoinHandle<()>, DeviceError> {
    ensure_powered(adapter).await?;

    // subscribe first, so that no sighting between start_scan and the subscription is lost
    let central_events = adapter.events().await?;

    info!("Scanning using adapter {}...", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
    adapter.start_scan(ScanFilter::default()).await?;

    Ok(spawn(forward_scan_results(adapter.clone(), central_events, cancel, events)))
}

pub async fn stop_scan(adapter: &Adapter) {
    tokio::select! {
        _ = sleep(Duration::from_millis(STOP_SCAN_DEADLINE)) => {
            warn!("Stopping the scan took too long");
        }
        result = adapter.stop_scan() => {
            if let Err(err) = result {
                warn!("Failed to stop scanning: {:?}", err);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_address_is_used_when_known() {
        let address = address_for(BDAddr::from([1, 2, 3, 4, 5, 6]), &"ignored");
        assert_eq!(address.as_str().to_uppercase(), "01:02:03:04:05:06");
    }

    #[test]
    fn hidden_address_falls_back_to_id() {
        let address = address_for(BDAddr::default(), &"4A1B");
        assert_eq!(address.as_str(), "id:\"4A1B\"");
    }

    #[test]
    fn properties_become_a_device() {
        let properties = PeripheralProperties {
            local_name: Some("Foo".to_string()),
            rssi: Some(-60),
            ..PeripheralProperties::default()
        };

        let device = device_from_properties(DeviceAddress::new("AA:01"), properties);
        assert_eq!(device, Some(DiscoveredDevice {
            address: DeviceAddress::new("AA:01"),
            name: Some("Foo".to_string()),
            rssi: -60,
            connectable: None,
        }));
    }

    #[test]
    fn powered_off_adapter_ends_the_scan() {
        assert_eq!(failure_for_state(&CentralState::PoweredOff), Some(ScanError::RadioUnavailable));
        assert_eq!(failure_for_state(&CentralState::PoweredOn), None);
        assert_eq!(failure_for_state(&CentralState::Unknown), None);
    }

    #[test]
    fn sighting_without_rssi_is_skipped() {
        let properties = PeripheralProperties {
            local_name: Some("Foo".to_string()),
            ..PeripheralProperties::default()
        };

        assert_eq!(device_from_properties(DeviceAddress::new("AA:01"), properties), None);
    }
}
