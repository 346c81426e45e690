use std::future::Future;
use futures::{SinkExt, StreamExt};
use futures::channel::mpsc::Sender;
use btleplug::api::{Central, CentralEvent, Peripheral as _};
use btleplug::platform::{Adapter, Peripheral};
use log::{info, warn};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::device::types::{ConnectStatus, ConnectionEvent, CoreEvent, DeviceAddress, LinkState};
use crate::error::DeviceError;
use crate::radio::constants::DISCONNECT_DEADLINE;
use crate::radio::scan::peripheral_address;

async fn find_peripheral(adapter: &Adapter, address: &DeviceAddress) -> Result<Option<Peripheral>, DeviceError> {
    for peripheral in adapter.peripherals().await? {
        if &peripheral_address(&peripheral) == address {
            return Ok(Some(peripheral));
        }
    }

    Ok(None)
}

async fn send_state(events: &mut Sender<CoreEvent>, address: &DeviceAddress, status: ConnectStatus, state: LinkState) {
    let event = CoreEvent::Connection(ConnectionEvent { address: address.clone(), status, state });

    if let Err(err) = events.send(event).await {
        warn!("Failed to deliver connection state for {}: {:?}", address, err);
    }
}

async fn disconnect_peripheral(peripheral: &Peripheral) {
    tokio::select! {
        _ = sleep(Duration::from_millis(DISCONNECT_DEADLINE)) => {
            warn!("Disconnecting from peripheral took too long");
        }
        result = peripheral.disconnect() => {
            if let Err(err) = result {
                warn!("Failed to disconnect from peripheral: {:?}", err);
            }
        }
    };
}

/// Returns whether the link came up. A cancelled attempt still runs `disconnect`, the host may
/// finish setting up the link anyway.
async fn connect_unless_cancelled<C, D>(
    cancel: &CancellationToken,
    connect: C,
    disconnect: D,
) -> Result<bool, btleplug::Error>
where
    C: Future<Output = Result<(), btleplug::Error>>,
    D: Future<Output = ()>,
{
    tokio::select! {
        _ = cancel.cancelled() => {
            disconnect.await;
            Ok(false)
        }
        result = connect => result.map(|_| true),
    }
}

async fn connect_and_watch(
    adapter: &Adapter,
    address: &DeviceAddress,
    cancel: &CancellationToken,
    events: &mut Sender<CoreEvent>,
) -> Result<(), DeviceError> {
    let peripheral = find_peripheral(adapter, address).await?.ok_or(DeviceError::DeviceNotFound)?;
    let mut central_events = adapter.events().await?;

    info!("Connecting to peripheral {}...", address);
    if !connect_unless_cancelled(cancel, peripheral.connect(), disconnect_peripheral(&peripheral)).await? {
        info!("Connecting to {} was cancelled", address);
        return Ok(());
    }

    info!("Connected to peripheral {}", address);
    send_state(events, address, ConnectStatus::Success, LinkState::Connected).await;

    let id = peripheral.id();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Closing connection to {}", address);
                disconnect_peripheral(&peripheral).await;
                return Ok(());
            }
            event = central_events.next() => match event {
                Some(CentralEvent::DeviceDisconnected(disconnected)) if disconnected == id => {
                    info!("Peripheral {} disconnected", address);
                    send_state(events, address, ConnectStatus::Success, LinkState::Disconnected).await;
                    return Ok(());
                },
                Some(_) => {},
                None => return Err(DeviceError::EventStreamEnded),
            },
        }
    }
}

/// Connect to `address` and report its state changes as `CoreEvent::Connection` until the peripheral
/// disconnects or `cancel` fires. Cancelling disconnects the peripheral.
pub fn connection_task(
    adapter: Adapter,
    address: DeviceAddress,
    cancel: CancellationToken,
    mut events: Sender<CoreEvent>,
) -> JoinHandle<()> {
    spawn(async move {
        if let Err(err) = connect_and_watch(&adapter, &address, &cancel, &mut events).await {
            warn!("Connection to {} failed: {:?}", address, err);
            let status = ConnectStatus::Failure { reason: err.to_string() };
            send_state(&mut events, &address, status, LinkState::Disconnected).await;
        }
    })
}
