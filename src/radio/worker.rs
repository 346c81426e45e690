use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use futures::{SinkExt, StreamExt};
use futures::channel::mpsc::{unbounded, Sender, UnboundedSender};
use btleplug::api::{Central, ScanFilter};
use btleplug::platform::Adapter;
use log::{debug, info, warn};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::device::types::{Capability, CoreEvent, DeviceAddress};
use crate::error::ScanError;
use crate::radio::connection::connection_task;
use crate::radio::constants::PERMISSION_PROBE_DEADLINE;
use crate::radio::scan::{ensure_powered, start_scan, stop_scan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCommand {
    ProbePermission,
    BeginScan,
    EndScan,
    Connect(DeviceAddress),
    Close(DeviceAddress),
}

struct ActiveConnection {
    address: DeviceAddress,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

// A start/stop round-trip: the host refuses to scan without the permission
async fn probe_permission(adapter: &Adapter) -> bool {
    if let Err(err) = ensure_powered(adapter).await {
        // begin_scan reports the adapter problem
        warn!("Skipping permission probe: {}", err);
        return true;
    }

    let probe = async {
        adapter.start_scan(ScanFilter::default()).await?;
        adapter.stop_scan().await
    };

    tokio::select! {
        _ = sleep(Duration::from_millis(PERMISSION_PROBE_DEADLINE)) => {
            warn!("Probing for the scan permission took too long");
            false
        }
        result = probe => match result {
            Ok(()) => true,
            Err(btleplug::Error::PermissionDenied) => false,
            Err(err) => {
                // not a permission problem, begin_scan will report it
                warn!("Permission probe failed: {:?}", err);
                true
            },
        }
    }
}

/// Serializes every radio operation. Commands never block the sender, results are delivered as
/// `CoreEvent`s on `events`.
pub fn radio_task(
    cancel: CancellationToken,
    adapter: Adapter,
    granted: Arc<AtomicBool>,
    mut events: Sender<CoreEvent>,
) -> (UnboundedSender<RadioCommand>, JoinHandle<()>) {
    let (tx, mut rx) = unbounded::<RadioCommand>();

    let handle = spawn(async move {
        let mut scan_cancel: Option<CancellationToken> = None;
        let mut connection: Option<ActiveConnection> = None;

        'mainloop: loop {
            let command = tokio::select! {
                _ = cancel.cancelled() => {
                    break 'mainloop;
                },
                command = rx.next() => match command {
                    Some(command) => command,
                    None => break 'mainloop,
                },
            };

            debug!("Radio command {:?}", command);

            match command {
                RadioCommand::ProbePermission => {
                    let is_granted = scan_cancel.is_some() || probe_permission(&adapter).await;
                    granted.store(is_granted, Ordering::SeqCst);

                    let event = CoreEvent::PermissionResult { capability: Capability::Scan, granted: is_granted };
                    if events.send(event).await.is_err() {
                        break 'mainloop;
                    }
                },
                RadioCommand::BeginScan => {
                    if scan_cancel.is_some() {
                        debug!("Already scanning");
                        continue 'mainloop;
                    }

                    let token = cancel.child_token();
                    match start_scan(&adapter, token.clone(), events.clone()).await {
                        Ok(_) => {
                            scan_cancel = Some(token);
                        },
                        Err(err) => {
                            if err.is_permission_denied() {
                                granted.store(false, Ordering::SeqCst);
                            }

                            if events.send(CoreEvent::ScanFailed(ScanError::from(err))).await.is_err() {
                                break 'mainloop;
                            }
                        },
                    }
                },
                RadioCommand::EndScan => {
                    if let Some(token) = scan_cancel.take() {
                        token.cancel();
                        stop_scan(&adapter).await;
                    }
                },
                RadioCommand::Connect(address) => {
                    if let Some(previous) = connection.take() {
                        warn!("Replacing connection to {} with {}", previous.address, address);
                        previous.cancel.cancel();
                    }

                    let token = cancel.child_token();
                    let handle = connection_task(adapter.clone(), address.clone(), token.clone(), events.clone());
                    connection = Some(ActiveConnection { address, cancel: token, handle });
                },
                RadioCommand::Close(address) => {
                    match connection.take() {
                        Some(active) if active.address == address => {
                            active.cancel.cancel();
                        },
                        other => {
                            debug!("No connection to {} to close", address);
                            connection = other;
                        },
                    }
                },
            }
        }

        if let Some(token) = scan_cancel.take() {
            token.cancel();
            stop_scan(&adapter).await;
        }

        if let Some(active) = connection.take() {
            active.cancel.cancel();
            info!("Waiting for connection to {} to close", active.address);
            if let Err(err) = active.handle.await {
                warn!("Connection task failed: {:?}", err);
            }
        }
    });

    (tx, handle)
}
