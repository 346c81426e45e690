//! The host bluetooth stack, reached through btleplug.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use futures::channel::mpsc::{Sender, UnboundedSender};
use btleplug::api::{Central, Manager as _};
use btleplug::platform::{Adapter, Manager};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::device::host::{ConnectService, PermissionService, ScanService};
use crate::device::types::{Capability, CoreEvent, DeviceAddress};
use crate::error::{ConnectError, DeviceError, ScanError};
use crate::radio::worker::{radio_task, RadioCommand};

pub mod connection;
pub mod constants;
pub mod scan;
pub mod worker;

async fn find_adapter(adapter_index: usize) -> Result<Adapter, DeviceError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    info!("Found {} bluetooth adapter(s)", adapters.len());

    adapters.into_iter().nth(adapter_index).ok_or(DeviceError::NoAdapter)
}

/// Handle to the radio worker. Every call returns immediately.
pub struct BtleRadio {
    // None if there is no usable adapter
    commands: Option<UnboundedSender<RadioCommand>>,
    granted: Arc<AtomicBool>,
}

impl BtleRadio {
    /// Start the radio worker for the adapter at `adapter_index`. A missing adapter is not an
    /// error here, it is reported as `RadioUnavailable` as soon as a scan or connection is
    /// requested.
    pub async fn open(
        adapter_index: usize,
        cancel: CancellationToken,
        events: Sender<CoreEvent>,
    ) -> (BtleRadio, Option<JoinHandle<()>>) {
        let granted = Arc::new(AtomicBool::new(false));

        match find_adapter(adapter_index).await {
            Ok(adapter) => {
                info!("Using adapter {}", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
                let (commands, handle) = radio_task(cancel, adapter, granted.clone(), events);
                (BtleRadio { commands: Some(commands), granted }, Some(handle))
            },
            Err(err) => {
                warn!("Bluetooth adapter {} is not available: {}", adapter_index, err);
                (BtleRadio { commands: None, granted }, None)
            },
        }
    }

    fn send(&self, command: RadioCommand) -> Result<(), ConnectError> {
        let commands = self.commands.as_ref().ok_or(ConnectError::RadioUnavailable)?;

        commands.unbounded_send(command).map_err(|err| {
            error!("Failed to send command to radio worker: {:?}", err);
            ConnectError::WorkerGone
        })
    }
}

impl PermissionService for BtleRadio {
    fn is_granted(&self, _capability: Capability) -> bool {
        // without a radio there is nothing to grant, begin_scan reports the real problem
        self.commands.is_none() || self.granted.load(Ordering::SeqCst)
    }

    fn request_grant(&mut self, capability: Capability) {
        info!("Requesting {:?} permission", capability);
        if let Err(err) = self.send(RadioCommand::ProbePermission) {
            error!("Could not request {:?} permission: {}", capability, err);
        }
    }
}

impl ScanService for BtleRadio {
    fn begin_scan(&mut self) -> Result<(), ScanError> {
        self.send(RadioCommand::BeginScan).map_err(|err| match err {
            ConnectError::RadioUnavailable => ScanError::RadioUnavailable,
            err => ScanError::Failure { reason: err.to_string() },
        })
    }

    fn end_scan(&mut self) {
        if let Err(err) = self.send(RadioCommand::EndScan) {
            warn!("Could not stop scanning: {}", err);
        }
    }
}

impl ConnectService for BtleRadio {
    fn connect(&mut self, address: &DeviceAddress) -> Result<(), ConnectError> {
        self.send(RadioCommand::Connect(address.clone()))
    }

    fn close(&mut self, address: &DeviceAddress) {
        if let Err(err) = self.send(RadioCommand::Close(address.clone())) {
            warn!("Could not close connection to {}: {}", address, err);
        }
    }
}
