use log::{debug, error, info, warn};

use crate::device::host::{PresentationSink, Radio};
use crate::device::notifier::ConnectionNotifier;
use crate::device::store::ScanResultStore;
use crate::device::types::{Capability, CoreEvent, DiscoveredDevice, Notice, ScanState, UserCommand};
use crate::error::ScanError;

/// Owns all core state: the scan results, the idle/scanning state and the connection attempt.
/// Must only be driven from a single task, see [`run_core`](crate::device::runner::run_core).
pub struct ScanController<R, V> {
    radio: R,
    view: V,
    store: ScanResultStore,
    state: ScanState,
    // a start was deferred until the scan permission is resolved
    awaiting_permission: bool,
    // the running scan is the automatic retry after a grant, a denial must not prompt again
    retried: bool,
    notifier: ConnectionNotifier,
}

impl<R: Radio, V: PresentationSink> ScanController<R, V> {
    pub fn new(radio: R, view: V) -> Self {
        ScanController {
            radio,
            view,
            store: ScanResultStore::new(),
            state: ScanState::Idle,
            awaiting_permission: false,
            retried: false,
            notifier: ConnectionNotifier::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn store(&self) -> &ScanResultStore {
        &self.store
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn handle(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::Command(UserCommand::ToggleScan) => self.toggle(),
            CoreEvent::Command(UserCommand::Select(index)) => self.select(index),
            CoreEvent::Command(UserCommand::Disconnect) => self.disconnect(),
            CoreEvent::Command(UserCommand::List) => {
                let devices: Vec<&DiscoveredDevice> = self.store.all().collect();
                self.view.show_list(&devices);
            },
            CoreEvent::PermissionResult { capability, granted } => {
                self.permission_result(capability, granted);
            },
            CoreEvent::ScanResult(device) => self.scan_result(device),
            CoreEvent::ScanFailed(err) => {
                if self.state == ScanState::Scanning {
                    self.scan_failed(err);
                } else {
                    // the scan it belongs to was already stopped or failed before
                    warn!("Ignoring scan failure reported while idle: {}", err);
                }
            },
            CoreEvent::Connection(event) => {
                self.notifier.handle(event, &mut self.radio, &mut self.view);
            },
        }
    }

    pub fn toggle(&mut self) {
        match self.state {
            ScanState::Idle => self.start(),
            ScanState::Scanning => self.stop(),
        }
    }

    pub fn start(&mut self) {
        self.retried = false;
        self.try_start(true);
    }

    // `may_request` is false for the single automatic retry after the permission was granted
    fn try_start(&mut self, may_request: bool) {
        if self.state == ScanState::Scanning {
            return;
        }

        if !self.radio.is_granted(Capability::Scan) {
            if self.awaiting_permission {
                debug!("Start requested while waiting for scan permission");
            } else if may_request {
                info!("Scan permission not granted, requesting it");
                self.request_permission();
            } else {
                warn!("Scan permission was reported as granted but is not available");
                self.view.notice(&Notice::PermissionDenied);
            }
            return;
        }

        self.store.clear();
        self.view.list_reset();

        match self.radio.begin_scan() {
            Ok(()) => {
                info!("Scan started");
                self.set_state(ScanState::Scanning);
            },
            Err(err) => self.scan_failed(err),
        }
    }

    pub fn stop(&mut self) {
        if self.state == ScanState::Idle {
            return;
        }

        info!("Scan stopped");
        self.radio.end_scan();
        self.set_state(ScanState::Idle);
    }

    /// Connect to the device at `index` in the list. Scanning is stopped first.
    pub fn select(&mut self, index: usize) {
        let device = match self.store.get(index) {
            Some(device) => device.clone(),
            None => {
                self.view.notice(&Notice::NoSuchDevice { index });
                return;
            },
        };

        self.stop();
        self.notifier.begin(&device, &mut self.radio, &mut self.view);
    }

    pub fn disconnect(&mut self) {
        self.notifier.disconnect(&mut self.radio, &mut self.view);
    }

    fn set_state(&mut self, state: ScanState) {
        if self.state != state {
            self.state = state;
            self.view.scanning_changed(state == ScanState::Scanning);
        }
    }

    fn request_permission(&mut self) {
        self.awaiting_permission = true;
        self.radio.request_grant(Capability::Scan);
        self.view.notice(&Notice::PermissionRequested);
    }

    fn permission_result(&mut self, capability: Capability, granted: bool) {
        if !self.awaiting_permission {
            debug!("Ignoring unrequested permission result for {:?}", capability);
            return;
        }

        self.awaiting_permission = false;

        if granted {
            info!("Permission {:?} granted, starting scan", capability);
            self.retried = true;
            self.try_start(false);
        } else {
            warn!("Permission {:?} denied", capability);
            self.view.notice(&Notice::PermissionDenied);
        }
    }

    fn scan_result(&mut self, device: DiscoveredDevice) {
        if self.state != ScanState::Scanning {
            debug!("Dropping scan result for {} received while idle", device.address);
            return;
        }

        // results arriving means the scan is allowed
        self.retried = false;
        let upsert = self.store.upsert(device);

        // the index was just returned by the store
        let Some(device) = self.store.get(upsert.index) else { return };

        if upsert.was_insert {
            info!("Found BLE device! Name: {}, address: {}", device.display_name(), device.address);
            self.view.item_inserted(upsert.index, device);
        } else {
            self.view.item_changed(upsert.index, device);
        }
    }

    fn scan_failed(&mut self, err: ScanError) {
        error!("Scan failed: {}", err);

        if self.state == ScanState::Scanning {
            self.radio.end_scan();
            self.set_state(ScanState::Idle);
        }

        match err {
            ScanError::PermissionDenied => {
                self.view.notice(&Notice::PermissionDenied);
                if self.retried {
                    warn!("Scan permission denied again after it was granted, not prompting again");
                    self.retried = false;
                } else if !self.awaiting_permission {
                    self.request_permission();
                }
            },
            ScanError::RadioUnavailable => self.view.notice(&Notice::RadioUnavailable),
            ScanError::Failure { reason } => self.view.notice(&Notice::ScanFailed { reason }),
        }
    }
}
