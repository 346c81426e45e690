//! Capabilities the core needs from the host. None of these calls block: results that take time
//! are delivered later as a [`CoreEvent`](crate::device::types::CoreEvent).

use crate::device::types::{Capability, DeviceAddress, DiscoveredDevice, Notice};
use crate::error::{ConnectError, ScanError};

pub trait PermissionService {
    fn is_granted(&self, capability: Capability) -> bool;

    /// Ask the user (or the OS) for a capability. Delivers `CoreEvent::PermissionResult`.
    fn request_grant(&mut self, capability: Capability);
}

pub trait ScanService {
    /// Start an unfiltered scan. Delivers `CoreEvent::ScanResult` for every sighting and
    /// `CoreEvent::ScanFailed` if the host gives up.
    fn begin_scan(&mut self) -> Result<(), ScanError>;

    fn end_scan(&mut self);
}

pub trait ConnectService {
    /// Delivers `CoreEvent::Connection` until the connection is closed.
    fn connect(&mut self, address: &DeviceAddress) -> Result<(), ConnectError>;

    fn close(&mut self, address: &DeviceAddress);
}

/// Everything the radio has to offer to the controller.
pub trait Radio: PermissionService + ScanService + ConnectService {}

impl<T: PermissionService + ScanService + ConnectService> Radio for T {}

pub trait PresentationSink {
    /// The whole list changed (a new scan session started).
    fn list_reset(&mut self);

    fn item_inserted(&mut self, index: usize, device: &DiscoveredDevice);

    fn item_changed(&mut self, index: usize, device: &DiscoveredDevice);

    fn scanning_changed(&mut self, scanning: bool);

    fn notice(&mut self, notice: &Notice);

    /// The user asked to see the whole list again.
    fn show_list(&mut self, _devices: &[&DiscoveredDevice]) {}
}
