use crate::device::host::{ConnectService, PermissionService, PresentationSink, ScanService};
use crate::device::types::{Capability, DeviceAddress, DiscoveredDevice, Notice};
use crate::error::{ConnectError, ScanError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    RequestGrant(Capability),
    BeginScan,
    EndScan,
    Connect(DeviceAddress),
    Close(DeviceAddress),
}

/// Records every capability call. Outcomes are configured through the public fields.
#[derive(Debug, Default)]
pub struct FakeRadio {
    pub granted: bool,
    pub scan_error: Option<ScanError>,
    pub connect_error: Option<ConnectError>,
    pub calls: Vec<RadioCall>,
}

impl FakeRadio {
    pub fn granted() -> Self {
        FakeRadio { granted: true, ..FakeRadio::default() }
    }

    pub fn count(&self, call: &RadioCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl PermissionService for FakeRadio {
    fn is_granted(&self, _capability: Capability) -> bool {
        self.granted
    }

    fn request_grant(&mut self, capability: Capability) {
        self.calls.push(RadioCall::RequestGrant(capability));
    }
}

impl ScanService for FakeRadio {
    fn begin_scan(&mut self) -> Result<(), ScanError> {
        self.calls.push(RadioCall::BeginScan);
        match &self.scan_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn end_scan(&mut self) {
        self.calls.push(RadioCall::EndScan);
    }
}

impl ConnectService for FakeRadio {
    fn connect(&mut self, address: &DeviceAddress) -> Result<(), ConnectError> {
        self.calls.push(RadioCall::Connect(address.clone()));
        match &self.connect_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn close(&mut self, address: &DeviceAddress) {
        self.calls.push(RadioCall::Close(address.clone()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    ListReset,
    Inserted(usize, DiscoveredDevice),
    Changed(usize, DiscoveredDevice),
    Scanning(bool),
    Notice(Notice),
    List(Vec<DiscoveredDevice>),
}

#[derive(Debug, Default)]
pub struct RecordingView {
    pub calls: Vec<ViewCall>,
}

impl RecordingView {
    pub fn notices(&self) -> Vec<Notice> {
        self.calls.iter().filter_map(|call| match call {
            ViewCall::Notice(notice) => Some(notice.clone()),
            _ => None,
        }).collect()
    }
}

impl PresentationSink for RecordingView {
    fn list_reset(&mut self) {
        self.calls.push(ViewCall::ListReset);
    }

    fn item_inserted(&mut self, index: usize, device: &DiscoveredDevice) {
        self.calls.push(ViewCall::Inserted(index, device.clone()));
    }

    fn item_changed(&mut self, index: usize, device: &DiscoveredDevice) {
        self.calls.push(ViewCall::Changed(index, device.clone()));
    }

    fn scanning_changed(&mut self, scanning: bool) {
        self.calls.push(ViewCall::Scanning(scanning));
    }

    fn notice(&mut self, notice: &Notice) {
        self.calls.push(ViewCall::Notice(notice.clone()));
    }

    fn show_list(&mut self, devices: &[&DiscoveredDevice]) {
        self.calls.push(ViewCall::List(devices.iter().map(|d| (*d).clone()).collect()));
    }
}
