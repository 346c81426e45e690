use std::fmt;

use crate::error::ScanError;

/// Stable identity of a peripheral, as reported by the host stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    pub fn new(address: impl Into<String>) -> Self {
        DeviceAddress(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One observation of an advertising device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub address: DeviceAddress,
    pub name: Option<String>,
    pub rssi: i16, // dBm
    // Not every host stack reports this
    pub connectable: Option<bool>,
}

impl DiscoveredDevice {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed")
    }
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connectable = match self.connectable {
            Some(true) => "true",
            Some(false) => "false",
            None => "unknown",
        };

        write!(
            f,
            "{} {} {} dBm connectable: {}",
            self.display_name(),
            self.address,
            self.rssi,
            connectable,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
}

/// Host capabilities that have to be granted before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    // The location-equivalent permission that gates BLE scanning
    Scan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectStatus {
    Success,
    Failure { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

/// A connection state change reported by the host for a connect request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub address: DeviceAddress,
    pub status: ConnectStatus,
    pub state: LinkState,
}

/// Things the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    ToggleScan,
    Select(usize),
    Disconnect,
    List,
}

/// Everything the core reacts to. Host callbacks are marshaled into this type and delivered over
/// a single channel, so that only the owner task touches core state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    Command(UserCommand),
    PermissionResult { capability: Capability, granted: bool },
    ScanResult(DiscoveredDevice),
    ScanFailed(ScanError),
    Connection(ConnectionEvent),
}

/// User visible outcomes, rendered as a short message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Connected { name: String },
    Disconnected { name: String },
    ConnectionFailed { name: String, reason: String },
    ConnectionBusy { name: String },
    PermissionRequested,
    PermissionDenied,
    RadioUnavailable,
    ScanFailed { reason: String },
    NoSuchDevice { index: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Connected { name } => write!(f, "Successfully connected to {}", name),
            Notice::Disconnected { name } => write!(f, "Disconnected from {}", name),
            Notice::ConnectionFailed { name, reason } => write!(f, "Could not connect to {} ({})", name, reason),
            Notice::ConnectionBusy { name } => write!(f, "Already connecting to {}, disconnect first", name),
            Notice::PermissionRequested => write!(f, "This app needs the Bluetooth scan permission, please accept to scan"),
            Notice::PermissionDenied => write!(f, "Bluetooth scan permission was denied"),
            Notice::RadioUnavailable => write!(f, "Bluetooth is off or not available, turn it on and scan again"),
            Notice::ScanFailed { reason } => write!(f, "Scanning failed: {}", reason),
            Notice::NoSuchDevice { index } => write!(f, "There is no device at position {}", index),
        }
    }
}
