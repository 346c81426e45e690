use std::io;
use thiserror::Error;
use std::str::Utf8Error;
use btleplug;
use serde_json;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to start application (io): {source}")]
    IOError { #[from] source: io::Error },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("No bluetooth adapter is available")]
    NoAdapter,

    #[error("Device is not known to the adapter")]
    DeviceNotFound,

    #[error("The adapter stopped delivering events")]
    EventStreamEnded,

    #[error("The bluetooth adapter is powered off")]
    PoweredOff,
}

impl DeviceError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, DeviceError::Btle { source: btleplug::Error::PermissionDenied })
    }
}

/// Reasons a scan could not be started or stopped running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Bluetooth permission was denied")]
    PermissionDenied,

    #[error("No bluetooth radio is available or it is powered off")]
    RadioUnavailable,

    #[error("Scan failed: {reason}")]
    Failure { reason: String },
}

impl From<DeviceError> for ScanError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::NoAdapter | DeviceError::PoweredOff => ScanError::RadioUnavailable,
            err if err.is_permission_denied() => ScanError::PermissionDenied,
            err => ScanError::Failure { reason: err.to_string() },
        }
    }
}

/// Failures reported synchronously by a connect request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("No bluetooth radio is available")]
    RadioUnavailable,

    #[error("The radio worker has stopped")]
    WorkerGone,
}
