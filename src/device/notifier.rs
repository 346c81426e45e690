use log::{debug, info, warn};

use crate::device::host::{ConnectService, PresentationSink};
use crate::device::types::{ConnectStatus, ConnectionEvent, DeviceAddress, DiscoveredDevice, LinkState, Notice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Pending,
    Connected,
}

#[derive(Debug, Clone)]
struct ConnectionAttempt {
    address: DeviceAddress,
    name: String,
    phase: AttemptPhase,
}

/// Tracks the one connection attempt that may be active and turns its state changes into notices.
#[derive(Debug, Default)]
pub struct ConnectionNotifier {
    attempt: Option<ConnectionAttempt>,
}

impl ConnectionNotifier {
    pub fn new() -> Self {
        ConnectionNotifier::default()
    }

    pub fn active(&self) -> Option<(&DeviceAddress, AttemptPhase)> {
        self.attempt.as_ref().map(|attempt| (&attempt.address, attempt.phase))
    }

    pub fn begin<C, V>(&mut self, device: &DiscoveredDevice, connect: &mut C, view: &mut V)
    where
        C: ConnectService + ?Sized,
        V: PresentationSink + ?Sized,
    {
        let name = device.display_name().to_string();

        if let Some(attempt) = &self.attempt {
            warn!("Rejecting connect to {}, attempt for {} is still active", device.address, attempt.address);
            view.notice(&Notice::ConnectionBusy { name: attempt.name.clone() });
            return;
        }

        info!("Connecting to {}", device.address);
        match connect.connect(&device.address) {
            Ok(()) => {
                self.attempt = Some(ConnectionAttempt {
                    address: device.address.clone(),
                    name,
                    phase: AttemptPhase::Pending,
                });
            },
            Err(err) => {
                warn!("Connect request for {} failed: {}", device.address, err);
                view.notice(&Notice::ConnectionFailed { name, reason: err.to_string() });
            },
        }
    }

    pub fn handle<C, V>(&mut self, event: ConnectionEvent, connect: &mut C, view: &mut V)
    where
        C: ConnectService + ?Sized,
        V: PresentationSink + ?Sized,
    {
        let attempt = match self.attempt.as_mut() {
            Some(attempt) if attempt.address == event.address => attempt,
            _ => {
                debug!("Ignoring connection event for inactive device {}: {:?}", event.address, event);
                return;
            },
        };

        match (event.status, event.state) {
            (ConnectStatus::Success, LinkState::Connected) => {
                info!("Successfully connected to {}", attempt.address);
                attempt.phase = AttemptPhase::Connected;
                view.notice(&Notice::Connected { name: attempt.name.clone() });
            },
            (ConnectStatus::Success, LinkState::Disconnected) => {
                info!("Successfully disconnected from {}", attempt.address);
                view.notice(&Notice::Disconnected { name: attempt.name.clone() });
                self.release(connect);
            },
            (ConnectStatus::Failure { reason }, _) => {
                warn!("Error {} encountered for {}! Disconnecting...", reason, attempt.address);
                view.notice(&Notice::ConnectionFailed { name: attempt.name.clone(), reason });
                self.release(connect);
            },
        }
    }

    /// Close the active attempt on request of the user.
    pub fn disconnect<C, V>(&mut self, connect: &mut C, view: &mut V)
    where
        C: ConnectService + ?Sized,
        V: PresentationSink + ?Sized,
    {
        if let Some(attempt) = &self.attempt {
            info!("Disconnecting from {}", attempt.address);
            view.notice(&Notice::Disconnected { name: attempt.name.clone() });
            self.release(connect);
        }
    }

    fn release<C: ConnectService + ?Sized>(&mut self, connect: &mut C) {
        if let Some(attempt) = self.attempt.take() {
            connect.close(&attempt.address);
        }
    }
}
