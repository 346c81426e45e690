use futures::StreamExt;
use futures::channel::mpsc::{channel, Receiver, Sender};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::device::controller::ScanController;
use crate::device::host::{PresentationSink, Radio};
use crate::device::types::CoreEvent;

pub const CORE_EVENT_BUFFER: usize = 128;

pub fn core_channel() -> (Sender<CoreEvent>, Receiver<CoreEvent>) {
    channel::<CoreEvent>(CORE_EVENT_BUFFER)
}

/// Drains the core event channel until `cancel` fires or every sender is gone. This is the only
/// place where the controller is driven, so host callbacks never touch core state directly.
pub async fn run_core<R, V>(
    mut controller: ScanController<R, V>,
    mut events: Receiver<CoreEvent>,
    cancel: CancellationToken,
) -> ScanController<R, V>
where
    R: Radio,
    V: PresentationSink,
{
    'mainloop: loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break 'mainloop;
            },
            event = events.next() => match event {
                Some(event) => controller.handle(event),
                None => {
                    info!("Core event channel closed");
                    break 'mainloop;
                },
            },
        }
    }

    controller.stop();
    controller.disconnect();
    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;
    use crate::device::testing::{FakeRadio, RadioCall, RecordingView};
    use crate::device::types::{DeviceAddress, DiscoveredDevice, ScanState, UserCommand};

    #[tokio::test]
    async fn events_are_applied_in_order() {
        let controller = ScanController::new(FakeRadio::granted(), RecordingView::default());
        let (mut sender, receiver) = core_channel();
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run_core(controller, receiver, cancel.clone()));

        sender.send(CoreEvent::Command(UserCommand::ToggleScan)).await.unwrap();
        sender.send(CoreEvent::ScanResult(DiscoveredDevice {
            address: DeviceAddress::new("AA:01"),
            name: None,
            rssi: -60,
            connectable: None,
        })).await.unwrap();
        drop(sender);

        let controller = handle.await.unwrap();
        assert_eq!(controller.store().len(), 1);
        // shutting down stops the scan
        assert_eq!(controller.state(), ScanState::Idle);
        assert_eq!(controller.radio().calls, vec![RadioCall::BeginScan, RadioCall::EndScan]);
    }

    #[tokio::test]
    async fn cancel_stops_the_loop() {
        let controller = ScanController::new(FakeRadio::granted(), RecordingView::default());
        let (_sender, receiver) = core_channel();
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run_core(controller, receiver, cancel.clone()));
        cancel.cancel();

        let controller = handle.await.unwrap();
        assert!(controller.radio().calls.is_empty());
    }
}
