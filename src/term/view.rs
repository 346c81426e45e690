use std::io::Write;
use log::warn;

use crate::device::host::PresentationSink;
use crate::device::types::{DiscoveredDevice, Notice};

pub const START_SCAN_LABEL: &str = "Start Scan";
pub const STOP_SCAN_LABEL: &str = "Stop Scan";

/// Prints the scan list and notices as plain lines.
pub struct TerminalView<W: Write> {
    out: W,
    show_updates: bool,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, show_updates: bool) -> Self {
        TerminalView { out, show_updates }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            warn!("Failed to write to terminal: {:?}", err);
        }
    }
}

impl<W: Write> PresentationSink for TerminalView<W> {
    fn list_reset(&mut self) {
        self.line(format_args!("-- scan results cleared --"));
    }

    fn item_inserted(&mut self, index: usize, device: &DiscoveredDevice) {
        self.line(format_args!("[{}] {}", index, device));
    }

    fn item_changed(&mut self, index: usize, device: &DiscoveredDevice) {
        if self.show_updates {
            self.line(format_args!("[{}] {} (updated)", index, device));
        }
    }

    fn scanning_changed(&mut self, scanning: bool) {
        if scanning {
            self.line(format_args!("Scanning... enter 's' to {}", STOP_SCAN_LABEL));
        } else {
            self.line(format_args!("Not scanning, enter 's' to {}", START_SCAN_LABEL));
        }
    }

    fn notice(&mut self, notice: &Notice) {
        self.line(format_args!("* {}", notice));
    }

    fn show_list(&mut self, devices: &[&DiscoveredDevice]) {
        if devices.is_empty() {
            self.line(format_args!("No devices found"));
        }

        for (index, device) in devices.iter().enumerate() {
            self.line(format_args!("[{}] {}", index, device));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::types::DeviceAddress;

    fn foo(rssi: i16) -> DiscoveredDevice {
        DiscoveredDevice {
            address: DeviceAddress::new("AA:01"),
            name: Some("Foo".to_string()),
            rssi,
            connectable: Some(true),
        }
    }

    fn output(view: TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn updates_are_hidden_by_default() {
        let mut view = TerminalView::new(Vec::new(), false);
        view.item_inserted(0, &foo(-60));
        view.item_changed(0, &foo(-55));

        assert_eq!(output(view), "[0] Foo AA:01 -60 dBm connectable: true\n");
    }

    #[test]
    fn updates_can_be_shown() {
        let mut view = TerminalView::new(Vec::new(), true);
        view.item_changed(0, &foo(-55));

        assert_eq!(output(view), "[0] Foo AA:01 -55 dBm connectable: true (updated)\n");
    }

    #[test]
    fn scanning_label_and_notice() {
        let mut view = TerminalView::new(Vec::new(), false);
        view.scanning_changed(true);
        view.notice(&Notice::Disconnected { name: "Foo".to_string() });

        let text = output(view);
        assert!(text.contains(STOP_SCAN_LABEL));
        assert!(text.ends_with("* Disconnected from Foo\n"));
    }

    #[test]
    fn empty_list() {
        let mut view = TerminalView::new(Vec::new(), false);
        view.show_list(&[]);
        assert_eq!(output(view), "No devices found\n");
    }
}
