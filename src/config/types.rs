use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    // position in the list of adapters reported by the host
    pub adapter_index: usize,
    // print every signal strength update, not only new devices
    pub show_updates: bool,
    pub scan_on_start: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            adapter_index: 0,
            show_updates: false,
            scan_on_start: false,
        }
    }
}
