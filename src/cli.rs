use std::path::PathBuf;
use clap::Parser;

use crate::config::types::Config;

/// Scan for nearby Bluetooth Low Energy devices and connect to one of them.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Use this config file instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Position of the bluetooth adapter to use (overrides the config file)
    #[arg(long)]
    pub adapter: Option<usize>,

    /// Start scanning right away
    #[arg(long)]
    pub scan: bool,

    /// Print every signal strength update
    #[arg(long)]
    pub show_updates: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info }
    }

    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(adapter) = self.adapter {
            config.adapter_index = adapter;
        }
        config.scan_on_start |= self.scan;
        config.show_updates |= self.show_updates;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["ble-scan-connect", "--adapter", "1", "--scan"]);
        let config = cli.apply(Config::default());

        assert_eq!(config.adapter_index, 1);
        assert!(config.scan_on_start);
        assert!(!config.show_updates);
        assert_eq!(cli.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn config_is_kept_without_flags() {
        let cli = Cli::parse_from(["ble-scan-connect", "-v"]);
        let stored = Config { adapter_index: 2, show_updates: true, scan_on_start: false };

        assert_eq!(cli.apply(stored.clone()), stored);
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);
    }
}
