use clap::Parser;
use log::info;
use ble_scan_connect::cli::Cli;
use ble_scan_connect::{init_logging, run};
use ble_scan_connect::error::{AppRunError, ConfigError};

fn main() -> Result<(), AppRunError> {
    let cli = Cli::parse();
    init_logging(cli.log_level());
    info!(concat!("BLE Scan Connect ", env!("CARGO_PKG_VERSION")));

    match run(cli) {
        Err(AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            eprintln!("This application has already been started");
            Ok(())
        },
        Err(err) => {
            eprintln!("Unexpected error: {}", err);
            Err(err)
        },
        Ok(_) => Ok(())
    }
}
