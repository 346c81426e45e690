use std::time::Duration;
use futures::SinkExt;
use log::{error, info, warn};
use tokio::spawn;
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;
use crate::config::io::ConfigIO;
use crate::config::types::Config;
use crate::device::controller::ScanController;
use crate::device::runner::{core_channel, run_core};
use crate::device::types::{CoreEvent, UserCommand};
use crate::error::AppRunError;
use crate::radio::BtleRadio;
use crate::term::input::{input_task, HELP};
use crate::term::view::TerminalView;

// stdin is read on a blocking thread that can not be interrupted
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

async fn load_config(config_io: &ConfigIO) -> Config {
    match config_io.load_or_init().await {
        Ok(config) => config,
        Err(err) => {
            error!("Failed to load config, using defaults: {}", err);
            Config::default()
        },
    }
}

async fn run_session(config: Config) {
    let cancel = CancellationToken::new();
    let (mut sender, receiver) = core_channel();

    let (radio, radio_handle) = BtleRadio::open(config.adapter_index, cancel.clone(), sender.clone()).await;
    let view = TerminalView::new(std::io::stdout(), config.show_updates);
    let controller = ScanController::new(radio, view);

    println!("{}", HELP);

    if config.scan_on_start {
        if let Err(err) = sender.send(CoreEvent::Command(UserCommand::ToggleScan)).await {
            warn!("Failed to start scanning: {:?}", err);
        }
    }

    let input_handle = input_task(cancel.clone(), sender);
    let core_handle = spawn(run_core(controller, receiver, cancel.clone()));

    tokio::select! {
        _ = cancel.cancelled() => {},
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                warn!("Failed to listen for ctrl-c: {:?}", err);
            }
            info!("Interrupted");
            cancel.cancel();
        },
    }

    match core_handle.await {
        // dropping the controller drops the last command sender of the radio worker
        Ok(controller) => drop(controller),
        Err(err) => error!("Core task failed: {:?}", err),
    }

    if let Some(handle) = radio_handle {
        info!("Waiting for the radio to stop");
        if let Err(err) = handle.await {
            error!("Radio task failed: {:?}", err);
        }
    }

    drop(input_handle);
}

pub fn run_application(cli: Cli) -> Result<(), AppRunError> {
    let mut config_io = match &cli.config {
        Some(path) => ConfigIO::open_sync(path.clone())?,
        None => ConfigIO::new_sync()?,
    };
    let mut config_locker = config_io.locker()?;
    let _lock_guard = config_locker.lock()?;

    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let config = cli.apply(load_config(&config_io).await);
        info!("Config: {:?}", config);
        run_session(config).await;
    });

    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    Ok(())
}
