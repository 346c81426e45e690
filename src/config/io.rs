use std::env::{current_exe};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use directories_next::{ProjectDirs};
use tokio::fs::{File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use serde_json;
use fd_lock::{RwLock, RwLockWriteGuard};
use log::{info, warn};
use std::fs::OpenOptions;
use std::str;

use crate::config::types::Config;
use crate::error::ConfigError;

// creates a path to ble-scan-connect.json in the same directory as the executable
// this could be useful for usb sticks
fn get_portable_config_path() -> Option<PathBuf> {
    match current_exe() {
        Ok(mut path) => {
            // F:\ble-scan-connect.exe => F:\ble-scan-connect.json
            if !path.set_extension("json") {
                warn!("current exe has no filename: {}", path.to_string_lossy());
                return None
            }

            Some(path)
        },
        Err(err) => {
            warn!("failed to get current exe path: {:?}", err);
            None
        },
    }
}

// creates a path to ble-scan-connect.json in an os dependent standard directory, such as %AppData%
// on windows.
fn get_local_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "ble-scan-connect", "ble-scan-connect").map(|dirs| {
        dirs.config_dir().join("ble-scan-connect.json")
    })
}

fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = get_portable_config_path() {
        match std::fs::metadata(&path) {
            Ok(attr) => {
                if attr.is_file() {
                    return Ok(path);
                }
            }
            Err(err) => {
                info!("No portable config at {}; Using local path instead. ({})", path.to_string_lossy(), err);
            },
        }
    }

    match get_local_config_path() {
        None => Err(ConfigError::NoConfigPath),
        Some(path) => Ok(path),
    }
}

pub struct ConfigIOLocker {
    rw_lock: RwLock<std::fs::File>,
}

impl ConfigIOLocker {
    /// Only one instance may own the radio, the exclusive lock on the config file enforces this.
    pub fn lock(&mut self) -> Result<RwLockWriteGuard<std::fs::File>, ConfigError> {
        self.rw_lock.try_write().map_err(|source| ConfigError::CanNotLock { source })
    }
}

struct ConfigIOInner {
    file: std::fs::File,
}

#[derive(Clone)]
pub struct ConfigIO {
    inner: Arc<Mutex<ConfigIOInner>>,
}

impl ConfigIO {
    pub fn new_sync() -> Result<Self, ConfigError> {
        let path = get_config_path()?;
        Self::open_sync(path)
    }

    pub fn open_sync(path: PathBuf) -> Result<Self, ConfigError> {
        info!("Using config file {}", path.to_string_lossy());

        if let Some(directory) = path.parent() {
            std::fs::create_dir_all(directory)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .truncate(false)
            .append(false)
            .create(true)
            .open(path)?;

        let inner = ConfigIOInner {
            file,
        };
        Ok(ConfigIO { inner: Arc::new(Mutex::new(inner)) })
    }

    pub fn locker(&mut self) -> Result<ConfigIOLocker, ConfigError> {
        let file = self.clone_file()?;

        Ok(ConfigIOLocker {
            rw_lock: RwLock::new(file),
        })
    }

    fn clone_file(&self) -> Result<std::fs::File, ConfigError> {
        // a poisoned lock still guards a usable file handle
        let inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(inner.file.try_clone()?)
    }

    // The File returned from here should never be closed!
    fn get_file(&self) -> Result<File, ConfigError> {
        Ok(File::from_std(self.clone_file()?))
    }

    /// Reads the config; an empty file (first start) yields the defaults.
    pub async fn read(&self) -> Result<Option<Config>, ConfigError> {
        let mut file = self.get_file()?;
        info!("Reading config file");

        let mut content = vec![];
        file.rewind().await?;
        file.read_to_end(&mut content).await?;

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let content = str::from_utf8(&content)?;
        let config: Config = serde_json::from_str(content)?;
        Ok(Some(config))
    }

    pub async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let mut file = self.get_file()?;
        info!("Saving config");

        let content = serde_json::to_string_pretty(config)?;
        file.rewind().await?;
        file.set_len(0).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Reads the config, writing the defaults back if the file was empty.
    pub async fn load_or_init(&self) -> Result<Config, ConfigError> {
        match self.read().await? {
            Some(config) => Ok(config),
            None => {
                info!("Config file is empty, writing defaults");
                let config = Config::default();
                self.save(&config).await?;
                Ok(config)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ble-scan-connect-test-{}-{}", name, std::process::id()));
        dir.join("config.json")
    }

    #[tokio::test]
    async fn empty_file_is_initialized_with_defaults() {
        let path = temp_config_path("init");
        let _ = std::fs::remove_file(&path);
        let config_io = ConfigIO::open_sync(path.clone()).unwrap();

        assert_eq!(config_io.read().await.unwrap(), None);
        assert_eq!(config_io.load_or_init().await.unwrap(), Config::default());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"adapterIndex\""));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn save_replaces_previous_content() {
        let path = temp_config_path("save");
        let _ = std::fs::remove_file(&path);
        let config_io = ConfigIO::open_sync(path.clone()).unwrap();

        let long = Config { adapter_index: 12345, show_updates: true, scan_on_start: true };
        config_io.save(&long).await.unwrap();

        let short = Config::default();
        config_io.save(&short).await.unwrap();

        assert_eq!(config_io.read().await.unwrap(), Some(short));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn invalid_json_is_reported() {
        let path = temp_config_path("invalid");
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(&path, "{ not json").unwrap();

        let config_io = ConfigIO::open_sync(path.clone()).unwrap();
        assert!(matches!(config_io.read().await, Err(ConfigError::JsonError { .. })));
        let _ = std::fs::remove_file(&path);
    }
}
