use crate::controllers::fan::DEFAULT_FAN_THRESHOLD;
use crate::devices::DEFAULT_BAUD_RATE;
use crate::runtime::MIN_TICK_INTERVAL;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Serial port identifiers for each device. An empty string disables that device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceIdentifiers {
    pub screen: String,
    pub bell: String,
    pub strip: String,
    pub fan: String,
}

impl Default for DeviceIdentifiers {
    fn default() -> Self {
        Self {
            screen: "Adafruit Metro".to_string(),
            bell: "Arduino Uno".to_string(),
            strip: "IOUSBHostDevice".to_string(),
            fan: "USB2.0-Serial".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub devices: DeviceIdentifiers,
    pub baud_rate: u32,
    pub tick_interval_ms: u64,
    pub combo_timeout_secs: u64,
    pub fan_threshold: u32,
    pub strip_write_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            devices: DeviceIdentifiers::default(),
            baud_rate: DEFAULT_BAUD_RATE,
            tick_interval_ms: 50,
            combo_timeout_secs: 10,
            fan_threshold: DEFAULT_FAN_THRESHOLD,
            strip_write_delay_ms: 10,
        }
    }
}

impl Config {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms).max(MIN_TICK_INTERVAL)
    }

    pub fn combo_timeout(&self) -> Duration {
        Duration::from_secs(self.combo_timeout_secs)
    }

    pub fn strip_write_delay(&self) -> Duration {
        Duration::from_millis(self.strip_write_delay_ms)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "power-mode") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("power_mode_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => warn!(path = %self.path.display(), error = %e, "ignoring bad config"),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
