use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG: &str = "/etc/acremote.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not access config file {0}")]
    Io(PathBuf, #[source] io::Error),
    #[error("Invalid config file")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn default_gpio_pin() -> u8 {
    13
}

fn default_state_file() -> PathBuf {
    PathBuf::from("/var/lib/acremote/state.json")
}

fn default_w1_base() -> PathBuf {
    PathBuf::from("/sys/bus/w1/devices")
}

fn default_cooldown_secs() -> u64 {
    20
}

fn default_fungus_proof_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(alias = "bot_token")]
    pub token: String,
    #[serde(default = "default_gpio_pin")]
    pub gpio_pin: u8,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_w1_base")]
    pub w1_base: PathBuf,
    #[serde(default)]
    pub admin_ids: Vec<u64>,
    #[serde(default)]
    pub user_ids: Vec<u64>,
    /// Lower case message text to canned reply.
    #[serde(default)]
    pub easter_eggs: HashMap<String, String>,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_fungus_proof_delay_ms")]
    pub fungus_proof_delay_ms: u64,
    /// Log frames instead of driving the ir led.
    #[serde(default)]
    pub dry_run: bool,
}

impl Config {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn fungus_proof_delay(&self) -> Duration {
        Duration::from_millis(self.fungus_proof_delay_ms)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigHandler {
    path: PathBuf,
}

impl Default for ConfigHandler {
    fn default() -> Self {
        ConfigHandler::new(DEFAULT_CONFIG)
    }
}

impl ConfigHandler {
    pub fn new<P: AsRef<Path>>(path: P) -> ConfigHandler {
        ConfigHandler {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn read(&self) -> Result<Config> {
        let contents =
            fs::read_to_string(&self.path).map_err(|e| ConfigError::Io(self.path.clone(), e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The file holds the bot token, so only the owner may read it back.
    pub fn write(&self, config: &Config) -> Result<()> {
        let contents = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, contents).map_err(|e| ConfigError::Io(self.path.clone(), e))?;
        fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
            .map_err(|e| ConfigError::Io(self.path.clone(), e))
    }
}
