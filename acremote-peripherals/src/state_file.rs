use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ir::vestel::state::AcState;
use crate::ir::vestel::types::{Mode, Speed};

pub const VERSION: u64 = 1;

/// Keys written to and read from the file, in the order they are applied.
pub const PERSISTED_FIELDS: [&str; 13] = [
    "on", "mode", "speed", "temp", "swing", "health", "strong", "sleep", "screen", "clean",
    "fresh", "feeling", "timer",
];

#[derive(Error, Debug)]
pub enum StateFileError {
    #[error("Could not access state file {0}")]
    Io(PathBuf, #[source] io::Error),
    #[error("State file is not valid json")]
    Json(#[from] serde_json::Error),
    #[error("State file does not hold a json object")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, StateFileError>;

#[derive(Serialize)]
struct Snapshot {
    version: u64,
    on: bool,
    mode: Mode,
    speed: Speed,
    temp: u8,
    swing: bool,
    health: bool,
    strong: bool,
    sleep: bool,
    screen: bool,
    clean: bool,
    fresh: bool,
    feeling: bool,
    timer: f64,
}

impl From<&AcState> for Snapshot {
    fn from(state: &AcState) -> Self {
        Snapshot {
            version: VERSION,
            on: state.power(),
            mode: state.mode(),
            speed: state.speed(),
            temp: state.temperature().celsius(),
            swing: state.swing(),
            health: state.health(),
            strong: state.strong(),
            sleep: state.sleep(),
            screen: state.screen(),
            clean: state.clean(),
            fresh: state.fresh(),
            feeling: state.feeling(),
            timer: state.timer().hours(),
        }
    }
}

pub fn snapshot(state: &AcState) -> Result<Map<String, Value>> {
    match serde_json::to_value(Snapshot::from(state))? {
        Value::Object(map) => Ok(map),
        _ => Err(StateFileError::NotAnObject),
    }
}

fn apply_field(state: &mut AcState, name: &str, value: &Value) -> bool {
    match name {
        "on" => value.as_bool().map(|v| state.set_power(v)).is_some(),
        "mode" => serde_json::from_value::<Mode>(value.clone())
            .map(|v| state.set_mode(v))
            .is_ok(),
        "speed" => serde_json::from_value::<Speed>(value.clone())
            .map(|v| state.set_speed(v))
            .is_ok(),
        "temp" => value
            .as_i64()
            .map_or(false, |v| state.set_temperature(v).is_ok()),
        "timer" => value
            .as_f64()
            .map_or(false, |v| state.set_timer(v).is_ok()),
        "swing" => value.as_bool().map(|v| state.set_swing(v)).is_some(),
        "health" => value.as_bool().map(|v| state.set_health(v)).is_some(),
        "strong" => value.as_bool().map(|v| state.set_strong(v)).is_some(),
        "sleep" => value.as_bool().map(|v| state.set_sleep(v)).is_some(),
        "screen" => value.as_bool().map(|v| state.set_screen(v)).is_some(),
        "clean" => value.as_bool().map(|v| state.set_clean(v)).is_some(),
        "fresh" => value.as_bool().map(|v| state.set_fresh(v)).is_some(),
        "feeling" => value.as_bool().map(|v| state.set_feeling(v)).is_some(),
        _ => false,
    }
}

/// Seeds `state` through its setters. Unknown keys and values a setter
/// rejects are skipped.
pub fn apply_fields(state: &mut AcState, fields: &Map<String, Value>) {
    for name in PERSISTED_FIELDS {
        if let Some(value) = fields.get(name) {
            if !apply_field(state, name, value) {
                debug!("skipping stored {} = {}", name, value);
            }
        }
    }
    for key in fields.keys() {
        if key != "version" && !PERSISTED_FIELDS.contains(&key.as_str()) {
            trace!("ignoring unknown state key {}", key);
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new<P: AsRef<Path>>(path: P) -> StateFile {
        StateFile {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Defaults when the file does not exist yet.
    pub fn load(&self) -> Result<AcState> {
        let mut state = AcState::default();
        if !self.path.is_file() {
            info!("no state file at {:?}, starting from defaults", self.path);
            return Ok(state);
        }
        let contents =
            fs::read_to_string(&self.path).map_err(|e| StateFileError::Io(self.path.clone(), e))?;
        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(fields) => {
                apply_fields(&mut state, &fields);
                info!("loaded state from {:?}", self.path);
                Ok(state)
            }
            _ => Err(StateFileError::NotAnObject),
        }
    }

    pub fn save(&self, state: &AcState) -> Result<()> {
        let contents = serde_json::to_string(&Value::Object(snapshot(state)?))?;
        fs::write(&self.path, contents).map_err(|e| StateFileError::Io(self.path.clone(), e))?;
        trace!("saved state to {:?}", self.path);
        Ok(())
    }
}
