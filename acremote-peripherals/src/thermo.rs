use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use thiserror::Error;

const W1_DEVICES: &str = "/sys/bus/w1/devices";
/// Family code of the DS18B20.
const DS18B20_PREFIX: &str = "28";

const READ_ATTEMPTS: usize = 5;
const RETRY_WAIT: Duration = Duration::from_millis(200);

#[derive(Error, Debug)]
pub enum ThermoError {
    #[error("No thermometer attached")]
    NoDevice,
    #[error("Could not read {0}")]
    Read(PathBuf, #[source] io::Error),
    #[error("Thermometer {0} kept failing its crc check")]
    Crc(String),
    #[error("Could not parse thermometer output {0:?}")]
    Parse(String),
    #[error("Thermometer returned {0}")]
    NotFinite(f32),
}

pub type Result<T> = std::result::Result<T, ThermoError>;

pub trait Thermometer {
    fn read_current_temperature(&self) -> Result<f32>;
}

impl<T: Thermometer + ?Sized> Thermometer for &T {
    fn read_current_temperature(&self) -> Result<f32> {
        (**self).read_current_temperature()
    }
}

impl<T: Thermometer + ?Sized> Thermometer for Box<T> {
    fn read_current_temperature(&self) -> Result<f32> {
        (**self).read_current_temperature()
    }
}

/// Stand-in when no sensor is wired; every read fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoThermometer;

impl Thermometer for NoThermometer {
    fn read_current_temperature(&self) -> Result<f32> {
        Err(ThermoError::NoDevice)
    }
}

/// DS18B20 sensors exposed by the w1-therm kernel driver.
#[derive(Debug, Clone)]
pub struct W1Thermo {
    base: PathBuf,
    devices: Vec<String>,
}

impl W1Thermo {
    pub fn new<P: AsRef<Path>>(base: P) -> Result<W1Thermo> {
        let base = base.as_ref().to_path_buf();
        let mut devices: Vec<String> = fs::read_dir(&base)
            .map_err(|e| ThermoError::Read(base.clone(), e))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(DS18B20_PREFIX))
            .collect();
        devices.sort();
        info!("found {} 1-wire thermometer(s) in {:?}", devices.len(), base);
        Ok(W1Thermo { base, devices })
    }

    pub fn default_base() -> Result<W1Thermo> {
        Self::new(W1_DEVICES)
    }

    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    fn read_slave(&self, device: &str) -> Result<String> {
        let path = self.base.join(device).join("w1_slave");
        fs::read_to_string(&path).map_err(|e| ThermoError::Read(path, e))
    }

    /// Reads one device, retrying while the driver reports a bad crc.
    pub fn poll(&self, device: &str) -> Result<f32> {
        for attempt in 0..READ_ATTEMPTS {
            let output = self.read_slave(device)?;
            match parse_w1_slave(&output)? {
                Some(celsius) => {
                    trace!("thermometer {} read {}", device, celsius);
                    return Ok(celsius);
                }
                None => {
                    debug!("crc check failed on {} (attempt {})", device, attempt + 1);
                    sleep(RETRY_WAIT);
                }
            }
        }
        Err(ThermoError::Crc(device.to_string()))
    }
}

impl Thermometer for W1Thermo {
    fn read_current_temperature(&self) -> Result<f32> {
        let device = self.devices.first().ok_or(ThermoError::NoDevice)?;
        self.poll(device)
    }
}

/// `None` when the crc line does not end in YES.
fn parse_w1_slave(output: &str) -> Result<Option<f32>> {
    let mut lines = output.lines().map(str::trim);
    let crc = lines
        .next()
        .ok_or_else(|| ThermoError::Parse(output.to_string()))?;
    if !crc.ends_with("YES") {
        return Ok(None);
    }
    let milli = lines
        .next()
        .and_then(|line| line.split_once("t="))
        .and_then(|(_, value)| value.parse::<i32>().ok())
        .ok_or_else(|| ThermoError::Parse(output.to_string()))?;
    Ok(Some(milli as f32 / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";
    const BAD_CRC: &str = "72 01 4b 46 7f ff 0e 10 57 : crc=57 NO\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";

    #[test]
    fn parses_milli_celsius() {
        assert_eq!(parse_w1_slave(GOOD).unwrap(), Some(23.125));
        let freezing = "00 ff : crc=a1 YES\n00 ff t=-1500\n";
        assert_eq!(parse_w1_slave(freezing).unwrap(), Some(-1.5));
    }

    #[test]
    fn bad_crc_means_retry() {
        assert_eq!(parse_w1_slave(BAD_CRC).unwrap(), None);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            parse_w1_slave("crc=00 YES\nnothing here"),
            Err(ThermoError::Parse(_))
        ));
        assert!(matches!(parse_w1_slave(""), Err(ThermoError::Parse(_))));
    }

    #[test]
    fn reads_first_device_from_directory() {
        let base = std::env::temp_dir().join(format!("acremote-w1-{}", std::process::id()));
        let device = base.join("28-0000075a1b2c");
        fs::create_dir_all(&device).unwrap();
        fs::create_dir_all(base.join("w1_bus_master1")).unwrap();
        fs::write(device.join("w1_slave"), GOOD).unwrap();

        let thermo = W1Thermo::new(&base).unwrap();
        assert_eq!(thermo.devices(), &["28-0000075a1b2c".to_string()]);
        assert_eq!(thermo.read_current_temperature().unwrap(), 23.125);

        fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn no_devices_is_reported() {
        assert!(matches!(
            NoThermometer.read_current_temperature(),
            Err(ThermoError::NoDevice)
        ));
    }
}
