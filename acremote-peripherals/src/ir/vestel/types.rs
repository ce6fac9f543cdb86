use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidValue {
    #[error("Temperature value must be within 16 and 36, got {0}")]
    Temperature(i64),
    #[error("{0:?} is not a number")]
    NotANumber(String),
    #[error("Timer value must be within 0 and 24, got {0}")]
    Timer(f64),
    #[error("Mode value must be one of AUTO, COOL, DRY, HEAT, FAN, got {0:?}")]
    Mode(String),
    #[error("Speed value must be one of AUTO, LOW, MID, HIGH, got {0:?}")]
    Speed(String),
}

#[derive(
    Clone,
    Copy,
    Debug,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Auto,
    Cool,
    Dry,
    Heat,
    Fan,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Cool
    }
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Auto => 0,
            Mode::Cool => 32,
            Mode::Dry => 64,
            Mode::Heat => 128,
            Mode::Fan => 192,
        }
    }
}

impl Mode {
    pub fn parse(s: &str) -> Result<Mode, InvalidValue> {
        Mode::from_str(s).map_err(|_| InvalidValue::Mode(s.to_string()))
    }

    /// False for the modes where the unit ignores the setpoint.
    pub fn has_setpoint(&self) -> bool {
        !matches!(self, Mode::Auto | Mode::Fan)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    EnumIter,
    EnumString,
    Display,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Speed {
    Auto,
    Low,
    Mid,
    High,
}

impl Default for Speed {
    fn default() -> Self {
        Speed::High
    }
}

impl From<Speed> for u8 {
    fn from(speed: Speed) -> Self {
        match speed {
            Speed::Auto => 160,
            Speed::Low => 96,
            Speed::Mid => 64,
            Speed::High => 32,
        }
    }
}

impl Speed {
    pub fn parse(s: &str) -> Result<Speed, InvalidValue> {
        Speed::from_str(s).map_err(|_| InvalidValue::Speed(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct VestelTemperature(u8);

impl VestelTemperature {
    pub const MIN: u8 = 16;
    pub const MAX: u8 = 36;

    pub fn celsius(&self) -> u8 {
        self.0
    }

    /// Steps above the minimum, as the frame counts them.
    pub fn ind(&self) -> u8 {
        self.0 - Self::MIN
    }

    pub fn up(&self) -> Option<VestelTemperature> {
        (self.0 < Self::MAX).then(|| VestelTemperature(self.0 + 1))
    }

    pub fn down(&self) -> Option<VestelTemperature> {
        (self.0 > Self::MIN).then(|| VestelTemperature(self.0 - 1))
    }

    pub fn items() -> impl Iterator<Item = VestelTemperature> {
        (Self::MIN..=Self::MAX).map(VestelTemperature)
    }
}

impl Default for VestelTemperature {
    fn default() -> Self {
        VestelTemperature(27)
    }
}

impl TryFrom<i64> for VestelTemperature {
    type Error = InvalidValue;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(VestelTemperature(value as u8))
        } else {
            Err(InvalidValue::Temperature(value))
        }
    }
}

impl FromStr for VestelTemperature {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches("°C").trim_end_matches('°');
        s.parse::<i64>()
            .map_err(|_| InvalidValue::NotANumber(s.to_string()))
            .and_then(VestelTemperature::try_from)
    }
}

impl From<VestelTemperature> for u8 {
    fn from(t: VestelTemperature) -> Self {
        t.0
    }
}

impl fmt::Display for VestelTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.0)
    }
}

/// Off-timer in half hour steps, 0 to 24 hours.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Timer {
    half_hours: u8,
}

impl Timer {
    pub const MAX_HOURS: f64 = 24.0;

    pub fn from_hours(hours: f64) -> Result<Timer, InvalidValue> {
        if !(0.0..=Self::MAX_HOURS).contains(&hours) {
            return Err(InvalidValue::Timer(hours));
        }
        let doubled = hours * 2.0;
        let half_hours = if doubled.fract() == 0.0 {
            doubled
        } else {
            // not on a half hour, keep the whole hours only
            hours.trunc() * 2.0
        };
        half_hours
            .to_u8()
            .map(|half_hours| Timer { half_hours })
            .ok_or(InvalidValue::Timer(hours))
    }

    pub fn hours(&self) -> f64 {
        self.half_hours as f64 / 2.0
    }

    pub fn whole_hours(&self) -> u8 {
        self.half_hours / 2
    }

    pub fn has_half_hour(&self) -> bool {
        self.half_hours % 2 == 1
    }

    pub fn is_set(&self) -> bool {
        self.half_hours != 0
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.hours())
    }
}

/// Dial increment for a timer value: whole hours from 10h up, half hours below.
pub fn timer_step(current: f64) -> f64 {
    if (10.0..24.0).contains(&current) {
        1.0
    } else {
        0.5
    }
}

/// Button ids the remote puts in the last data byte.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Button {
    TempUp,
    TempDown,
    Swing,
    Speed,
    Power,
    Mode,
    Health,
    Strong,
    Sleep,
    Timer,
    Screen,
    Clean,
    Fresh,
    Feeling,
}

impl Default for Button {
    fn default() -> Self {
        Button::TempUp
    }
}

impl From<Button> for u8 {
    fn from(button: Button) -> Self {
        match button {
            Button::TempUp => 0,
            Button::TempDown => 1,
            Button::Swing => 2,
            Button::Speed => 4,
            Button::Power => 5,
            Button::Mode => 6,
            Button::Health => 7,
            Button::Strong => 8,
            Button::Sleep => 11,
            Button::Timer => 13,
            Button::Screen => 21,
            Button::Clean => 25,
            Button::Fresh => 29,
            Button::Feeling => 30,
        }
    }
}
