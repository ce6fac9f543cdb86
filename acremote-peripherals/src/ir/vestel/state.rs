use std::convert::TryFrom;

use crate::ir::vestel::types::{Button, InvalidValue, Mode, Speed, Timer, VestelTemperature};

pub fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

/// Logical settings of the unit, as the factory remote tracks them.
///
/// Every field goes through a setter so the cross-field rules hold between
/// button presses: AUTO mode pins the fan speed to AUTO, and the clean cycle
/// can never be active while the unit is powered.
#[derive(Clone, Debug, PartialEq)]
pub struct AcState {
    power: bool,
    mode: Mode,
    speed: Speed,
    temperature: VestelTemperature,
    swing: bool,
    health: bool,
    strong: bool,
    sleep: bool,
    screen: bool,
    clean: bool,
    fresh: bool,
    feeling: bool,
    timer: Timer,
    last_button: Button,
}

impl Default for AcState {
    fn default() -> Self {
        AcState {
            power: false,
            mode: Mode::default(),
            speed: Speed::default(),
            temperature: VestelTemperature::default(),
            swing: true,
            health: false,
            strong: false,
            sleep: false,
            screen: true,
            clean: false,
            fresh: false,
            feeling: false,
            timer: Timer::default(),
            last_button: Button::default(),
        }
    }
}

impl AcState {
    pub fn power(&self) -> bool {
        self.power
    }

    pub fn set_power(&mut self, power: bool) {
        if power {
            self.clean = false;
        }
        self.power = power;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode == Mode::Auto {
            self.speed = Speed::Auto;
        }
        self.mode = mode;
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = if self.mode == Mode::Auto {
            Speed::Auto
        } else {
            speed
        };
    }

    pub fn temperature(&self) -> VestelTemperature {
        self.temperature
    }

    pub fn set_temperature(&mut self, celsius: i64) -> Result<(), InvalidValue> {
        self.temperature = VestelTemperature::try_from(celsius)?;
        Ok(())
    }

    /// One degree up, stopping at the maximum. Returns whether it moved.
    pub fn temperature_up(&mut self) -> bool {
        match self.temperature.up() {
            Some(t) => {
                self.temperature = t;
                true
            }
            None => false,
        }
    }

    /// One degree down, stopping at the minimum. Returns whether it moved.
    pub fn temperature_down(&mut self) -> bool {
        match self.temperature.down() {
            Some(t) => {
                self.temperature = t;
                true
            }
            None => false,
        }
    }

    pub fn swing(&self) -> bool {
        self.swing
    }

    pub fn set_swing(&mut self, swing: bool) {
        self.swing = swing;
    }

    pub fn health(&self) -> bool {
        self.health
    }

    pub fn set_health(&mut self, health: bool) {
        self.health = health;
    }

    pub fn strong(&self) -> bool {
        self.strong
    }

    pub fn set_strong(&mut self, strong: bool) {
        self.strong = strong;
    }

    pub fn sleep(&self) -> bool {
        self.sleep
    }

    pub fn set_sleep(&mut self, sleep: bool) {
        self.sleep = sleep;
    }

    pub fn screen(&self) -> bool {
        self.screen
    }

    pub fn set_screen(&mut self, screen: bool) {
        self.screen = screen;
    }

    pub fn clean(&self) -> bool {
        self.clean
    }

    /// Ignored while powered; the unit only runs a clean cycle when off.
    pub fn set_clean(&mut self, clean: bool) {
        if clean && self.power {
            debug!("ignoring clean while the unit is powered");
            return;
        }
        self.clean = clean;
    }

    pub fn fresh(&self) -> bool {
        self.fresh
    }

    pub fn set_fresh(&mut self, fresh: bool) {
        self.fresh = fresh;
    }

    pub fn feeling(&self) -> bool {
        self.feeling
    }

    pub fn set_feeling(&mut self, feeling: bool) {
        self.feeling = feeling;
    }

    pub fn timer(&self) -> Timer {
        self.timer
    }

    /// Off-grid values keep their whole hours; out of range values clear the
    /// timer and are reported.
    pub fn set_timer(&mut self, hours: f64) -> Result<(), InvalidValue> {
        match Timer::from_hours(hours) {
            Ok(timer) => {
                self.timer = timer;
                Ok(())
            }
            Err(e) => {
                self.timer = Timer::default();
                Err(e)
            }
        }
    }

    /// Label and value pairs in the order a status report lists them.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Power", on_off(self.power).to_string()),
            ("Mode", self.mode.to_string()),
            ("Temperature", self.temperature.to_string()),
            ("Speed", self.speed.to_string()),
            ("Timer", self.timer.to_string()),
            ("Strong", on_off(self.strong).to_string()),
            ("Swing", on_off(self.swing).to_string()),
            ("Sleep", on_off(self.sleep).to_string()),
            ("Health", on_off(self.health).to_string()),
            ("Fresh", on_off(self.fresh).to_string()),
            ("Feeling", on_off(self.feeling).to_string()),
            ("Screen", on_off(self.screen).to_string()),
            ("Clean", on_off(self.clean).to_string()),
        ]
    }

    pub fn last_button(&self) -> Button {
        self.last_button
    }

    pub fn set_last_button(&mut self, button: Button) {
        self.last_button = button;
    }
}
