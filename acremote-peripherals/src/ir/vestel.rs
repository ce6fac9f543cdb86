pub mod frame;
pub mod state;
pub mod types;

use std::error::Error as StdError;
use std::thread::sleep;
use std::time::Duration;

use thiserror::Error;

use crate::ir::types::Transmitter;
use crate::ir::vestel::frame::VestelFrame;
use crate::ir::vestel::state::AcState;
use crate::ir::vestel::types::{Button, InvalidValue, Mode, Speed};
use crate::thermo::{ThermoError, Thermometer};

/// Pause between the power presses of the fungus-proof cycle.
pub const FUNGUS_PROOF_DELAY: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum VestelError {
    #[error(transparent)]
    InvalidValue(#[from] InvalidValue),
    #[error("Could not read the room temperature")]
    SensorUnavailable(#[source] ThermoError),
    #[error("Could not transmit frame")]
    TransmitFailure(#[source] Box<dyn StdError + Send + Sync>),
    #[error("Could not pack frame")]
    Packing(#[from] packed_struct::PackingError),
}

pub type Result<T> = std::result::Result<T, VestelError>;

/// What a button press ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Transmitted(VestelFrame),
    /// The unit is in the wrong power state for this button.
    Skipped,
}

impl Outcome {
    pub fn transmitted(&self) -> bool {
        matches!(self, Outcome::Transmitted(_))
    }
}

/// The remote control itself: owns the settings, turns button presses into
/// frames and hands them to the transmitter.
pub struct VestelRemote<T: Transmitter, S: Thermometer> {
    state: AcState,
    transmitter: T,
    thermometer: S,
    fungus_proof_delay: Duration,
}

impl<T: Transmitter, S: Thermometer> VestelRemote<T, S> {
    pub fn new(transmitter: T, thermometer: S) -> Self {
        Self::with_state(AcState::default(), transmitter, thermometer)
    }

    pub fn with_state(state: AcState, transmitter: T, thermometer: S) -> Self {
        VestelRemote {
            state,
            transmitter,
            thermometer,
            fungus_proof_delay: FUNGUS_PROOF_DELAY,
        }
    }

    pub fn set_fungus_proof_delay(&mut self, delay: Duration) {
        self.fungus_proof_delay = delay;
    }

    pub fn state(&self) -> &AcState {
        &self.state
    }

    pub fn thermometer(&self) -> &S {
        &self.thermometer
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    /// Runs `change` on a copy of the state, then encodes and transmits it.
    /// The copy only replaces the current state once the frame went out, so
    /// a failed press leaves everything as it was.
    fn press<F>(&mut self, button: Button, change: F) -> Result<Outcome>
    where
        F: FnOnce(&mut AcState) -> Result<()>,
    {
        let mut next = self.state.clone();
        change(&mut next)?;
        next.set_last_button(button);
        let frame = VestelFrame::encode(&next, &self.thermometer)?;
        let bits = frame.to_bits();
        debug!("{} pressed, sending {}", button, bits);
        self.transmitter
            .transmit(&bits)
            .map_err(|e| VestelError::TransmitFailure(Box::new(e)))?;
        self.state = next;
        Ok(Outcome::Transmitted(frame))
    }

    fn press_when_on<F>(&mut self, button: Button, change: F) -> Result<Outcome>
    where
        F: FnOnce(&mut AcState) -> Result<()>,
    {
        if self.state.power() {
            self.press(button, change)
        } else {
            trace!("{} ignored while off", button);
            Ok(Outcome::Skipped)
        }
    }

    pub fn temp_up(&mut self) -> Result<Outcome> {
        if self.state.power() {
            self.press(Button::TempUp, |s| {
                s.temperature_up();
                Ok(())
            })
        } else {
            self.state.temperature_up();
            Ok(Outcome::Skipped)
        }
    }

    pub fn temp_down(&mut self) -> Result<Outcome> {
        if self.state.power() {
            self.press(Button::TempDown, |s| {
                s.temperature_down();
                Ok(())
            })
        } else {
            self.state.temperature_down();
            Ok(Outcome::Skipped)
        }
    }

    /// Absolute setpoint; turns the unit on.
    pub fn temp_set(&mut self, celsius: i64) -> Result<Outcome> {
        self.press(Button::Power, |s| {
            s.set_temperature(celsius)?;
            s.set_power(true);
            Ok(())
        })
    }

    pub fn swing(&mut self) -> Result<Outcome> {
        self.press_when_on(Button::Swing, |s| {
            s.set_swing(!s.swing());
            Ok(())
        })
    }

    pub fn speed_set(&mut self, speed: Speed) -> Result<Outcome> {
        self.press_when_on(Button::Speed, |s| {
            s.set_speed(speed);
            Ok(())
        })
    }

    pub fn power_toggle(&mut self) -> Result<Outcome> {
        self.press(Button::Power, |s| {
            s.set_power(!s.power());
            Ok(())
        })
    }

    /// Sends an "on" frame whatever the remembered power state is.
    pub fn power_on(&mut self) -> Result<Outcome> {
        self.press(Button::Power, |s| {
            s.set_power(true);
            Ok(())
        })
    }

    /// Sends an "off" frame whatever the remembered power state is.
    pub fn power_off(&mut self) -> Result<Outcome> {
        self.press(Button::Power, |s| {
            s.set_power(false);
            Ok(())
        })
    }

    pub fn mode_set(&mut self, mode: Mode) -> Result<Outcome> {
        self.press_when_on(Button::Mode, |s| {
            s.set_mode(mode);
            Ok(())
        })
    }

    pub fn health(&mut self) -> Result<Outcome> {
        self.press_when_on(Button::Health, |s| {
            s.set_health(!s.health());
            Ok(())
        })
    }

    pub fn strong(&mut self) -> Result<Outcome> {
        self.press_when_on(Button::Strong, |s| {
            s.set_strong(!s.strong());
            Ok(())
        })
    }

    pub fn sleep(&mut self) -> Result<Outcome> {
        self.press_when_on(Button::Sleep, |s| {
            s.set_sleep(!s.sleep());
            Ok(())
        })
    }

    pub fn timer_set(&mut self, hours: f64) -> Result<Outcome> {
        self.press_when_on(Button::Timer, |s| Ok(s.set_timer(hours)?))
    }

    pub fn screen(&mut self) -> Result<Outcome> {
        self.press_when_on(Button::Screen, |s| {
            s.set_screen(!s.screen());
            Ok(())
        })
    }

    /// Only while off; the unit refuses a clean cycle while running.
    pub fn clean(&mut self) -> Result<Outcome> {
        if self.state.power() {
            trace!("clean ignored while on");
            return Ok(Outcome::Skipped);
        }
        self.press(Button::Clean, |s| {
            s.set_clean(!s.clean());
            Ok(())
        })
    }

    pub fn fresh(&mut self) -> Result<Outcome> {
        self.press_when_on(Button::Fresh, |s| {
            s.set_fresh(!s.fresh());
            Ok(())
        })
    }

    pub fn feeling(&mut self) -> Result<Outcome> {
        self.press_when_on(Button::Feeling, |s| {
            s.set_feeling(!s.feeling());
            Ok(())
        })
    }

    /// Three power presses a fixed delay apart, starting from off and
    /// leaving the unit on. Blocks for the whole cycle.
    pub fn fungus_proof(&mut self) -> Result<Vec<Outcome>> {
        if self.state.power() {
            trace!("fungus proof ignored while on");
            return Ok(vec![Outcome::Skipped]);
        }
        info!("starting fungus proof cycle");
        let mut outcomes = Vec::with_capacity(3);
        for press in 0..3 {
            if press > 0 {
                sleep(self.fungus_proof_delay);
            }
            outcomes.push(self.power_toggle()?);
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::thermo::NoThermometer;

    #[derive(Error, Debug)]
    #[error("led unplugged")]
    struct Unplugged;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<String>,
        fail: bool,
    }

    impl Transmitter for Recorder {
        type Error = Unplugged;

        fn transmit(&mut self, bits: &str) -> std::result::Result<(), Self::Error> {
            if self.fail {
                return Err(Unplugged);
            }
            self.sent.push(bits.to_string());
            Ok(())
        }
    }

    struct Room(Cell<Option<f32>>);

    impl Thermometer for Room {
        fn read_current_temperature(&self) -> std::result::Result<f32, ThermoError> {
            self.0.get().ok_or(ThermoError::NoDevice)
        }
    }

    fn remote() -> VestelRemote<Recorder, NoThermometer> {
        let mut remote = VestelRemote::new(Recorder::default(), NoThermometer);
        remote.set_fungus_proof_delay(Duration::from_millis(1));
        remote
    }

    fn powered() -> VestelRemote<Recorder, NoThermometer> {
        let mut remote = remote();
        remote.power_on().unwrap();
        remote
    }

    fn last_frame(remote: &VestelRemote<Recorder, NoThermometer>) -> Vec<u8> {
        let bits = remote.transmitter().sent.last().unwrap();
        bits.as_bytes()
            .chunks(8)
            .map(|octet| {
                octet
                    .iter()
                    .rev()
                    .fold(0u8, |acc, bit| (acc << 1) | (*bit - b'0'))
            })
            .collect()
    }

    #[test]
    fn on_only_buttons_are_ignored_while_off() {
        let mut remote = remote();
        let before = remote.state().clone();
        assert_eq!(remote.swing().unwrap(), Outcome::Skipped);
        assert_eq!(remote.speed_set(Speed::Low).unwrap(), Outcome::Skipped);
        assert_eq!(remote.mode_set(Mode::Heat).unwrap(), Outcome::Skipped);
        assert_eq!(remote.health().unwrap(), Outcome::Skipped);
        assert_eq!(remote.strong().unwrap(), Outcome::Skipped);
        assert_eq!(remote.sleep().unwrap(), Outcome::Skipped);
        assert_eq!(remote.screen().unwrap(), Outcome::Skipped);
        assert_eq!(remote.fresh().unwrap(), Outcome::Skipped);
        assert_eq!(remote.feeling().unwrap(), Outcome::Skipped);
        assert_eq!(remote.timer_set(2.0).unwrap(), Outcome::Skipped);
        assert_eq!(remote.state(), &before);
        assert!(remote.transmitter().sent.is_empty());
    }

    #[test]
    fn toggles_stamp_their_button_id() {
        let mut remote = powered();
        assert!(remote.swing().unwrap().transmitted());
        assert_eq!(last_frame(&remote)[11], 2);
        remote.health().unwrap();
        assert_eq!(last_frame(&remote)[11], 7);
        remote.strong().unwrap();
        assert_eq!(last_frame(&remote)[11], 8);
        remote.sleep().unwrap();
        assert_eq!(last_frame(&remote)[11], 11);
        remote.screen().unwrap();
        assert_eq!(last_frame(&remote)[11], 21);
        remote.fresh().unwrap();
        assert_eq!(last_frame(&remote)[11], 29);
        remote.temp_up().unwrap();
        assert_eq!(last_frame(&remote)[11], 0);
        remote.temp_down().unwrap();
        assert_eq!(last_frame(&remote)[11], 1);

        assert!(!remote.state().swing());
        assert!(remote.state().health());
        assert!(remote.state().strong());
        assert!(remote.state().sleep());
        assert!(!remote.state().screen());
        assert!(remote.state().fresh());
    }

    #[test]
    fn mode_speed_and_timer_buttons() {
        let mut remote = powered();
        remote.mode_set(Mode::Heat).unwrap();
        assert_eq!(last_frame(&remote)[11], 6);
        assert_eq!(last_frame(&remote)[6], 128);

        remote.speed_set(Speed::Mid).unwrap();
        assert_eq!(last_frame(&remote)[11], 4);
        assert_eq!(remote.state().speed(), Speed::Mid);

        remote.timer_set(1.5).unwrap();
        assert_eq!(last_frame(&remote)[11], 13);
        assert_eq!(last_frame(&remote)[4], 64 + 1);
        assert_eq!(last_frame(&remote)[5], 30);

        remote.mode_set(Mode::Auto).unwrap();
        assert_eq!(remote.state().speed(), Speed::Auto);
    }

    #[test]
    fn temperature_steps_while_off_are_remembered_but_not_sent() {
        let mut remote = remote();
        assert_eq!(remote.temp_up().unwrap(), Outcome::Skipped);
        assert_eq!(remote.state().temperature().celsius(), 28);
        assert_eq!(remote.temp_down().unwrap(), Outcome::Skipped);
        assert_eq!(remote.temp_down().unwrap(), Outcome::Skipped);
        assert_eq!(remote.state().temperature().celsius(), 26);
        assert!(remote.transmitter().sent.is_empty());
    }

    #[test]
    fn temp_set_turns_the_unit_on() {
        let mut remote = remote();
        assert!(remote.temp_set(22).unwrap().transmitted());
        assert!(remote.state().power());
        assert_eq!(remote.state().temperature().celsius(), 22);
        let frame = last_frame(&remote);
        assert_eq!(frame[11], 5);
        assert_eq!(frame[9], 32);
        assert_eq!(frame[1], 64 + 6 * 8);
    }

    #[test]
    fn invalid_temp_set_changes_nothing() {
        let mut remote = remote();
        assert!(matches!(
            remote.temp_set(37),
            Err(VestelError::InvalidValue(InvalidValue::Temperature(37)))
        ));
        assert!(!remote.state().power());
        assert_eq!(remote.state().temperature().celsius(), 27);
        assert!(remote.transmitter().sent.is_empty());
    }

    #[test]
    fn invalid_timer_is_not_sent() {
        let mut remote = powered();
        remote.timer_set(4.0).unwrap();
        let sent = remote.transmitter().sent.len();
        assert!(remote.timer_set(30.0).is_err());
        assert_eq!(remote.transmitter().sent.len(), sent);
        assert_eq!(remote.state().timer().hours(), 4.0);
    }

    #[test]
    fn power_toggle_flips_and_clears_clean() {
        let mut remote = remote();
        assert!(remote.clean().unwrap().transmitted());
        assert!(remote.state().clean());
        assert_eq!(last_frame(&remote)[9], 4);
        assert_eq!(last_frame(&remote)[11], 25);

        remote.power_toggle().unwrap();
        assert!(remote.state().power());
        assert!(!remote.state().clean());
        assert_eq!(remote.clean().unwrap(), Outcome::Skipped);

        remote.power_toggle().unwrap();
        assert!(!remote.state().power());
        assert_eq!(last_frame(&remote)[9], 0);
    }

    #[test]
    fn virtual_power_buttons_always_send() {
        let mut remote = powered();
        remote.power_on().unwrap();
        assert!(remote.state().power());
        assert_eq!(remote.transmitter().sent.len(), 2);
        remote.power_off().unwrap();
        remote.power_off().unwrap();
        assert!(!remote.state().power());
        assert_eq!(remote.transmitter().sent.len(), 4);
    }

    #[test]
    fn fungus_proof_presses_power_three_times() {
        let mut remote = remote();
        let outcomes = remote.fungus_proof().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(Outcome::transmitted));
        assert!(remote.state().power());
        let powers: Vec<u8> = remote
            .transmitter()
            .sent
            .iter()
            .map(|bits| {
                bits[72..80]
                    .bytes()
                    .rev()
                    .fold(0u8, |acc, bit| (acc << 1) | (bit - b'0'))
            })
            .collect();
        assert_eq!(powers, vec![32, 0, 32]);

        assert_eq!(remote.fungus_proof().unwrap(), vec![Outcome::Skipped]);
        assert_eq!(remote.transmitter().sent.len(), 3);
    }

    #[test]
    fn transmit_failure_keeps_state() {
        let mut remote = remote();
        remote.transmitter.fail = true;
        assert!(matches!(
            remote.power_toggle(),
            Err(VestelError::TransmitFailure(_))
        ));
        assert!(!remote.state().power());
    }

    #[test]
    fn sensor_failure_aborts_feeling() {
        let mut remote = VestelRemote::new(Recorder::default(), Room(Cell::new(Some(24.5))));
        remote.power_on().unwrap();
        assert!(remote.feeling().unwrap().transmitted());
        assert!(remote.state().feeling());

        remote.thermometer().0.set(None);
        assert!(matches!(
            remote.swing(),
            Err(VestelError::SensorUnavailable(ThermoError::NoDevice))
        ));
        assert!(remote.state().swing());
        assert_eq!(remote.state().last_button(), Button::Feeling);
        assert_eq!(remote.transmitter().sent.len(), 2);
    }
}
