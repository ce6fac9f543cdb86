use std::fmt;

use itertools::Itertools;
use num_traits::ToPrimitive;
use packed_struct::prelude::*;

use crate::ir::vestel::state::AcState;
use crate::ir::vestel::types::{Mode, Speed};
use crate::ir::vestel::{Result, VestelError};
use crate::thermo::{ThermoError, Thermometer};

pub const DEVICE_ID_0: u8 = 195;
pub const DEVICE_ID_1: u8 = 224;

const FEELING_OFFSET: i64 = 74;

/// The twelve data bytes in transmission order.
#[derive(PackedStruct, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[packed_struct(endian = "msb")]
pub struct VestelFrameData {
    pub device_id_0: u8,
    /// 64 + 8 per degree above 16, +7 with swing off
    pub temperature_swing: u8,
    pub device_id_1: u8,
    pub reserved_3: u8,
    /// speed code + timer hours
    pub speed_timer_hours: u8,
    /// 64 for strong, +30 for a half hour timer
    pub strong_timer_minutes: u8,
    /// mode code, +16 fresh, +8 feeling, +4 sleep
    pub mode_flags: u8,
    pub feeling_temperature: u8,
    pub reserved_8: u8,
    /// 32 when on, +2 health, +64 timer set; 4 when off and cleaning
    pub power_flags: u8,
    pub reserved_10: u8,
    pub button_id: u8,
}

impl VestelFrameData {
    pub fn blank() -> VestelFrameData {
        VestelFrameData {
            device_id_0: DEVICE_ID_0,
            device_id_1: DEVICE_ID_1,
            ..VestelFrameData::default()
        }
    }

    fn set_power_flags(&mut self, state: &AcState) {
        self.power_flags = if state.power() {
            let mut flags = 32;
            if state.health() {
                flags += 2;
            }
            if state.timer().is_set() {
                flags += 64;
            }
            flags
        } else if state.clean() {
            4
        } else {
            0
        };
    }

    fn set_mode_flags<S: Thermometer + ?Sized>(
        &mut self,
        state: &AcState,
        thermometer: &S,
    ) -> Result<()> {
        let mut flags = u8::from(state.mode());
        if state.fresh() {
            flags += 16;
        }
        if state.feeling() {
            flags += 8;
        }
        if state.sleep() {
            flags += 4;
        }
        if state.feeling() {
            // the room reading replaces the whole byte, mode and flags included
            let room = thermometer
                .read_current_temperature()
                .map_err(VestelError::SensorUnavailable)?;
            let floored = room
                .floor()
                .to_i64()
                .ok_or(VestelError::SensorUnavailable(ThermoError::NotFinite(room)))?;
            trace!("feeling on, room {} replaces mode flags {}", room, flags);
            flags = (FEELING_OFFSET + floored).rem_euclid(256) as u8;
        } else {
            self.feeling_temperature = 0;
        }
        self.mode_flags = flags;
        Ok(())
    }

    fn set_temperature_swing(&mut self, state: &AcState) {
        let mut value = if state.mode().has_setpoint() {
            64 + state.temperature().ind() * 8
        } else {
            0
        };
        if !state.swing() {
            value += 7;
        }
        self.temperature_swing = value;
    }

    fn set_speed_timer_hours(&mut self, state: &AcState) {
        let speed = if state.mode() == Mode::Auto {
            Speed::Auto
        } else {
            state.speed()
        };
        self.speed_timer_hours = u8::from(speed) + state.timer().whole_hours();
    }

    fn set_strong_timer_minutes(&mut self, state: &AcState) {
        let mut value = if state.strong() { 64 } else { 0 };
        if state.timer().has_half_hour() {
            value += 30;
        }
        self.strong_timer_minutes = value;
    }

    /// Fills the state derived bytes, in the order the remote computes them.
    pub fn refresh<S: Thermometer + ?Sized>(
        &mut self,
        state: &AcState,
        thermometer: &S,
    ) -> Result<()> {
        self.set_power_flags(state);
        self.set_mode_flags(state, thermometer)?;
        self.set_temperature_swing(state);
        self.set_speed_timer_hours(state);
        self.set_strong_timer_minutes(state);
        self.button_id = u8::from(state.last_button());
        Ok(())
    }
}

/// Binary form of a value as eight characters, most significant bit first,
/// keeping only the low eight bits.
pub fn render_octet(value: i64) -> String {
    format!("{:08b}", value.rem_euclid(256))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VestelFrame {
    data: [u8; 12],
}

impl VestelFrame {
    pub const OCTETS: usize = 13;
    pub const BITS: usize = Self::OCTETS * 8;

    pub fn pack(data: &VestelFrameData) -> Result<VestelFrame> {
        Ok(VestelFrame { data: data.pack()? })
    }

    /// What a freshly started remote holds before any button press.
    pub fn blank() -> Result<VestelFrame> {
        Self::pack(&VestelFrameData::blank())
    }

    /// Reads the thermometer only when feeling is on.
    pub fn encode<S: Thermometer + ?Sized>(state: &AcState, thermometer: &S) -> Result<VestelFrame> {
        let mut data = VestelFrameData::blank();
        data.refresh(state, thermometer)?;
        trace!("encoded {:?} as {:?}", state, data);
        Self::pack(&data)
    }

    pub fn data(&self) -> &[u8; 12] {
        &self.data
    }

    pub fn checksum(&self) -> u8 {
        self.data.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
    }

    pub fn octets(&self) -> [u8; Self::OCTETS] {
        let mut octets = [0; Self::OCTETS];
        octets[..12].copy_from_slice(&self.data);
        octets[12] = self.checksum();
        octets
    }

    /// Each octet least significant bit first, as the remote sends them.
    pub fn to_bits(&self) -> String {
        self.octets()
            .iter()
            .map(|octet| render_octet(*octet as i64).chars().rev().collect::<String>())
            .collect()
    }
}

impl fmt::Display for VestelFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.octets().iter().map(|b| format!("0x{:02X}", b)).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::ir::vestel::types::{Button, VestelTemperature};
    use crate::thermo::NoThermometer;

    struct FixedThermometer {
        celsius: f32,
        reads: Cell<usize>,
    }

    impl FixedThermometer {
        fn new(celsius: f32) -> Self {
            FixedThermometer {
                celsius,
                reads: Cell::new(0),
            }
        }
    }

    impl Thermometer for FixedThermometer {
        fn read_current_temperature(&self) -> std::result::Result<f32, ThermoError> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.celsius)
        }
    }

    const BLANK_BITS: &str = "11000011000000000000011100000000000000000000000000000000000000000000000000000000000000000000000011000101";
    const HEAT_BITS: &str = "11000011111001100000011100000000100001100111101000000001000000000000000000000110000000000000000010010101";

    fn heat_state() -> AcState {
        let mut state = AcState::default();
        state.set_power(true);
        state.set_temperature(20).unwrap();
        state.set_speed(Speed::Low);
        state.set_swing(false);
        state.set_mode(Mode::Heat);
        state.set_strong(true);
        state.set_timer(1.5).unwrap();
        state
    }

    #[test]
    fn render_octet_pads_and_wraps() {
        assert_eq!(render_octet(69), "01000101");
        assert_eq!(render_octet(192), "11000000");
        assert_eq!(render_octet(420), "10100100");
        assert_eq!(render_octet(-1), "11111111");
        for value in (-600..600).step_by(7) {
            let rendered = render_octet(value);
            assert_eq!(rendered.len(), 8);
            assert_eq!(i64::from_str_radix(&rendered, 2).unwrap(), value.rem_euclid(256));
        }
    }

    #[test]
    fn blank_frame_bits() {
        let frame = VestelFrame::blank().unwrap();
        assert_eq!(frame.checksum(), 163);
        assert_eq!(frame.to_bits(), BLANK_BITS);
    }

    #[test]
    fn heat_state_bits() {
        let frame = VestelFrame::encode(&heat_state(), &NoThermometer).unwrap();
        assert_eq!(
            frame.octets(),
            [195, 103, 224, 0, 97, 94, 128, 0, 0, 96, 0, 0, 169]
        );
        assert_eq!(frame.to_bits(), HEAT_BITS);
        assert_eq!(frame.to_bits().len(), VestelFrame::BITS);
    }

    #[test]
    fn default_state_is_reproducible() {
        let state = AcState::default();
        let first = VestelFrame::encode(&state, &NoThermometer).unwrap();
        let second = VestelFrame::encode(&state, &NoThermometer).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(
            first.octets(),
            [195, 152, 224, 0, 32, 0, 32, 0, 0, 0, 0, 0, 123]
        );
    }

    #[test]
    fn temperature_byte_moves_eight_per_degree() {
        for mode in [Mode::Cool, Mode::Dry, Mode::Heat] {
            let mut state = AcState::default();
            state.set_mode(mode);
            for (a, b) in [(16, 36), (20, 21), (30, 18)] {
                state.set_temperature(a).unwrap();
                let first = VestelFrame::encode(&state, &NoThermometer).unwrap();
                state.set_temperature(b).unwrap();
                let second = VestelFrame::encode(&state, &NoThermometer).unwrap();
                assert_eq!(
                    first.data()[1] as i64 - second.data()[1] as i64,
                    8 * (a - b)
                );
            }
        }
    }

    #[test]
    fn auto_and_fan_ignore_setpoint() {
        for mode in [Mode::Auto, Mode::Fan] {
            let mut state = AcState::default();
            state.set_mode(mode);
            state.set_swing(false);
            let frame = VestelFrame::encode(&state, &NoThermometer).unwrap();
            assert_eq!(frame.data()[1], 7);
        }
    }

    #[test]
    fn auto_mode_sends_auto_speed() {
        let mut state = AcState::default();
        state.set_mode(Mode::Auto);
        state.set_timer(2.0).unwrap();
        let frame = VestelFrame::encode(&state, &NoThermometer).unwrap();
        assert_eq!(frame.data()[4], 160 + 2);
    }

    #[test]
    fn checksum_is_sum_of_data_bytes() {
        let mut state = heat_state();
        for t in VestelTemperature::items() {
            state.set_temperature(t.celsius() as i64).unwrap();
            state.set_health(t.celsius() % 2 == 0);
            state.set_fresh(t.celsius() % 3 == 0);
            state.set_last_button(Button::Feeling);
            let frame = VestelFrame::encode(&state, &NoThermometer).unwrap();
            let sum: u32 = frame.data().iter().map(|b| *b as u32).sum();
            assert_eq!(frame.checksum() as u32, sum % 256);
            assert_eq!(frame.octets()[12], frame.checksum());
        }
    }

    #[test]
    fn power_byte() {
        let mut state = AcState::default();
        state.set_clean(true);
        assert_eq!(VestelFrame::encode(&state, &NoThermometer).unwrap().data()[9], 4);

        state.set_power(true);
        state.set_health(true);
        assert_eq!(VestelFrame::encode(&state, &NoThermometer).unwrap().data()[9], 34);

        state.set_timer(0.5).unwrap();
        let frame = VestelFrame::encode(&state, &NoThermometer).unwrap();
        assert_eq!(frame.data()[9], 98);
        assert_eq!(frame.data()[5], 30);
    }

    #[test]
    fn mode_flags_without_feeling() {
        let mut state = AcState::default();
        state.set_mode(Mode::Dry);
        state.set_fresh(true);
        state.set_sleep(true);
        let frame = VestelFrame::encode(&state, &NoThermometer).unwrap();
        assert_eq!(frame.data()[6], 64 + 16 + 4);
        assert_eq!(frame.data()[7], 0);
    }

    #[test]
    fn feeling_replaces_mode_flags_with_room_temperature() {
        let mut state = AcState::default();
        state.set_mode(Mode::Heat);
        state.set_sleep(true);
        state.set_feeling(true);
        let thermometer = FixedThermometer::new(23.8);
        let frame = VestelFrame::encode(&state, &thermometer).unwrap();
        assert_eq!(frame.data()[6], 74 + 23);
        assert_eq!(thermometer.reads.get(), 1);
    }

    #[test]
    fn thermometer_untouched_without_feeling() {
        let thermometer = FixedThermometer::new(21.0);
        VestelFrame::encode(&AcState::default(), &thermometer).unwrap();
        assert_eq!(thermometer.reads.get(), 0);
    }

    #[test]
    fn feeling_without_sensor_fails() {
        let mut state = AcState::default();
        state.set_feeling(true);
        assert!(matches!(
            VestelFrame::encode(&state, &NoThermometer),
            Err(VestelError::SensorUnavailable(_))
        ));
    }

    #[test]
    fn button_id_is_last_data_byte() {
        let mut state = AcState::default();
        state.set_last_button(Button::Screen);
        let frame = VestelFrame::encode(&state, &NoThermometer).unwrap();
        assert_eq!(frame.data()[11], 21);
    }

    #[test]
    fn display_lists_hex_octets() {
        let frame = VestelFrame::blank().unwrap();
        assert!(frame.to_string().starts_with("0xC3, 0x00, 0xE0"));
        assert!(frame.to_string().ends_with("0xA3"));
    }
}
