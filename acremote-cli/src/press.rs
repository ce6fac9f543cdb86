use acremote_peripherals::ir::types::Transmitter;
use acremote_peripherals::ir::vestel::types::{InvalidValue, Mode, Speed};
use acremote_peripherals::ir::vestel::{Outcome, VestelRemote};
use acremote_peripherals::thermo::Thermometer;
use eyre::{eyre, Result};
use strum_macros::{Display, EnumIter, EnumString};

/// Buttons reachable from the command line, including the virtual ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    TempUp,
    TempDown,
    #[strum(serialize = "temp_set", serialize = "set")]
    TempSet,
    Swing,
    Speed,
    Power,
    On,
    Off,
    Mode,
    Health,
    Strong,
    Sleep,
    Timer,
    Screen,
    Clean,
    Fresh,
    Feeling,
    #[strum(serialize = "fungus_proof", serialize = "fungusproof")]
    FungusProof,
}

impl Action {
    pub fn needs_value(&self) -> bool {
        matches!(
            self,
            Action::TempSet | Action::Speed | Action::Mode | Action::Timer
        )
    }
}

pub fn press<T: Transmitter, S: Thermometer>(
    remote: &mut VestelRemote<T, S>,
    action: Action,
    value: Option<&str>,
) -> Result<Vec<Outcome>> {
    let value = match (action.needs_value(), value) {
        (true, None) => return Err(eyre!("{} needs a value", action)),
        (_, v) => v.unwrap_or_default(),
    };
    let outcome = match action {
        Action::TempUp => remote.temp_up()?,
        Action::TempDown => remote.temp_down()?,
        Action::TempSet => {
            let celsius = value
                .trim()
                .parse::<i64>()
                .map_err(|_| InvalidValue::NotANumber(value.to_string()))?;
            remote.temp_set(celsius)?
        }
        Action::Swing => remote.swing()?,
        Action::Speed => remote.speed_set(Speed::parse(value)?)?,
        Action::Power => remote.power_toggle()?,
        Action::On => remote.power_on()?,
        Action::Off => remote.power_off()?,
        Action::Mode => remote.mode_set(Mode::parse(value)?)?,
        Action::Health => remote.health()?,
        Action::Strong => remote.strong()?,
        Action::Sleep => remote.sleep()?,
        Action::Timer => {
            let hours = value
                .trim()
                .parse::<f64>()
                .map_err(|_| InvalidValue::NotANumber(value.to_string()))?;
            remote.timer_set(hours)?
        }
        Action::Screen => remote.screen()?,
        Action::Clean => remote.clean()?,
        Action::Fresh => remote.fresh()?,
        Action::Feeling => remote.feeling()?,
        Action::FungusProof => return Ok(remote.fungus_proof()?),
    };
    Ok(vec![outcome])
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use acremote_peripherals::ir::output::DryRun;
    use acremote_peripherals::thermo::NoThermometer;

    use super::*;

    fn remote() -> VestelRemote<DryRun, NoThermometer> {
        let mut remote = VestelRemote::new(DryRun::new(), NoThermometer);
        remote.set_fungus_proof_delay(Duration::from_millis(1));
        remote
    }

    #[test]
    fn parses_action_names() {
        assert_eq!(Action::from_str("temp_up").unwrap(), Action::TempUp);
        assert_eq!(Action::from_str("set").unwrap(), Action::TempSet);
        assert_eq!(Action::from_str("fungusproof").unwrap(), Action::FungusProof);
        assert_eq!(Action::FungusProof.to_string(), "fungus_proof");
        assert!(Action::from_str("turbo").is_err());
    }

    #[test]
    fn value_is_required() {
        let mut remote = remote();
        assert!(press(&mut remote, Action::Mode, None).is_err());
        assert!(press(&mut remote, Action::TempSet, Some("warm")).is_err());
        assert!(remote.transmitter().sent().is_empty());
    }

    #[test]
    fn presses_reach_the_transmitter() {
        let mut remote = remote();
        let outcomes = press(&mut remote, Action::TempSet, Some("21")).unwrap();
        assert!(outcomes[0].transmitted());
        press(&mut remote, Action::Mode, Some("heat")).unwrap();
        press(&mut remote, Action::Speed, Some("low")).unwrap();
        press(&mut remote, Action::Timer, Some("2.5")).unwrap();
        assert_eq!(remote.state().mode(), Mode::Heat);
        assert_eq!(remote.state().speed(), Speed::Low);
        assert_eq!(remote.state().timer().hours(), 2.5);
        assert_eq!(remote.transmitter().sent().len(), 4);
    }

    #[test]
    fn fungus_proof_reports_every_press() {
        let mut remote = remote();
        let outcomes = press(&mut remote, Action::FungusProof, None).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(remote.state().power());
    }
}
