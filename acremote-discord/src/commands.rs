use std::str::FromStr;

use acremote_peripherals::ir::vestel::types::{Mode, Speed};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Button layouts sent along with some replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Menu {
    Main,
    Speed,
    Mode,
    Other,
    Timer,
    Admin,
}

impl Menu {
    pub fn rows(&self) -> &'static [&'static [&'static str]] {
        match self {
            Menu::Main => &[
                &["on", "temp_up"],
                &["off", "temp_down"],
                &["speed", "mode", "swing"],
                &["get_stat", "other"],
            ],
            Menu::Speed => &[
                &["speed_auto", "speed_low"],
                &["speed_mid", "speed_high"],
                &["strong", "sleep"],
                &["main"],
            ],
            Menu::Mode => &[
                &["mode_auto", "mode_cool"],
                &["mode_dry", "mode_heat"],
                &["mode_fan"],
                &["main"],
            ],
            Menu::Other => &[
                &["feeling", "fresh"],
                &["screen", "timer"],
                &["health", "fungusproof"],
                &["admin", "main"],
            ],
            Menu::Timer => &[
                &["timer_set", "timer_up"],
                &["timer_unset", "timer_down"],
                &["timer_get"],
                &["other", "main"],
            ],
            Menu::Admin => &[&["shutdown", "restart", "cpu_temp"], &["main"]],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Menu(Menu),
    Help,
    GetStat,
    On,
    Off,
    TempUp,
    TempDown,
    SetTemp(Option<String>),
    Swing,
    Speed(Speed),
    Mode(Mode),
    Health,
    Strong,
    Sleep,
    Screen,
    Clean,
    Fresh,
    Feeling,
    FungusProof,
    TimerUp,
    TimerDown,
    TimerGet,
    TimerSet(Option<String>),
    TimerUnset,
    Shutdown,
    Restart,
    CpuTemp,
}

const PLAIN: &[&str] = &[
    "start",
    "help",
    "get_stat",
    "on",
    "off",
    "temp_up",
    "temp_down",
    "set",
    "set_temp",
    "swing",
    "health",
    "strong",
    "sleep",
    "screen",
    "clean",
    "fresh",
    "feeling",
    "fungusproof",
    "timer_up",
    "timer_down",
    "timer_get",
    "timer_set",
    "timer_unset",
    "shutdown",
    "restart",
    "cpu_temp",
    "adm",
];

#[derive(Error, Debug, PartialEq)]
#[error("Failed to parse {0} as command")]
pub struct CommandParseError(pub String);

impl Command {
    /// Every name the parser accepts, sorted.
    pub fn names() -> Vec<String> {
        let mut names: Vec<String> = PLAIN.iter().map(|n| n.to_string()).collect();
        names.extend(Menu::iter().map(|m| m.to_string()));
        names.extend(Speed::iter().map(|s| format!("speed_{}", s).to_lowercase()));
        names.extend(Mode::iter().map(|m| format!("mode_{}", m).to_lowercase()));
        names.sort();
        names
    }

    /// `name` without its leading slash; `args` are the words after it.
    pub fn parse(name: &str, args: &[&str]) -> Result<Command, CommandParseError> {
        let arg = args.first().map(|a| a.to_string());
        let command = match name {
            "start" => Command::Start,
            "adm" => Command::Menu(Menu::Admin),
            "help" => Command::Help,
            "get_stat" => Command::GetStat,
            "on" => Command::On,
            "off" => Command::Off,
            "temp_up" => Command::TempUp,
            "temp_down" => Command::TempDown,
            "set" | "set_temp" => Command::SetTemp(arg),
            "swing" => Command::Swing,
            "health" => Command::Health,
            "strong" => Command::Strong,
            "sleep" => Command::Sleep,
            "screen" => Command::Screen,
            "clean" => Command::Clean,
            "fresh" => Command::Fresh,
            "feeling" => Command::Feeling,
            "fungusproof" => Command::FungusProof,
            "timer_up" => Command::TimerUp,
            "timer_down" => Command::TimerDown,
            "timer_get" => Command::TimerGet,
            "timer_set" => Command::TimerSet(arg),
            "timer_unset" => Command::TimerUnset,
            "shutdown" => Command::Shutdown,
            "restart" => Command::Restart,
            "cpu_temp" => Command::CpuTemp,
            other => {
                if let Some(speed) = other.strip_prefix("speed_") {
                    Command::Speed(
                        Speed::from_str(speed).map_err(|_| CommandParseError(name.to_string()))?,
                    )
                } else if let Some(mode) = other.strip_prefix("mode_") {
                    Command::Mode(
                        Mode::from_str(mode).map_err(|_| CommandParseError(name.to_string()))?,
                    )
                } else {
                    Command::Menu(
                        Menu::from_str(other).map_err(|_| CommandParseError(name.to_string()))?,
                    )
                }
            }
        };
        Ok(command)
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(
            self,
            Command::On | Command::Off | Command::Shutdown | Command::Restart
        )
    }

    pub fn admin_only(&self) -> bool {
        matches!(
            self,
            Command::Menu(Menu::Admin) | Command::Shutdown | Command::Restart | Command::CpuTemp
        )
    }
}

/// A command line as typed: the name with an optional leading slash, then
/// its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandLine {
    pub name: String,
    pub args: Vec<String>,
    pub slashed: bool,
}

impl FromStr for CommandLine {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let slashed = trimmed.starts_with('/');
        let mut words = trimmed.trim_start_matches('/').split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| CommandParseError(s.to_string()))?
            .to_lowercase();
        Ok(CommandLine {
            name,
            args: words.map(str::to_string).collect(),
            slashed,
        })
    }
}

impl CommandLine {
    pub fn command(&self) -> Result<Command, CommandParseError> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        Command::parse(&self.name, &args)
    }
}
