use std::collections::HashMap;
use std::time::Instant;

use acremote_peripherals::ir::types::Transmitter;
use acremote_peripherals::ir::vestel::state::{on_off, AcState};
use acremote_peripherals::ir::vestel::types::{timer_step, InvalidValue, Mode, Speed, Timer, VestelTemperature};
use acremote_peripherals::ir::vestel::{self, Outcome, VestelError, VestelRemote};
use acremote_peripherals::state_file::StateFile;
use acremote_peripherals::thermo::Thermometer;

use crate::commands::{Command, CommandLine, Menu};
use crate::config::Config;
use crate::confirm::{parse_custom_id, Confirmation, Confirmations, Token};
use crate::cooldown::PowerCooldown;
use crate::host::Host;

const STRANGER: &str = "These aren't the bots you are looking for. Move along.";
const MENU_PREFIX: &str = "cmd:";

pub fn menu_button_id(command: &str) -> String {
    format!("{}{}", MENU_PREFIX, command)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Incoming {
    pub user_id: u64,
    pub user_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    Sender,
    User(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub to: Recipient,
    pub text: String,
    pub menu: Option<Menu>,
    /// Ask for a yes/no answer to this confirmation.
    pub confirm: Option<Token>,
}

impl Outgoing {
    pub fn reply<S: Into<String>>(text: S) -> Outgoing {
        Outgoing {
            to: Recipient::Sender,
            text: text.into(),
            menu: None,
            confirm: None,
        }
    }

    pub fn to_user<S: Into<String>>(user: u64, text: S) -> Outgoing {
        Outgoing {
            to: Recipient::User(user),
            ..Outgoing::reply(text)
        }
    }

    fn with_menu(mut self, menu: Menu) -> Outgoing {
        self.menu = Some(menu);
        self
    }

    fn with_confirm(mut self, token: Token) -> Outgoing {
        self.confirm = Some(token);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    Shutdown,
    Restart,
}

fn setting<V: std::fmt::Display>(name: &str, value: V) -> Outgoing {
    Outgoing::reply(format!("AC {}: **{}**", name, value))
}

/// Command router for the remote. Knows nothing about the chat service;
/// every call returns the messages to send.
pub struct Bot<T: Transmitter, S: Thermometer> {
    remote: VestelRemote<T, S>,
    state_file: StateFile,
    admin_ids: Vec<u64>,
    user_ids: Vec<u64>,
    easter_eggs: HashMap<String, String>,
    cooldown: PowerCooldown,
    confirmations: Confirmations<Command>,
    timer_dial: f64,
    host: Box<dyn Host + Send>,
    deferred: Option<HostAction>,
}

impl<T: Transmitter, S: Thermometer> Bot<T, S> {
    pub fn new(
        mut remote: VestelRemote<T, S>,
        state_file: StateFile,
        config: &Config,
        host: Box<dyn Host + Send>,
    ) -> Self {
        remote.set_fungus_proof_delay(config.fungus_proof_delay());
        let timer_dial = remote.state().timer().hours();
        Bot {
            remote,
            state_file,
            admin_ids: config.admin_ids.clone(),
            user_ids: config.user_ids.clone(),
            easter_eggs: config
                .easter_eggs
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
            cooldown: PowerCooldown::new(config.cooldown()),
            confirmations: Confirmations::default(),
            timer_dial,
            host,
            deferred: None,
        }
    }

    pub fn state(&self) -> &AcState {
        self.remote.state()
    }

    pub fn remote(&self) -> &VestelRemote<T, S> {
        &self.remote
    }

    pub fn timer_dial(&self) -> f64 {
        self.timer_dial
    }

    fn is_admin(&self, user: u64) -> bool {
        self.admin_ids.contains(&user)
    }

    fn is_allowed(&self, user: u64) -> bool {
        self.is_admin(user) || self.user_ids.contains(&user)
    }

    fn refuse(&self, user_id: u64, user_name: &str, what: &str) -> Vec<Outgoing> {
        warn!("refusing user_id={} username={}", user_id, user_name);
        let mut out = vec![Outgoing::reply(STRANGER)];
        out.extend(self.admin_ids.iter().map(|admin| {
            Outgoing::to_user(
                *admin,
                format!("Stranger {} ({}) tried: {}", user_name, user_id, what),
            )
        }));
        out
    }

    fn save_state(&self) {
        if let Err(e) = self.state_file.save(self.remote.state()) {
            error!("could not save state: {}", e);
        }
    }

    pub fn handle_message(&mut self, msg: &Incoming) -> Vec<Outgoing> {
        if !self.is_allowed(msg.user_id) {
            return self.refuse(msg.user_id, &msg.user_name, &msg.text);
        }

        let mut out = Vec::new();
        if let Some(egg) = self.easter_eggs.get(&msg.text.trim().to_lowercase()) {
            out.push(Outgoing::reply(egg.clone()));
        }

        if let Ok(line) = msg.text.parse::<CommandLine>() {
            match line.command() {
                Ok(command) => {
                    info!(
                        "user_id={} username={} command={} arguments={:?}",
                        msg.user_id, msg.user_name, line.name, line.args
                    );
                    out.extend(self.dispatch(msg.user_id, command));
                }
                Err(e) if line.slashed => {
                    debug!("{}", e);
                    out.push(Outgoing::reply(format!(
                        "Unknown command \"/{}\".\nTry \"/help\" to bring the list of commands",
                        line.name
                    )));
                }
                Err(_) => trace!("ignoring chatter from {}", msg.user_id),
            }
        }

        self.save_state();
        out
    }

    /// Button presses: menu shortcuts and confirmation answers.
    pub fn handle_button(&mut self, user_id: u64, user_name: &str, custom_id: &str) -> Vec<Outgoing> {
        if let Some(command) = custom_id.strip_prefix(MENU_PREFIX) {
            return self.handle_message(&Incoming {
                user_id,
                user_name: user_name.to_string(),
                text: format!("/{}", command),
            });
        }
        if !self.is_allowed(user_id) {
            return self.refuse(user_id, user_name, custom_id);
        }

        let out = match parse_custom_id(custom_id) {
            Some((token, yes)) => {
                info!(
                    "user_id={} username={} command=confirm arguments={:?}",
                    user_id,
                    user_name,
                    [token.to_string(), u8::from(yes).to_string()]
                );
                match self.confirmations.answer(user_id, token, yes) {
                    Some(Confirmation::Confirmed(command)) => self.run(command),
                    Some(Confirmation::Cancelled(command)) => {
                        debug!("{:?} cancelled", command);
                        vec![Outgoing::reply("Cancelled")]
                    }
                    Some(Confirmation::Pending(newer)) => {
                        debug!("stale answer, {} still pending", newer);
                        vec![Outgoing::reply("That question was replaced by a newer one")]
                    }
                    None => vec![Outgoing::reply("Nothing to confirm")],
                }
            }
            None => {
                error!("unexpected custom_id: {}", custom_id);
                Vec::new()
            }
        };

        self.save_state();
        out
    }

    /// Host actions wait until their reply has been sent.
    pub fn take_deferred(&mut self) -> Option<HostAction> {
        self.deferred.take()
    }

    pub fn run_host_action(&self, action: HostAction) {
        let result = match action {
            HostAction::Shutdown => self.host.shutdown(),
            HostAction::Restart => self.host.restart(),
        };
        if let Err(e) = result {
            error!("could not run {:?}: {}", action, e);
        }
    }

    fn dispatch(&mut self, user: u64, command: Command) -> Vec<Outgoing> {
        if command.admin_only() && !self.is_admin(user) {
            return vec![Outgoing::reply("`You are not an admin`")];
        }
        if command.needs_confirmation() {
            let token = self.confirmations.request(user, command);
            return vec![Outgoing::reply("Are you sure?").with_confirm(token)];
        }
        self.run(command)
    }

    fn failure(&self, what: &str, e: VestelError) -> Outgoing {
        match e {
            VestelError::InvalidValue(invalid) => Outgoing::reply(invalid.to_string()),
            other => {
                error!("could not {}: {}", what, other);
                Outgoing::reply(format!("Could not {}: {}", what, other))
            }
        }
    }

    fn toggle(
        &mut self,
        name: &str,
        press: fn(&mut VestelRemote<T, S>) -> vestel::Result<Outcome>,
        value: fn(&AcState) -> bool,
    ) -> Vec<Outgoing> {
        match press(&mut self.remote) {
            Ok(Outcome::Transmitted(_)) => vec![setting(name, on_off(value(self.remote.state())))],
            Ok(Outcome::Skipped) => vec![Outgoing::reply("AC must be on")],
            Err(e) => vec![self.failure(&format!("toggle {}", name), e)],
        }
    }

    fn switch(&mut self, on: bool) -> Vec<Outgoing> {
        let now = Instant::now();
        if let Err(wait) = self.cooldown.check(now) {
            return vec![Outgoing::reply(wait.message())];
        }
        let result = if on {
            self.remote.power_on()
        } else {
            self.remote.power_off()
        };
        match result {
            Ok(_) if on => {
                self.cooldown.record_start(now);
                vec![Outgoing::reply("Turning on the AC")]
            }
            Ok(_) => {
                self.cooldown.record_stop(now);
                vec![Outgoing::reply("Turning off the AC")]
            }
            Err(e) => vec![self.failure("switch the AC", e)],
        }
    }

    fn temp_step(&mut self, up: bool) -> Vec<Outgoing> {
        let before = self.remote.state().temperature();
        let result = if up {
            self.remote.temp_up()
        } else {
            self.remote.temp_down()
        };
        if let Err(e) = result {
            return vec![self.failure("change the temperature", e)];
        }
        let after = self.remote.state().temperature();
        let bound = match (after == before, up) {
            (false, _) => "",
            (true, true) => " MAX",
            (true, false) => " MIN",
        };
        vec![Outgoing::reply(format!("AC temperature: **{}{}**", after, bound))]
    }

    fn set_temp(&mut self, arg: Option<String>) -> Vec<Outgoing> {
        let arg = match arg {
            Some(arg) => arg,
            None => return vec![Outgoing::reply("You need to supply temperature value")],
        };
        let temperature = match arg.parse::<VestelTemperature>() {
            Ok(t) => t,
            Err(e) => return vec![Outgoing::reply(e.to_string())],
        };
        match self.remote.temp_set(temperature.celsius() as i64) {
            Ok(_) => {
                self.cooldown.record_start(Instant::now());
                vec![Outgoing::reply(format!("AC temperature: **{}**", temperature))]
            }
            Err(e) => vec![self.failure("set the temperature", e)],
        }
    }

    fn speed(&mut self, speed: Speed) -> Vec<Outgoing> {
        match self.remote.speed_set(speed) {
            Ok(Outcome::Transmitted(_)) => vec![setting("speed", self.remote.state().speed())],
            Ok(Outcome::Skipped) => vec![Outgoing::reply("AC must be on")],
            Err(e) => vec![self.failure("set the speed", e)],
        }
    }

    fn mode(&mut self, mode: Mode) -> Vec<Outgoing> {
        match self.remote.mode_set(mode) {
            Ok(Outcome::Transmitted(_)) => vec![setting("mode", self.remote.state().mode())],
            Ok(Outcome::Skipped) => vec![Outgoing::reply("AC must be on")],
            Err(e) => vec![self.failure("set the mode", e)],
        }
    }

    fn clean(&mut self) -> Vec<Outgoing> {
        match self.remote.clean() {
            Ok(Outcome::Transmitted(_)) => vec![setting("clean", on_off(self.remote.state().clean()))],
            Ok(Outcome::Skipped) => vec![Outgoing::reply("AC must be off")],
            Err(e) => vec![self.failure("start cleaning", e)],
        }
    }

    fn fungus_proof(&mut self) -> Vec<Outgoing> {
        if self.remote.state().power() {
            return vec![Outgoing::reply("AC must be off")];
        }
        match self.remote.fungus_proof() {
            Ok(_) => {
                self.cooldown.record_start(Instant::now());
                vec![Outgoing::reply("AC fungusproof mode")]
            }
            Err(e) => vec![self.failure("run fungusproof", e)],
        }
    }

    fn timer_dial_message(&self) -> Outgoing {
        Outgoing::reply(format!("Timer dial: **{:.1}** hours", self.timer_dial))
    }

    fn timer_get(&self) -> Outgoing {
        Outgoing::reply(format!(
            "AC timer set to: **{}** hours",
            self.remote.state().timer()
        ))
    }

    fn turn_dial(&mut self, up: bool) {
        if up && self.timer_dial < Timer::MAX_HOURS {
            self.timer_dial += timer_step(self.timer_dial);
        } else if !up && self.timer_dial > 0.0 {
            self.timer_dial -= timer_step(self.timer_dial);
        }
    }

    fn timer_set(&mut self, arg: Option<String>) -> Vec<Outgoing> {
        let mut out = Vec::new();
        if let Some(arg) = arg {
            match arg.trim().parse::<f64>() {
                Ok(hours) => self.timer_dial = hours,
                Err(_) => {
                    self.timer_dial = self.remote.state().timer().hours();
                    out.push(Outgoing::reply(InvalidValue::NotANumber(arg).to_string()));
                    out.push(self.timer_get());
                    return out;
                }
            }
        }
        match self.remote.timer_set(self.timer_dial) {
            Ok(Outcome::Transmitted(_)) => {}
            Ok(Outcome::Skipped) => out.push(Outgoing::reply("AC must be on")),
            Err(e) => {
                self.timer_dial = self.remote.state().timer().hours();
                out.push(self.failure("set the timer", e));
            }
        }
        out.push(self.timer_get());
        out
    }

    fn status(&self) -> Outgoing {
        let room = match self.remote.thermometer().read_current_temperature() {
            Ok(room) => format!("{:.1}°C", room),
            Err(e) => {
                debug!("no room temperature: {}", e);
                "n/a".to_string()
            }
        };
        let mut lines = vec!["AC Status:".to_string()];
        for (label, value) in self.remote.state().summary() {
            lines.push(format!("{:<12}= {}", label, value));
            if label == "Temperature" {
                lines.push(format!("{:<12}= {}", "Room", room));
            }
        }
        Outgoing::reply(format!("```\n{}\n```", lines.join("\n")))
    }

    fn menu(&self, menu: Menu) -> Outgoing {
        let state = self.remote.state();
        let text = match menu {
            Menu::Main => "Main:".to_string(),
            Menu::Mode => format!("AC mode: **{}**", state.mode()),
            Menu::Speed => format!(
                "AC speed: **{}**\nAC strong: **{}**\nAC sleep: **{}**",
                state.speed(),
                on_off(state.strong()),
                on_off(state.sleep())
            ),
            Menu::Other => "Other:".to_string(),
            Menu::Timer => format!(
                "AC timer: {} hours\nRemote dial: {:.1} hours",
                state.timer(),
                self.timer_dial
            ),
            Menu::Admin => "`Admin:`".to_string(),
        };
        Outgoing::reply(text).with_menu(menu)
    }

    fn help(&self) -> Outgoing {
        let names: Vec<String> = Command::names()
            .into_iter()
            .map(|n| format!("/{}", n))
            .collect();
        Outgoing::reply(format!("List of available commands:\n\n{}", names.join("\n")))
    }

    fn run(&mut self, command: Command) -> Vec<Outgoing> {
        match command {
            Command::Start => {
                vec![Outgoing::reply("Rise and shine **Mr. Freeman**").with_menu(Menu::Main)]
            }
            Command::Menu(menu) => vec![self.menu(menu)],
            Command::Help => vec![self.help()],
            Command::GetStat => vec![self.status()],
            Command::On => self.switch(true),
            Command::Off => self.switch(false),
            Command::TempUp => self.temp_step(true),
            Command::TempDown => self.temp_step(false),
            Command::SetTemp(arg) => self.set_temp(arg),
            Command::Swing => self.toggle("swing", VestelRemote::swing, AcState::swing),
            Command::Speed(speed) => self.speed(speed),
            Command::Mode(mode) => self.mode(mode),
            Command::Health => self.toggle("health", VestelRemote::health, AcState::health),
            Command::Strong => self.toggle("strong", VestelRemote::strong, AcState::strong),
            Command::Sleep => self.toggle("sleep", VestelRemote::sleep, AcState::sleep),
            Command::Screen => self.toggle("screen", VestelRemote::screen, AcState::screen),
            Command::Clean => self.clean(),
            Command::Fresh => self.toggle("fresh", VestelRemote::fresh, AcState::fresh),
            Command::Feeling => self.toggle("feeling", VestelRemote::feeling, AcState::feeling),
            Command::FungusProof => self.fungus_proof(),
            Command::TimerUp => {
                self.turn_dial(true);
                vec![self.timer_dial_message()]
            }
            Command::TimerDown => {
                self.turn_dial(false);
                vec![self.timer_dial_message()]
            }
            Command::TimerGet => vec![self.timer_get()],
            Command::TimerSet(arg) => self.timer_set(arg),
            Command::TimerUnset => {
                self.timer_dial = 0.0;
                self.timer_set(None)
            }
            Command::Shutdown => {
                self.deferred = Some(HostAction::Shutdown);
                vec![Outgoing::reply("`Shutting down`")]
            }
            Command::Restart => {
                self.deferred = Some(HostAction::Restart);
                vec![Outgoing::reply("`Restarting`")]
            }
            Command::CpuTemp => match self.host.cpu_temperature() {
                Ok(temp) => vec![Outgoing::reply(format!("`CPU temperature: {}`", temp))],
                Err(e) => {
                    error!("could not read cpu temperature: {}", e);
                    vec![Outgoing::reply("`Could not read the CPU temperature`")]
                }
            },
        }
    }
}
