mod press;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use acremote_peripherals::ir::format::Nec;
use acremote_peripherals::ir::output::{DryRun, IrOut, IR_OUTPUT_PIN};
use acremote_peripherals::ir::types::{IrFormat, Transmitter};
use acremote_peripherals::ir::vestel::frame::VestelFrame;
use acremote_peripherals::ir::vestel::state::AcState;
use acremote_peripherals::ir::vestel::types::{InvalidValue, Mode, Speed, VestelTemperature};
use acremote_peripherals::ir::vestel::{Outcome, VestelRemote};
use acremote_peripherals::state_file::StateFile;
use acremote_peripherals::thermo::{self, NoThermometer, ThermoError, Thermometer, W1Thermo};
use color_eyre::eyre::{Result, WrapErr};
use structopt::StructOpt;

use crate::press::{press, Action};

/// Room temperature given on the command line instead of read from a sensor.
struct FixedRoom(f32);

impl Thermometer for FixedRoom {
    fn read_current_temperature(&self) -> thermo::Result<f32> {
        Ok(self.0)
    }
}

#[derive(StructOpt, Debug)]
struct StateOpt {
    #[structopt(long)]
    on: bool,
    #[structopt(short, long, default_value = "cool")]
    mode: Mode,
    #[structopt(short, long, default_value = "high")]
    speed: Speed,
    #[structopt(short, long, default_value = "27")]
    temperature: VestelTemperature,
    #[structopt(long)]
    swing_off: bool,
    #[structopt(long)]
    health: bool,
    #[structopt(long)]
    strong: bool,
    #[structopt(long)]
    sleep: bool,
    #[structopt(long)]
    screen_off: bool,
    #[structopt(long)]
    clean: bool,
    #[structopt(long)]
    fresh: bool,
    #[structopt(long)]
    feeling: bool,
    /// Off timer in hours
    #[structopt(long, default_value = "0")]
    timer: f64,
    /// Room temperature to use with --feeling instead of the sensor
    #[structopt(long)]
    room: Option<f32>,
}

impl StateOpt {
    fn to_state(&self) -> std::result::Result<AcState, InvalidValue> {
        let mut state = AcState::default();
        state.set_clean(self.clean);
        state.set_power(self.on);
        state.set_mode(self.mode);
        state.set_speed(self.speed);
        state.set_temperature(self.temperature.celsius() as i64)?;
        state.set_swing(!self.swing_off);
        state.set_health(self.health);
        state.set_strong(self.strong);
        state.set_sleep(self.sleep);
        state.set_screen(!self.screen_off);
        state.set_fresh(self.fresh);
        state.set_feeling(self.feeling);
        state.set_timer(self.timer)?;
        Ok(state)
    }
}

#[derive(StructOpt, Debug)]
struct Hardware {
    /// Gpio pin of the ir led
    #[structopt(long, default_value = "13")]
    pin: u8,
    /// Log frames instead of sending them
    #[structopt(long)]
    dry_run: bool,
    #[structopt(long, default_value = "/var/lib/acremote/state.json")]
    state_file: PathBuf,
    #[structopt(long, default_value = "/sys/bus/w1/devices")]
    w1_base: PathBuf,
}

impl Hardware {
    fn thermometer(&self) -> Box<dyn Thermometer> {
        match W1Thermo::new(&self.w1_base) {
            Ok(t) => Box::new(t),
            Err(e) => {
                warn!("no 1-wire thermometer, feeling will not work: {}", e);
                Box::new(NoThermometer)
            }
        }
    }
}

#[derive(StructOpt, Debug)]
enum Opt {
    /// Print the frame for a set of settings without sending it
    Encode {
        /// Print the frame of a remote that has not been pressed yet
        #[structopt(long)]
        blank: bool,

        #[structopt(flatten)]
        state: StateOpt,
    },
    /// Press a button, starting from the saved state
    Press {
        action: Action,

        /// Temperature, speed, mode or timer hours for buttons that take one
        value: Option<String>,
    },
    /// Show the saved state
    Status,
    /// Read the 1-wire thermometers
    Thermo {
        /// Number of readings
        #[structopt(short, long, default_value = "1")]
        times: usize,
    },
    /// Print the pulse lengths for a bit string
    Pulses { bits: String },
}

#[derive(StructOpt, Debug)]
#[structopt(name = "acremote")]
struct Cli {
    #[structopt(flatten)]
    hardware: Hardware,

    #[structopt(subcommand)]
    opt: Opt,
}

fn print_status(state: &AcState, room: Option<f32>) {
    println!("AC Status:");
    for (label, value) in state.summary() {
        println!("{:<12}= {}", label, value);
        if label == "Temperature" {
            if let Some(room) = room {
                println!("{:<12}= {:.1}°C", "Room", room);
            }
        }
    }
}

fn run_press<T: Transmitter>(
    hardware: &Hardware,
    transmitter: T,
    action: Action,
    value: Option<&str>,
) -> Result<()> {
    let state_file = StateFile::new(&hardware.state_file);
    let state = state_file.load().wrap_err("Could not load saved state")?;
    let mut remote = VestelRemote::with_state(state, transmitter, hardware.thermometer());
    for outcome in press(&mut remote, action, value)? {
        match outcome {
            Outcome::Transmitted(frame) => println!("Sent {}", frame),
            Outcome::Skipped => println!(
                "Not sent, {} does nothing while the unit is {}",
                action,
                if remote.state().power() { "on" } else { "off" }
            ),
        }
    }
    state_file
        .save(remote.state())
        .wrap_err("Could not save state")?;
    print_status(remote.state(), None);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;

    let cli = Cli::from_args();

    debug!("opts: {:?}", cli);

    match cli.opt {
        Opt::Encode { blank, state } => {
            let frame = if blank {
                VestelFrame::blank()?
            } else {
                let ac_state = state.to_state()?;
                match state.room {
                    Some(room) => VestelFrame::encode(&ac_state, &FixedRoom(room))?,
                    None => VestelFrame::encode(&ac_state, &cli.hardware.thermometer())?,
                }
            };
            println!("Octets: {}", frame);
            println!("Bits: {}", frame.to_bits());
        }
        Opt::Press { action, value } => {
            if cli.hardware.dry_run {
                run_press(&cli.hardware, DryRun::new(), action, value.as_deref())?;
            } else {
                let mut ir_out = IrOut::start(cli.hardware.pin)
                    .wrap_err_with(|| format!("Could not open ir output (default pin {})", IR_OUTPUT_PIN))?;
                // sending continues in the background
                let result = run_press(&cli.hardware, &mut ir_out, action, value.as_deref());
                sleep(Duration::from_secs(1));
                ir_out.stop()?;
                result?;
            }
        }
        Opt::Status => {
            let state = StateFile::new(&cli.hardware.state_file)
                .load()
                .wrap_err("Could not load saved state")?;
            let room = match cli.hardware.thermometer().read_current_temperature() {
                Ok(room) => Some(room),
                Err(ThermoError::NoDevice) => None,
                Err(e) => {
                    warn!("could not read room temperature: {}", e);
                    None
                }
            };
            print_status(&state, room);
        }
        Opt::Thermo { times } => {
            let thermo = W1Thermo::new(&cli.hardware.w1_base)?;
            for i in 0..times {
                if i > 0 {
                    sleep(Duration::from_secs(1));
                }
                for device in thermo.devices() {
                    println!("{}: {:.3}°C", device, thermo.poll(device)?);
                }
            }
        }
        Opt::Pulses { bits } => {
            println!("{}", Nec::encode(bits).wrap_err("Could not encode bits")?);
        }
    }

    Ok(())
}
