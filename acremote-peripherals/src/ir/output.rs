use std::convert::Infallible;
use std::iter;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use rppal::gpio::{Gpio, PwmPulse, PwmStep};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::spawn_blocking;

use crate::ir::format::Nec;
use crate::ir::types::{IrEncodeError, IrFormat, IrSequence, Transmitter};
use crate::GpioError;

pub const IR_OUTPUT_PIN: u8 = 13;

const WAIT_TIMEOUT: Duration = Duration::from_micros(100);

#[derive(Error, Debug)]
pub enum IrOutError {
    #[error(transparent)]
    Gpio(#[from] GpioError),
    #[error(transparent)]
    Encode(#[from] IrEncodeError),
    #[error("Could not send message to ir thread")]
    Send,
}

pub type Result<T> = std::result::Result<T, IrOutError>;

fn carrier_period() -> Duration {
    Duration::from_micros((1_000_000.0 / Nec::CARRIER_FREQUENCY) as u64)
}

/// Marks become bursts of carrier pulses, spaces become plain waits.
fn pwm_steps(seq: IrSequence) -> Vec<PwmStep> {
    let period = carrier_period();
    let pulse_width = Duration::from_micros((period.as_micros() as f64 * Nec::DUTY_CYCLE) as u64);
    seq.into_inner()
        .into_iter()
        .enumerate()
        .fold(Vec::new(), |mut acc, (i, pulse)| {
            if i % 2 == 0 {
                acc.extend(
                    iter::repeat(PwmStep::Pulse(PwmPulse {
                        period,
                        pulse_width,
                    }))
                    .take((pulse.into_inner() / period.as_micros()) as usize),
                );
            } else {
                acc.push(PwmStep::Wait(pulse.duration()));
            }
            acc
        })
}

/// IR LED on a GPIO pin, driven from a blocking worker so a long frame never
/// stalls the caller.
pub struct IrOut {
    pin: u8,
    sequence_sender: mpsc::Sender<IrSequence>,
    send_stop_sender: watch::Sender<bool>,
}

impl IrOut {
    /// Must be called from within a tokio runtime.
    pub fn start(pin: u8) -> Result<IrOut> {
        let out = Arc::new(Mutex::new(
            Gpio::new()
                .map_err(|_| GpioError::Initialization)?
                .get(pin)
                .map_err(|_| GpioError::Pin(pin))?
                .into_output(),
        ));
        let (send_stop_sender, send_stop_receiver) = watch::channel(false);
        let (sequence_sender, sequence_receiver) = mpsc::channel::<IrSequence>();
        spawn_blocking(move || loop {
            if *send_stop_receiver.borrow() {
                trace!("stopping ir sender thread");
                break;
            }

            match sequence_receiver.recv_timeout(WAIT_TIMEOUT) {
                Ok(seq) => match out.lock() {
                    Err(_) => {
                        error!("Could not get lock for ir output!");
                    }
                    Ok(mut o) => {
                        if let Err(e) = o.set_pwm_sequence(pwm_steps(seq), false) {
                            error!("Could not set up pwm for ir output: {:?}", e);
                        }
                    }
                },
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    // nothing queued, loop to check for stop
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    info!("ir sequence sender disconnected before stop signal");
                    break;
                }
            }
        });
        info!("ir output started on gpio {}", pin);
        Ok(IrOut {
            pin,
            sequence_sender,
            send_stop_sender,
        })
    }

    pub fn default_pin() -> Result<IrOut> {
        Self::start(IR_OUTPUT_PIN)
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn send(&self, seq: IrSequence) -> Result<()> {
        debug!("sending sequence: {}", seq);
        self.sequence_sender
            .send(seq)
            .map_err(|_| IrOutError::Send)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.send_stop_sender
            .send(true)
            .map_err(|_| IrOutError::Send)
    }
}

impl Transmitter for IrOut {
    type Error = IrOutError;

    fn transmit(&mut self, bits: &str) -> Result<()> {
        let seq = Nec::encode(bits)?;
        self.send(seq)
    }
}

impl Drop for IrOut {
    fn drop(&mut self) {
        if self.stop().is_err() {
            trace!("ir sender thread already gone");
        }
    }
}

/// Logs frames instead of sending them, for machines without the LED.
#[derive(Debug, Default)]
pub struct DryRun {
    sent: Vec<String>,
}

impl DryRun {
    pub fn new() -> DryRun {
        DryRun::default()
    }

    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

impl Transmitter for DryRun {
    type Error = Infallible;

    fn transmit(&mut self, bits: &str) -> std::result::Result<(), Infallible> {
        info!("dry run, not sending {}", bits);
        self.sent.push(bits.to_string());
        Ok(())
    }
}
