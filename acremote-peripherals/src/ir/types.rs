use itertools::Itertools;
use num_traits::AsPrimitive;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct IrPulse(pub u128);

impl IrPulse {
    pub fn into_inner(self) -> u128 {
        self.0
    }

    pub fn duration(self) -> Duration {
        Duration::from_micros(AsPrimitive::<u64>::as_(self))
    }
}

impl AsPrimitive<u128> for IrPulse {
    fn as_(self) -> u128 {
        self.0
    }
}

impl AsPrimitive<u64> for IrPulse {
    fn as_(self) -> u64 {
        self.0.as_()
    }
}

impl AsPrimitive<usize> for IrPulse {
    fn as_(self) -> usize {
        self.0.as_()
    }
}

/// Alternating mark and space lengths in microseconds, starting with a mark.
#[derive(Debug, Clone, PartialOrd, PartialEq)]
pub struct IrSequence(pub Vec<IrPulse>);

impl IrSequence {
    pub fn into_inner(self) -> Vec<IrPulse> {
        self.0
    }

    pub fn marks(&self) -> impl Iterator<Item = &IrPulse> {
        self.0.iter().step_by(2)
    }

    pub fn spaces(&self) -> impl Iterator<Item = &IrPulse> {
        self.0.iter().skip(1).step_by(2)
    }
}

impl AsRef<[IrPulse]> for IrSequence {
    fn as_ref(&self) -> &[IrPulse] {
        &self.0
    }
}

impl Display for IrSequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.iter().map(|p| p.0).join(", "))
    }
}

pub trait IrFormat {
    const CARRIER_FREQUENCY: f64 = 38_000.0;
    const DUTY_CYCLE: f64 = 0.5;
    const STD_CYCLE: u128;
    fn encode<T: AsRef<str>>(bits: T) -> Result<IrSequence, IrEncodeError>;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrEncodeError {
    #[error("No bits to encode")]
    Empty,
    #[error("Invalid bit {0:?} at position {1}")]
    InvalidBit(char, usize),
}

/// Sink for the rendered bit string of a frame.
///
/// Implementations own their failure handling; callers only see whether the
/// hand-off worked.
pub trait Transmitter {
    type Error: std::error::Error + Send + Sync + 'static;
    fn transmit(&mut self, bits: &str) -> Result<(), Self::Error>;
}

impl<T: Transmitter + ?Sized> Transmitter for Box<T> {
    type Error = T::Error;

    fn transmit(&mut self, bits: &str) -> Result<(), Self::Error> {
        (**self).transmit(bits)
    }
}

impl<T: Transmitter + ?Sized> Transmitter for &mut T {
    type Error = T::Error;

    fn transmit(&mut self, bits: &str) -> Result<(), Self::Error> {
        (**self).transmit(bits)
    }
}
