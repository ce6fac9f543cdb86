use crate::ir::types::{IrEncodeError, IrFormat, IrPulse, IrSequence};

/// Pulse distance coding with a 9ms/4.5ms leader, as used by the Vestel
/// remote and most NEC-derived consumer formats.
pub struct Nec {}

impl Nec {
    const LEADER_MARK: u128 = 9000;
    const LEADER_SPACE: u128 = 4500;
    const ONE_SPACE: u128 = 1688;
}

impl IrFormat for Nec {
    const STD_CYCLE: u128 = 562;

    fn encode<T: AsRef<str>>(bits: T) -> Result<IrSequence, IrEncodeError> {
        let bits = bits.as_ref();
        if bits.is_empty() {
            return Err(IrEncodeError::Empty);
        }

        let mut code = Vec::with_capacity(bits.len() * 2 + 3);

        // leader
        code.push(Self::LEADER_MARK);
        code.push(Self::LEADER_SPACE);

        // data, already in transmission order
        for (i, bit) in bits.chars().enumerate() {
            code.push(Self::STD_CYCLE);
            match bit {
                '0' => code.push(Self::STD_CYCLE),
                '1' => code.push(Self::ONE_SPACE),
                other => return Err(IrEncodeError::InvalidBit(other, i)),
            }
        }

        // trailing mark
        code.push(Self::STD_CYCLE);

        Ok(IrSequence(code.into_iter().map(IrPulse).collect()))
    }
}
