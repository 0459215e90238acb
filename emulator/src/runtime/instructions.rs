use tracing::debug;

use super::registers::Flags;
use super::Machine;
use crate::bits::extract_bits;
use crate::constants::Word;

/// The 16 operations of the machine, tagged with their 4-bit codes.
///
/// The set is closed: codes map to variants through a total lookup in
/// [`Opcode::from_code`], and `0b0000` maps to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, parse_display::Display, parse_display::FromStr)]
#[display(style = "UPPERCASE")]
pub enum Opcode {
    /// Push the word in the next cell onto the stack
    Push = 0b0001,

    /// Pop an address, push the word it points at
    Read = 0b0010,

    /// Pop an address, pop a value, store the value at the address
    Write = 0b0011,

    /// Push a copy of the stack top
    Dup = 0b0100,

    /// Discard the stack top
    Drop = 0b0101,

    /// Pop a target address and jump to it
    Jmp = 0b0110,

    /// Pop a value and append its decimal form to the output log
    Out = 0b0111,

    /// Pop two values and set the comparison flags
    Cmp = 0b1000,

    /// Increment the stack top in place
    Inc = 0b1001,

    /// Decrement the stack top in place
    Dec = 0b1010,

    /// Pop a target, jump if the last CMP saw equal values
    Je = 0b1011,

    /// Pop a target, jump if the last CMP saw a greater top
    Jg = 0b1100,

    /// Pop two values, push their wrapping sum
    Add = 0b1101,

    /// Pop a target, jump if the last CMP saw a greater second value
    Jl = 0b1110,

    /// Clear the whole flag register, halting the machine
    Hlt = 0b1111,
}

impl Opcode {
    /// The 4-bit numeric code of this operation.
    #[must_use]
    pub const fn code(self) -> Word {
        self as Word
    }

    /// Maps a 4-bit code back to its operation. Total over the code
    /// space: `0b0000` and anything above `0b1111` yield `None`.
    #[must_use]
    pub const fn from_code(code: Word) -> Option<Self> {
        match code {
            0b0001 => Some(Self::Push),
            0b0010 => Some(Self::Read),
            0b0011 => Some(Self::Write),
            0b0100 => Some(Self::Dup),
            0b0101 => Some(Self::Drop),
            0b0110 => Some(Self::Jmp),
            0b0111 => Some(Self::Out),
            0b1000 => Some(Self::Cmp),
            0b1001 => Some(Self::Inc),
            0b1010 => Some(Self::Dec),
            0b1011 => Some(Self::Je),
            0b1100 => Some(Self::Jg),
            0b1101 => Some(Self::Add),
            0b1110 => Some(Self::Jl),
            0b1111 => Some(Self::Hlt),
            _ => None,
        }
    }

    /// Decodes an instruction word: only the low 4 bits carry the
    /// opcode, the rest of the word is ignored.
    #[must_use]
    pub const fn decode(word: Word) -> Option<Self> {
        Self::from_code(extract_bits(word, 0, 3))
    }

    /// Executes exactly one instruction's effect on the machine.
    ///
    /// `pc` advances by one past the instruction (and its operand cell
    /// for PUSH) unless the instruction itself sets it.
    pub(crate) fn execute(self, machine: &mut Machine) {
        match self {
            Self::Push => {
                // The operand lives in the next cell, as a plain word
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
                let value = machine.memory.get(machine.registers.pc);
                machine.push(value);
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Read => {
                let address = machine.pop();
                let value = machine.memory.get(address);
                machine.push(value);
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Write => {
                let address = machine.pop();
                let value = machine.pop();
                machine.memory.set(address, value);
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Dup => {
                let top = machine.memory.get(machine.top_address());
                machine.push(top);
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Drop => {
                machine.registers.sp = machine.registers.sp.wrapping_sub(1);
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Jmp => {
                let target = machine.pop();
                debug!(target, "Jumping");
                machine.registers.pc = target;
            }

            Self::Out => {
                let value = machine.pop();
                debug!(value, "Output");
                machine.output.push(value.to_string());
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Cmp => {
                let b = machine.pop();
                let a = machine.pop();
                let mut flag = Flags::RUNNING;
                if b > a {
                    flag |= Flags::TOP_GREATER;
                } else if a > b {
                    flag |= Flags::SECOND_GREATER;
                }
                debug!(top = b, second = a, result = ?flag, "Compared");
                machine.registers.flag = flag;
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Inc => {
                let address = machine.top_address();
                let value = machine.memory.get(address).wrapping_add(1);
                machine.memory.set(address, value);
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Dec => {
                let address = machine.top_address();
                let value = machine.memory.get(address).wrapping_sub(1);
                machine.memory.set(address, value);
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Je => {
                let target = machine.pop();
                if machine
                    .registers
                    .flag
                    .intersection(Flags::TOP_GREATER | Flags::SECOND_GREATER)
                    .is_empty()
                {
                    debug!(target, "Equal, jumping");
                    machine.registers.pc = target;
                } else {
                    machine.registers.pc = machine.registers.pc.wrapping_add(1);
                }
            }

            Self::Jg => {
                let target = machine.pop();
                if machine.registers.flag.contains(Flags::TOP_GREATER) {
                    debug!(target, "Top was greater, jumping");
                    machine.registers.pc = target;
                } else {
                    machine.registers.pc = machine.registers.pc.wrapping_add(1);
                }
            }

            Self::Add => {
                let b = machine.pop();
                let a = machine.pop();
                machine.push(a.wrapping_add(b));
                machine.registers.pc = machine.registers.pc.wrapping_add(1);
            }

            Self::Jl => {
                let target = machine.pop();
                if machine.registers.flag.contains(Flags::SECOND_GREATER) {
                    debug!(target, "Second was greater, jumping");
                    machine.registers.pc = target;
                } else {
                    machine.registers.pc = machine.registers.pc.wrapping_add(1);
                }
            }

            Self::Hlt => {
                debug!("Halting");
                // The whole register clears, comparison bits included
                machine.registers.flag = Flags::empty();
            }
        }
    }
}

/// A decoded memory cell, as shown in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListedCell {
    /// The cell holds exactly an opcode word.
    Op(Opcode),

    /// The cell holds data: a PUSH operand or anything that is not an
    /// opcode.
    Literal(Word),
}

impl std::fmt::Display for ListedCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Op(op) => write!(f, "{op}"),
            Self::Literal(value) => write!(f, "{value}"),
        }
    }
}

/// Decodes a word stream back into mnemonics, one entry per cell.
///
/// Cells following a PUSH are its operands and decode as raw integers,
/// as does any cell whose full value matches no opcode. Note the
/// contrast with the executing decoder, which masks the low nibble.
#[must_use]
pub fn disassemble(words: &[Word]) -> Vec<ListedCell> {
    let mut cells = Vec::with_capacity(words.len());
    let mut iter = words.iter().copied();
    while let Some(word) = iter.next() {
        match Opcode::from_code(word) {
            Some(op) => {
                cells.push(ListedCell::Op(op));
                if op == Opcode::Push {
                    if let Some(operand) = iter.next() {
                        cells.push(ListedCell::Literal(operand));
                    }
                }
            }
            None => cells.push(ListedCell::Literal(word)),
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn code_round_trip_test() {
        for code in 1..=15 {
            let op = Opcode::from_code(code).unwrap();
            assert_eq!(op.code(), code);
        }
        assert_eq!(Opcode::from_code(0), None);
        assert_eq!(Opcode::from_code(16), None);
    }

    #[test]
    fn decode_masks_low_nibble_test() {
        // The executing decoder only looks at bits 0-3
        assert_eq!(Opcode::decode(0b1_0001), Some(Opcode::Push));
        assert_eq!(Opcode::decode(0b1111), Some(Opcode::Hlt));
        assert_eq!(Opcode::decode(0b1_0000), None);
    }

    #[test]
    fn mnemonic_round_trip_test() {
        for code in 1..=15 {
            let op = Opcode::from_code(code).unwrap();
            assert_eq!(op.to_string().parse::<Opcode>().unwrap(), op);
        }
        assert_eq!("PUSH".parse::<Opcode>().unwrap(), Opcode::Push);
        assert_eq!("HLT".parse::<Opcode>().unwrap(), Opcode::Hlt);
        assert!("NOP".parse::<Opcode>().is_err());
    }

    #[test]
    fn disassemble_test() {
        let words = vec![
            Opcode::Push.code(),
            10,
            Opcode::Push.code(),
            20,
            Opcode::Add.code(),
            Opcode::Out.code(),
            Opcode::Hlt.code(),
        ];
        assert_eq!(
            disassemble(&words),
            vec![
                ListedCell::Op(Opcode::Push),
                ListedCell::Literal(10),
                ListedCell::Op(Opcode::Push),
                ListedCell::Literal(20),
                ListedCell::Op(Opcode::Add),
                ListedCell::Op(Opcode::Out),
                ListedCell::Op(Opcode::Hlt),
            ]
        );
    }

    #[test]
    fn disassemble_push_operand_collision_test() {
        // A PUSH operand equal to an opcode value must stay a literal
        let words = vec![Opcode::Push.code(), Opcode::Push.code(), Opcode::Hlt.code()];
        assert_eq!(
            disassemble(&words),
            vec![
                ListedCell::Op(Opcode::Push),
                ListedCell::Literal(1),
                ListedCell::Op(Opcode::Hlt),
            ]
        );
    }
}
