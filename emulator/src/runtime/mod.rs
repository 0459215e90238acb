//! The machine itself: unified memory, registers and the
//! fetch-decode-execute step.

use thiserror::Error;
use tracing::{debug, trace};

use crate::constants as C;

mod instructions;
mod memory;
mod registers;

pub use self::instructions::{disassemble, ListedCell, Opcode};
pub use self::memory::Memory;
pub use self::registers::{Flags, Registers};

/// Errors surfaced by [`Machine::step`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    /// The cell fetched at `pc` does not decode to any of the 16
    /// opcodes. Fatal: execution cannot continue.
    #[error("invalid opcode {code:#06b} at address {address}")]
    InvalidOpcode { address: C::Word, code: C::Word },

    /// The running flag was already clear. Inert rather than fatal:
    /// stepping a halted machine changes nothing.
    #[error("machine is halted")]
    Halted,
}

/// A named block of data words placed in memory before execution.
///
/// The name only exists for the assembler's benefit; the machine loads
/// the values and forgets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLiteral {
    pub name: String,
    pub start: C::Word,
    pub values: Vec<C::Word>,
}

/// Read-only copy of the machine state, taken after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    pub registers: Registers,

    /// The full memory contents.
    pub memory: Vec<C::Word>,

    /// The live stack slice: `memory[stack_start..stack_start + sp]`,
    /// capped at the 16 cells of the region.
    pub stack: Vec<C::Word>,

    /// The output log accumulated by OUT.
    pub output: Vec<String>,
}

#[derive(Default)]
pub struct Machine {
    pub registers: Registers,
    pub memory: Memory,
    output: Vec<String>,
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Machine {{ registers: {:?}, memory: [...] }}",
            self.registers
        )
    }
}

impl Machine {
    /// Loads a program: zeroes the memory, places each array at its
    /// start address, writes the instruction stream at address 0 and
    /// resets registers and output log.
    ///
    /// Instructions are not offset to avoid the stack or array regions;
    /// the caller keeps the stream shorter than the stack base and the
    /// array starts past the stack end.
    pub fn load(&mut self, instructions: &[C::Word], arrays: &[ArrayLiteral]) {
        self.memory.clear();

        for array in arrays {
            for (offset, &value) in array.values.iter().enumerate() {
                self.memory
                    .set(array.start.wrapping_add(offset as C::Word), value);
            }
        }

        for (address, &word) in instructions.iter().enumerate() {
            self.memory.set(address as C::Word, word);
        }

        self.registers = Registers::default();
        self.output.clear();
        debug!(
            instructions = instructions.len(),
            arrays = arrays.len(),
            "Loaded program"
        );
    }

    /// Whether the running flag bit is set.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.registers.flag.contains(Flags::RUNNING)
    }

    /// Fetches, decodes and executes exactly one instruction.
    ///
    /// # Errors
    ///
    /// [`StepError::Halted`] when the running flag is already clear,
    /// [`StepError::InvalidOpcode`] when the fetched cell decodes to
    /// nothing.
    pub fn step(&mut self) -> Result<(), StepError> {
        if !self.is_running() {
            return Err(StepError::Halted);
        }

        let address = self.registers.pc;
        let word = self.memory.get(address);
        let code = crate::bits::extract_bits(word, 0, 3);
        let opcode =
            Opcode::from_code(code).ok_or(StepError::InvalidOpcode { address, code })?;

        trace!(%opcode, pc = address, "Executing");
        opcode.execute(self);
        Ok(())
    }

    /// The output log accumulated so far.
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Takes a read-only copy of the whole machine state.
    #[must_use]
    pub fn snapshot(&self) -> MachineState {
        let memory = self.memory.as_slice().to_vec();
        let stack = memory
            [C::STACK_START as usize..=C::STACK_END as usize]
            .iter()
            .take(self.registers.sp as usize)
            .copied()
            .collect();

        MachineState {
            registers: self.registers.clone(),
            memory,
            stack,
            output: self.output.clone(),
        }
    }

    /// Absolute address of the next free stack slot. Wrapping: an
    /// underflowed `sp` addresses cells below the region.
    fn stack_address(&self) -> C::Word {
        C::STACK_START.wrapping_add(self.registers.sp)
    }

    /// Absolute address of the current stack top.
    fn top_address(&self) -> C::Word {
        C::STACK_START.wrapping_add(self.registers.sp.wrapping_sub(1))
    }

    fn push(&mut self, value: C::Word) {
        self.memory.set(self.stack_address(), value);
        self.registers.sp = self.registers.sp.wrapping_add(1);
    }

    fn pop(&mut self) -> C::Word {
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        self.memory.get(self.stack_address())
    }
}
