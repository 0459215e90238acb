use bitflags::bitflags;

use crate::constants as C;

bitflags! {
    /// The 3-bit flag register.
    ///
    /// The two comparison bits are rewritten by every CMP; both clear
    /// means the compared values were equal.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Flags: C::Word {
        /// The machine may execute. Cleared by HLT, never set again
        /// until the next load.
        const RUNNING        = 0b001;

        /// Set by CMP when the value popped first (the stack top at
        /// comparison time) was the greater one.
        const TOP_GREATER    = 0b010;

        /// Set by CMP when the value popped second was the greater one.
        const SECOND_GREATER = 0b100;
    }
}

impl Default for Flags {
    fn default() -> Self {
        // On load only the running bit is set, no comparison happened yet
        Flags::RUNNING
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#05b}", self.bits())
    }
}

/// Register file of the machine.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    /// Program counter: absolute address of the next instruction to
    /// fetch.
    pub pc: C::Word,

    /// Stack pointer: zero-based offset into the stack region pointing
    /// at the next free slot. Not bounds-checked.
    pub sp: C::Word,

    /// Flag register.
    pub flag: Flags,
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "%pc = {} | %sp = {} | flag = {:03b}",
            self.pc,
            self.sp,
            self.flag.bits()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_flags_test() {
        assert_eq!(Flags::default().bits(), 0b001);
        assert!(Flags::default().contains(Flags::RUNNING));
    }

    #[test]
    fn registers_display_test() {
        let registers = Registers::default();
        assert_eq!(registers.to_string(), "%pc = 0 | %sp = 0 | flag = 001");
    }
}
