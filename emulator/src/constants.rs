/// The machine's only numeric type. Memory cells, registers and opcodes
/// all share this 32-bit unsigned representation, with wrapping
/// arithmetic everywhere.
pub type Word = u32;

/// Total number of memory cells.
pub const MEMORY_SIZE: usize = 1024;

/// First cell of the operand stack region.
pub const STACK_START: Word = 72;

/// Last cell of the operand stack region (inclusive).
pub const STACK_END: Word = 87;

/// Number of cells in the operand stack region.
pub const STACK_SIZE: usize = (STACK_END - STACK_START + 1) as usize;

/// Cells left free between two consecutive array literals, used as
/// scratch space by programs that store a derived value past an array.
pub(crate) const ARRAY_GAP: Word = 3;
