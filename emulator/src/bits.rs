//! Bit-field extraction, shared by the instruction decoder and the flag
//! register.

use crate::constants::Word;

/// Extracts the inclusive bit range `[start, end]` of a word, bit 0
/// being the least significant.
///
/// Works for single-bit ranges (`start == end`).
#[must_use]
pub const fn extract_bits(word: Word, start: u32, end: u32) -> Word {
    (word << (31 - end)) >> (start + 31 - end)
}
