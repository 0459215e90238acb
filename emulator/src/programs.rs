//! Built-in demonstration programs, shipped as raw word streams.

use crate::assembler::Assembled;
use crate::runtime::{ArrayLiteral, Opcode};

/// Finds the largest element of a length-prefixed array and prints it.
///
/// The array's first cell holds the element count; the result is
/// written to the cell just past the last element. The stream is kept
/// in raw words rather than mnemonic source because its jump targets
/// (the loop head at 13 and the epilogue at 54) are hand-resolved.
#[must_use]
pub fn array_max() -> Assembled {
    use Opcode::{Add, Cmp, Dec, Dup, Hlt, Inc, Je, Jg, Jmp, Out, Push, Read, Write};

    let instructions = vec![
        // Seed the result cell with the first element
        Push.code(),
        89,
        Read.code(),
        Push.code(),
        88,
        Read.code(),
        Push.code(),
        89,
        Add.code(),
        Write.code(),
        // Loop counter starts at the element count
        Push.code(),
        88,
        Read.code(),
        // Loop head, address 13: count down and stop at zero
        Dec.code(),
        Dup.code(),
        Push.code(),
        0,
        Cmp.code(),
        Push.code(),
        54,
        Je.code(),
        // Compare the current element against the running maximum
        Dup.code(),
        Inc.code(),
        Push.code(),
        88,
        Add.code(),
        Read.code(),
        Push.code(),
        88,
        Read.code(),
        Push.code(),
        89,
        Add.code(),
        Read.code(),
        Cmp.code(),
        Push.code(),
        13,
        Jg.code(),
        // New maximum: store it in the result cell
        Dup.code(),
        Inc.code(),
        Push.code(),
        88,
        Add.code(),
        Read.code(),
        Push.code(),
        88,
        Read.code(),
        Push.code(),
        89,
        Add.code(),
        Write.code(),
        Push.code(),
        13,
        Jmp.code(),
        // Epilogue, address 54: print the result
        Push.code(),
        88,
        Read.code(),
        Push.code(),
        89,
        Add.code(),
        Read.code(),
        Out.code(),
        Hlt.code(),
    ];

    let arrays = vec![ArrayLiteral {
        name: "data".to_string(),
        start: 88,
        values: vec![10, 77, 15, 3, 18, 7, 1, 111, 53, 11, 21],
    }];

    Assembled {
        instructions,
        arrays,
    }
}
