//! Two-pass translation from mnemonic text to the machine's numeric
//! word stream.
//!
//! The parser builds the line list once; the layout pass walks it to
//! bind labels to instruction addresses and place array literals, and
//! the emission pass walks it again to produce the final words. Both
//! passes must agree exactly on instruction lengths, and they inherit
//! the original machine's addressing quirks (see [`layout`]).

use thiserror::Error;
use tracing::debug;

use crate::constants as C;
use crate::parser::parse_program;
pub use crate::parser::SyntaxError;
use crate::runtime::ArrayLiteral;

mod emit;
mod layout;

/// Errors rejecting a whole assembly. Nothing is loaded on failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblerError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A jump names a label no line defined.
    #[error("undefined label: {label}")]
    UndefinedLabel { label: String },

    /// An `array+k` operand whose `k` is not an integer.
    #[error("undefined increase: {token}")]
    UndefinedIncrease { token: String },

    /// A PUSH operand that is neither a decimal literal nor an array
    /// reference.
    #[error("invalid operand: {token}")]
    InvalidOperand { token: String },
}

/// The assembler's output, ready for [`crate::runtime::Machine::load`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assembled {
    /// The flat instruction word stream, entry point at index 0.
    pub instructions: Vec<C::Word>,

    /// Array literals with their resolved start addresses.
    pub arrays: Vec<ArrayLiteral>,
}

/// Assembles a whole program source.
///
/// # Errors
///
/// See [`AssemblerError`]; any failure rejects the whole program.
pub fn assemble(source: &str) -> Result<Assembled, AssemblerError> {
    let lines = parse_program(source)?;
    let layout = layout::layout(&lines);
    let instructions = emit::emit(&lines, &layout)?;
    debug!(
        instructions = instructions.len(),
        arrays = layout.arrays.len(),
        labels = layout.labels.len(),
        "Assembled program"
    );
    Ok(Assembled {
        instructions,
        arrays: layout.arrays,
    })
}
