//! Addressing pass: walks the line list once, binding labels to
//! instruction addresses and assigning array literals their place in
//! memory.

use std::collections::HashMap;

use crate::constants as C;
use crate::parser::Line;
use crate::runtime::{ArrayLiteral, Opcode};

pub(crate) type Labels<'a> = HashMap<&'a str, C::Word>;

pub(crate) struct Layout<'a> {
    pub labels: Labels<'a>,
    pub arrays: Vec<ArrayLiteral>,
}

/// Computes label addresses and array placements.
///
/// The address counter must advance by exactly as many cells as the
/// emission pass will produce for each line. JL, JG and JE compile to a
/// PUSH pair ahead of the jump opcode and are counted as three cells.
/// JMP compiles to the same three cells but is counted as two, so a
/// label recorded after a JMP lands one cell short. Inherited from the
/// original machine, kept as is.
///
/// A label defined twice keeps its last binding.
pub(crate) fn layout<'a>(lines: &[Line<'a>]) -> Layout<'a> {
    let mut labels = Labels::new();
    let mut arrays: Vec<ArrayLiteral> = Vec::new();
    let mut address: C::Word = 0;

    for line in lines {
        match line {
            Line::Label(name) => {
                labels.insert(*name, address);
            }

            Line::Array { name, values } => {
                let start = arrays.last().map_or(C::STACK_END + 1, |previous| {
                    previous.start + previous.values.len() as C::Word + C::ARRAY_GAP
                });
                arrays.push(ArrayLiteral {
                    name: (*name).to_string(),
                    start,
                    values: values.clone(),
                });
            }

            Line::Instruction { opcode, operand } => {
                if operand.is_some() {
                    if matches!(opcode, Opcode::Jl | Opcode::Jg | Opcode::Je) {
                        address += 1;
                    }
                    address += 1;
                }
                address += 1;
            }
        }
    }

    Layout { labels, arrays }
}
