//! Emission pass: walks the line list a second time and produces the
//! final instruction word stream, resolving jump labels and PUSH
//! operands against the layout.

use crate::constants as C;
use crate::parser::Line;
use crate::runtime::{ArrayLiteral, Opcode};

use super::layout::Layout;
use super::AssemblerError;

/// Emits the instruction word stream for an already laid-out program.
///
/// Cell counts must match [`super::layout::layout`] exactly: a PUSH
/// with an operand is two cells, JL/JG/JE and JMP expand to a PUSH
/// pair ahead of the jump opcode, everything else is one cell. A PUSH
/// or jump with no operand emits nothing at all; a stray operand on
/// any other opcode is ignored.
pub(crate) fn emit(lines: &[Line<'_>], layout: &Layout<'_>) -> Result<Vec<C::Word>, AssemblerError> {
    let mut program = Vec::new();

    for line in lines {
        let Line::Instruction { opcode, operand } = line else {
            continue;
        };

        match opcode {
            Opcode::Push => {
                if let Some(token) = operand {
                    program.push(Opcode::Push.code());
                    program.push(resolve_push(token, &layout.arrays)?);
                }
            }

            Opcode::Jmp | Opcode::Jl | Opcode::Jg | Opcode::Je => {
                if let Some(label) = operand {
                    let target = layout.labels.get(label).copied().ok_or_else(|| {
                        AssemblerError::UndefinedLabel {
                            label: (*label).to_string(),
                        }
                    })?;
                    program.push(Opcode::Push.code());
                    program.push(target);
                    program.push(opcode.code());
                }
            }

            _ => program.push(opcode.code()),
        }
    }

    Ok(program)
}

/// Resolves a PUSH operand to the word it loads.
///
/// `name+k` is the address `k` cells past the start of array `name`.
/// A bare array name always resolves to the cell just past the stack
/// region, whichever array it names; the original machine resolved it
/// that way and programs depend on it.
fn resolve_push(token: &str, arrays: &[ArrayLiteral]) -> Result<C::Word, AssemblerError> {
    if let Some((name, increase)) = token.split_once('+') {
        if let Some(array) = arrays.iter().find(|array| array.name == name) {
            let offset: C::Word =
                increase
                    .parse()
                    .map_err(|_| AssemblerError::UndefinedIncrease {
                        token: token.to_string(),
                    })?;
            return Ok(array.start.wrapping_add(offset));
        }
    } else if arrays.iter().any(|array| array.name == token) {
        return Ok(C::STACK_END + 1);
    }

    token.parse().map_err(|_| AssemblerError::InvalidOperand {
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn array(name: &str, start: C::Word, values: &[C::Word]) -> ArrayLiteral {
        ArrayLiteral {
            name: name.to_string(),
            start,
            values: values.to_vec(),
        }
    }

    #[test]
    fn resolve_decimal_literal_test() {
        assert_eq!(resolve_push("42", &[]), Ok(42));
    }

    #[test]
    fn resolve_indexed_array_test() {
        let arrays = vec![array("data", 88, &[1, 2, 3]), array("more", 94, &[4])];
        assert_eq!(resolve_push("data+0", &arrays), Ok(88));
        assert_eq!(resolve_push("more+2", &arrays), Ok(96));
    }

    #[test]
    fn resolve_bare_name_ignores_placement_test() {
        // Both names resolve to the first cell past the stack region
        let arrays = vec![array("data", 88, &[1, 2, 3]), array("more", 94, &[4])];
        assert_eq!(resolve_push("data", &arrays), Ok(C::STACK_END + 1));
        assert_eq!(resolve_push("more", &arrays), Ok(C::STACK_END + 1));
    }

    #[test]
    fn resolve_bad_increase_test() {
        let arrays = vec![array("data", 88, &[1])];
        assert_eq!(
            resolve_push("data+x", &arrays),
            Err(AssemblerError::UndefinedIncrease {
                token: "data+x".to_string()
            })
        );
    }

    #[test]
    fn resolve_unknown_name_test() {
        assert_eq!(
            resolve_push("nothing", &[]),
            Err(AssemblerError::InvalidOperand {
                token: "nothing".to_string()
            })
        );
    }
}
