//! Source line parsing.
//!
//! The program format is strictly line oriented: blank lines and `//`
//! comments are dropped, every remaining line is a label definition, an
//! instruction with an optional operand token, or an array literal.
//! Parsing is handled by the `nom` library and produces the explicit
//! line list both assembler passes consume.

use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, map_res, opt, verify};
use nom::multi::separated_list1;
use nom::sequence::{delimited, preceded, terminated};
use nom::{Finish, IResult};
use thiserror::Error;

use crate::constants::Word;
use crate::runtime::Opcode;

/// A single meaningful source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line<'a> {
    /// `name:` — binds a label to the current instruction address.
    Label(&'a str),

    /// A mnemonic with at most one operand token. The operand stays
    /// raw: its meaning (literal, label or array reference) depends on
    /// the opcode and is resolved at emission time.
    Instruction {
        opcode: Opcode,
        operand: Option<&'a str>,
    },

    /// `name v1,v2,...,vn` — a named block of data words.
    Array { name: &'a str, values: Vec<Word> },
}

/// A line the grammar cannot make sense of.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("syntax error on line {line}: {content:?}")]
pub struct SyntaxError {
    /// 1-based line number in the original source.
    pub line: usize,
    pub content: String,
}

fn is_identifier_char(c: char) -> bool {
    is_start_identifier_char(c) || c.is_ascii_digit()
}

fn is_start_identifier_char(c: char) -> bool {
    c == '_' || c.is_ascii_lowercase() || c.is_ascii_uppercase()
}

/// Parse a C-like identifier
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    verify(take_while1(is_identifier_char), |f: &str| {
        f.chars()
            .next()
            .filter(|&c| is_start_identifier_char(c))
            .is_some()
    })(input)
}

/// Parses a label definition: an identifier followed by a colon.
fn parse_label(input: &str) -> IResult<&str, Line> {
    let (input, symbol) = terminated(parse_identifier, char(':'))(input)?;
    Ok((input, Line::Label(symbol)))
}

/// Parses an instruction: a known mnemonic, then an optional operand
/// token reaching up to the next whitespace.
fn parse_instruction(input: &str) -> IResult<&str, Line> {
    let (input, opcode) = map_res(parse_identifier, str::parse::<Opcode>)(input)?;
    let (input, operand) = opt(preceded(
        space1,
        take_while1(|c: char| !c.is_whitespace()),
    ))(input)?;
    Ok((input, Line::Instruction { opcode, operand }))
}

fn parse_word(input: &str) -> IResult<&str, Word> {
    map_res(digit1, str::parse::<Word>)(input)
}

/// Parses an array literal: a name, then at least two comma-separated
/// decimal words with no space inside the list.
fn parse_array(input: &str) -> IResult<&str, Line> {
    let (input, name) = parse_identifier(input)?;
    let (input, values) = preceded(
        space1,
        verify(separated_list1(char(','), parse_word), |v: &[Word]| {
            v.len() > 1
        }),
    )(input)?;
    Ok((input, Line::Array { name, values }))
}

/// Parses one meaningful line. Mnemonic-first lines always parse as
/// instructions, so an array may not borrow an opcode name.
fn parse_line(input: &str) -> IResult<&str, Line> {
    delimited(
        space0,
        alt((parse_label, parse_instruction, parse_array)),
        space0,
    )(input)
}

/// Parses a whole program into its meaningful lines, skipping blank
/// lines and `//` comments.
///
/// # Errors
///
/// Fails on the first line the grammar rejects, with its 1-based line
/// number.
pub(crate) fn parse_program(source: &str) -> Result<Vec<Line>, SyntaxError> {
    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        let (_, line) = all_consuming(parse_line)(trimmed)
            .finish()
            .map_err(|_: nom::error::Error<&str>| SyntaxError {
                line: index + 1,
                content: raw.to_string(),
            })?;
        lines.push(line);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[track_caller]
    fn fully_parsed<T>(result: IResult<&str, T>) -> T {
        let (input, result) = result.unwrap();
        assert_eq!(input, "");
        result
    }

    #[test]
    fn parse_label_test() {
        assert_eq!(fully_parsed(parse_line("loop:")), Line::Label("loop"));
        assert_eq!(fully_parsed(parse_line("end: ")), Line::Label("end"));
    }

    #[test]
    fn parse_instruction_test() {
        assert_eq!(
            fully_parsed(parse_line("PUSH 42")),
            Line::Instruction {
                opcode: Opcode::Push,
                operand: Some("42"),
            }
        );
        assert_eq!(
            fully_parsed(parse_line("HLT")),
            Line::Instruction {
                opcode: Opcode::Hlt,
                operand: None,
            }
        );
        assert_eq!(
            fully_parsed(parse_line("PUSH data+2")),
            Line::Instruction {
                opcode: Opcode::Push,
                operand: Some("data+2"),
            }
        );
    }

    #[test]
    fn parse_array_test() {
        assert_eq!(
            fully_parsed(parse_line("data 10,77,15")),
            Line::Array {
                name: "data",
                values: vec![10, 77, 15],
            }
        );
    }

    #[test]
    fn single_value_is_not_an_array_test() {
        // "name 5" is neither a label, an instruction, nor an array
        assert!(parse_program("name 5").is_err());
    }

    #[test]
    fn parse_program_test() {
        let source = indoc! {"
            // find things
            data 10,20,30

            start:
            PUSH data+1
            READ
            OUT
            HLT
        "};

        assert_eq!(
            parse_program(source).unwrap(),
            vec![
                Line::Array {
                    name: "data",
                    values: vec![10, 20, 30],
                },
                Line::Label("start"),
                Line::Instruction {
                    opcode: Opcode::Push,
                    operand: Some("data+1"),
                },
                Line::Instruction {
                    opcode: Opcode::Read,
                    operand: None,
                },
                Line::Instruction {
                    opcode: Opcode::Out,
                    operand: None,
                },
                Line::Instruction {
                    opcode: Opcode::Hlt,
                    operand: None,
                },
            ]
        );
    }

    #[test]
    fn syntax_error_reports_line_test() {
        let source = "PUSH 1\n???\nHLT";
        let err = parse_program(source).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.content, "???");
    }

    #[test]
    fn trailing_comma_rejected_test() {
        assert!(parse_program("data 1,2,").is_err());
        assert!(parse_program("data ,1,2").is_err());
    }
}
