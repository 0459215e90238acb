//! Emulator for a small stack machine with a shared program/data
//! memory, sixteen opcodes and a sixteen-cell stack region carved out
//! of main memory.
//!
//! The crate has three layers:
//!
//!   - [`runtime`]: the machine itself, stepping one instruction at a
//!     time over a 1024-word memory;
//!   - [`assembler`]: a two-pass translator from mnemonic text with
//!     labels and array literals to a raw word stream;
//!   - [`controller`]: a threaded driver publishing state snapshots
//!     after every step.
//!
//! ```
//! use sm16_emulator::controller::Controller;
//! use std::time::Duration;
//!
//! let program = sm16_emulator::assemble("PUSH 2\nPUSH 3\nADD\nOUT\nHLT").unwrap();
//! let mut controller = Controller::new();
//! controller.load(&program);
//! controller.run(Duration::ZERO).unwrap();
//! controller.wait();
//! assert_eq!(controller.snapshot().state.output, vec!["5".to_string()]);
//! ```

pub mod assembler;
pub mod bits;
pub mod constants;
pub mod controller;
mod parser;
pub mod programs;
pub mod runtime;

pub use self::assembler::assemble;
