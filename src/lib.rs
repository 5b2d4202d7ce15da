//! A tiny Brainfuck interpreter library.
//!
//! This crate provides a Brainfuck interpreter that operates on a memory
//! tape (default 30,000 cells) with a single data pointer, plus the pieces
//! the `brainfuck` binary builds its CLI and REPL from.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0; cells wrap (255 + 1 = 0, 0 - 1 = 255).
//! - Strict pointer bounds: moving left from cell 0 or right past the end
//!   is a [`RuntimeFault`]. The tape never grows.
//! - Input `,` reads a single byte from the input source; on end of input
//!   the session's [`EofPolicy`] applies (cell set to 0 by default).
//! - Output `.` writes the byte at the current cell to the output sink.
//! - Characters outside `><+-.,[]` are comments.
//! - Brackets are matched once up front by [`validate`]; unmatched brackets
//!   are reported with their position before anything runs.
//! - A [`StepControl`] bounds a run by step count, wall-clock deadline, or a
//!   shared cancel flag.
//!
//! Quick start:
//!
//! ```no_run
//! use brainfuck::{Session, StepControl};
//!
//! // Prints "Hello"
//! let code = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.";
//! let mut session = Session::default();
//! session
//!     .run(code, &mut std::io::stdin(), &mut std::io::stdout(), &StepControl::unlimited())
//!     .expect("program should run");
//! println!(); // ensure a trailing newline for readability
//! ```
//!
//! The lower-level pieces can be driven separately:
//!
//! ```
//! use brainfuck::{execute, validate, Program, Session, StepControl};
//!
//! let program = Program::parse(",.");
//! let jumps = validate(&program).unwrap();
//! let mut session = Session::default();
//! let mut out: Vec<u8> = Vec::new();
//! execute(&program, &jumps, &mut session, 0, &mut &b"A"[..], &mut out, &StepControl::unlimited()).unwrap();
//! assert_eq!(out, b"A");
//! ```

pub mod cli_util;
pub mod config;
pub mod executor;
pub mod program;
pub mod repl;
pub mod session;
pub mod tape;
pub mod theme;
pub mod validator;

pub use executor::{execute, ExecutionReport, Executor, RuntimeFault, StepControl};
pub use program::{Op, Program};
pub use session::{EofPolicy, Session};
pub use tape::{Tape, DEFAULT_TAPE_SIZE};
pub use validator::{validate, JumpTable, ValidationError};

/// Anything that can stop a program: rejected before it runs, or aborted
/// while running.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeFault),
}

impl Error {
    /// Instruction index the error refers to.
    pub fn ip(&self) -> usize {
        match self {
            Error::Validation(e) => e.ip(),
            Error::Runtime(e) => e.ip(),
        }
    }
}
