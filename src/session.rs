use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use crate::executor::{ExecutionReport, Executor, StepControl};
use crate::program::Program;
use crate::tape::{Tape, DEFAULT_TAPE_SIZE};
use crate::validator::validate;
use crate::Error;

/// What `,` stores in the current cell once input is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EofPolicy {
    /// Set the cell to 0.
    #[default]
    Zero,
    /// Leave the cell as it was.
    Unchanged,
    /// Set the cell to 255.
    Max,
}

impl EofPolicy {
    pub fn apply(self, cell: u8) -> u8 {
        match self {
            EofPolicy::Zero => 0,
            EofPolicy::Unchanged => cell,
            EofPolicy::Max => u8::MAX,
        }
    }
}

impl FromStr for EofPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Ok(EofPolicy::Zero),
            "unchanged" | "keep" => Ok(EofPolicy::Unchanged),
            "max" | "255" | "-1" => Ok(EofPolicy::Max),
            other => Err(format!("invalid EOF policy '{other}', must be 'zero', 'unchanged' or 'max'")),
        }
    }
}

impl fmt::Display for EofPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EofPolicy::Zero => "zero",
            EofPolicy::Unchanged => "unchanged",
            EofPolicy::Max => "max",
        };
        f.write_str(name)
    }
}

/// Interpreter state that outlives a single program: the tape, the data
/// pointer and the end-of-input policy.
///
/// A one-shot run uses a fresh session; the REPL keeps one around so each
/// submission continues where the previous one left the tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) tape: Tape,
    pub(crate) pointer: usize,
    eof: EofPolicy,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_TAPE_SIZE)
    }
}

impl Session {
    pub fn new(tape_size: usize) -> Self {
        Self {
            tape: Tape::new(tape_size),
            pointer: 0,
            eof: EofPolicy::default(),
        }
    }

    pub fn with_eof(mut self, eof: EofPolicy) -> Self {
        self.eof = eof;
        self
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn eof(&self) -> EofPolicy {
        self.eof
    }

    /// Value of the cell under the data pointer.
    pub fn current_cell(&self) -> u8 {
        self.tape.get(self.pointer).unwrap_or_default()
    }

    /// Zero the tape and move the data pointer back to cell 0, keeping the
    /// tape size and EOF policy.
    pub fn reset(&mut self) {
        self.tape.clear();
        self.pointer = 0;
    }

    /// Parse, validate and execute `source` against this session.
    pub fn run<R, W>(
        &mut self,
        source: &str,
        input: &mut R,
        output: &mut W,
        control: &StepControl,
    ) -> Result<ExecutionReport, Error>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let program = Program::parse(source);
        let jumps = validate(&program)?;
        let report = Executor::new(&program, &jumps).run(self, input, output, control)?;
        Ok(report)
    }

    /// Like [`Session::run`] but writes a step-by-step trace table to
    /// `output` instead of performing program I/O.
    pub fn run_debug<W>(&mut self, source: &str, output: &mut W, control: &StepControl) -> Result<ExecutionReport, Error>
    where
        W: Write + ?Sized,
    {
        let program = Program::parse(source);
        let jumps = validate(&program)?;
        let report = Executor::new(&program, &jumps)
            .with_trace(true)
            .run(self, &mut std::io::empty(), output, control)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_policy_parses_names() {
        assert_eq!("zero".parse::<EofPolicy>(), Ok(EofPolicy::Zero));
        assert_eq!(" Unchanged ".parse::<EofPolicy>(), Ok(EofPolicy::Unchanged));
        assert_eq!("255".parse::<EofPolicy>(), Ok(EofPolicy::Max));
        assert!("sometimes".parse::<EofPolicy>().is_err());
    }

    #[test]
    fn eof_policy_apply() {
        assert_eq!(EofPolicy::Zero.apply(9), 0);
        assert_eq!(EofPolicy::Unchanged.apply(9), 9);
        assert_eq!(EofPolicy::Max.apply(9), 255);
    }

    #[test]
    fn state_persists_across_runs() {
        let mut session = Session::new(8);
        let mut out: Vec<u8> = Vec::new();
        let ctrl = StepControl::unlimited();
        session.run("+++>", &mut std::io::empty(), &mut out, &ctrl).unwrap();
        session.run("++<.", &mut std::io::empty(), &mut out, &ctrl).unwrap();
        assert_eq!(out, vec![3]);
        assert_eq!(session.tape().get(1), Some(2));
    }

    #[test]
    fn reset_clears_tape_and_pointer() {
        let mut session = Session::new(8).with_eof(EofPolicy::Max);
        let ctrl = StepControl::unlimited();
        session.run(">>+", &mut std::io::empty(), &mut Vec::<u8>::new(), &ctrl).unwrap();
        session.reset();
        assert_eq!(session.pointer(), 0);
        assert!(session.tape().cells().iter().all(|&c| c == 0));
        assert_eq!(session.tape().len(), 8);
        assert_eq!(session.eof(), EofPolicy::Max);
    }

    #[test]
    fn invalid_program_leaves_session_untouched() {
        let mut session = Session::new(8);
        let ctrl = StepControl::unlimited();
        let err = session.run("+>[", &mut std::io::empty(), &mut Vec::<u8>::new(), &ctrl).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(session, Session::new(8));
    }
}
