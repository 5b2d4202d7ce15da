use std::io::{self, IsTerminal, Write};

use nu_ansi_term::Color;

use crate::{Error, Program, RuntimeFault, ValidationError};

/// Chars shown on each side of the caret.
const WINDOW_CHARS: usize = 32;

/// Pretty-print an [`Error`] to stderr with a caret under the offending
/// character of `source`.
///
/// If `program` is `Some("brainfuck")`, messages are prefixed with
/// "brainfuck: ..." as in one-shot CLI mode. `timeout_ms` is only used to
/// word timeout aborts.
pub fn print_error(program: Option<&str>, source: &str, err: &Error, timeout_ms: Option<u64>) {
    let text = render_error(program, source, err, timeout_ms);
    let mut stderr = io::stderr().lock();
    let styled = stderr.is_terminal();
    let _ = write_error(&mut stderr, &text, styled);
}

/// Write a rendered error, painting its header line red when `styled`.
pub fn write_error<W: Write + ?Sized>(out: &mut W, text: &str, styled: bool) -> io::Result<()> {
    for (i, line) in text.lines().enumerate() {
        if i == 0 && styled {
            writeln!(out, "{}", Color::Red.bold().paint(line))?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}

/// Render the message printed by [`print_error`], without styling.
pub fn render_error(program: Option<&str>, source: &str, err: &Error, timeout_ms: Option<u64>) -> String {
    let prefix_program = |msg: &str| match program {
        Some(p) => format!("{p}: {msg}"),
        None => msg.to_string(),
    };

    let (msg, ip) = match err {
        Error::Validation(ValidationError::UnmatchedClose { ip }) => {
            (prefix_program("Parse error: unmatched bracket ']'"), *ip)
        }
        Error::Validation(ValidationError::UnmatchedOpen { ip, pending }) => {
            let msg = if pending.len() > 1 {
                format!("Parse error: unmatched bracket '[' ({} left open)", pending.len())
            } else {
                "Parse error: unmatched bracket '['".to_string()
            };
            (prefix_program(&msg), *ip)
        }
        Error::Runtime(RuntimeFault::PointerOutOfBounds { ip, ptr, op }) => (
            prefix_program(&format!("Runtime error: pointer out of bounds (ptr={ptr}, op={op})")),
            *ip,
        ),
        Error::Runtime(RuntimeFault::Io { ip, source }) => (prefix_program(&format!("I/O error: {source}")), *ip),
        Error::Runtime(RuntimeFault::UnpairedBracket { ip }) => {
            (prefix_program("Internal error: jump table does not match program"), *ip)
        }
        // Aborts are requested by the caller; no caret needed.
        Error::Runtime(RuntimeFault::StepLimitExceeded { ip, limit }) => {
            return format!("Execution aborted: step limit exceeded ({limit}) at instruction {ip}\n");
        }
        Error::Runtime(RuntimeFault::Timeout { ip }) => {
            return match timeout_ms {
                Some(ms) => format!("Execution aborted: wall-clock timeout exceeded ({ms} ms) at instruction {ip}\n"),
                None => format!("Execution aborted: wall-clock timeout exceeded at instruction {ip}\n"),
            };
        }
        Error::Runtime(RuntimeFault::Canceled { ip }) => {
            return format!("Execution aborted: cancelled at instruction {ip}\n");
        }
    };

    let pos = Program::parse(source).source_offset(ip);
    render_with_context(&msg, source, pos)
}

/// A message line, then a short window of `code` around char `pos` with a
/// caret underneath. Works on UTF-8 by slicing at char indices; line breaks
/// inside the window are shown as spaces so the caret stays aligned.
pub fn render_with_context(prefix: &str, code: &str, pos: usize) -> String {
    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let slice: String = code
        .chars()
        .skip(start_char)
        .take(end_char.saturating_sub(start_char))
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect();

    // Caret under the exact position
    let caret_offset_chars = pos.saturating_sub(start_char);
    let underline = format!("{}^", " ".repeat(caret_offset_chars));

    format!("{prefix} at position {pos}\n  {slice}\n  {underline}\n")
}
