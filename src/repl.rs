use std::io::{self, BufRead, Read, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use nu_ansi_term::Style;
use reedline::{DefaultPrompt, DefaultPromptSegment, Highlighter, HistoryItem, Signal, StyledText};

use crate::cli_util;
use crate::config::{Colors, Settings};
use crate::{Program, Session, StepControl};

pub const HELP: &str = r#"Meta commands (a submission starting with ":")
  :help            Show this help
  :exit, :quit     Exit immediately (code 0)
  :reset           Zero the tape and move the pointer back to cell 0
  :tape            Show the cells around the data pointer
"#;

/// Cells shown by `:tape`.
const TAPE_WINDOW: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

/// Pick the REPL mode: flags, then `BF_REPL_MODE`, then auto-detect from
/// whether stdin is a TTY.
pub fn select_mode(flag: ModeFlagOverride, env_mode: Option<&str>, stdin_is_tty: bool) -> Result<ReplMode, String> {
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !stdin_is_tty {
                return Err("cannot start editor: stdin is not a TTY (use --bare or BF_REPL_MODE=bare)".to_string());
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    if let Some(val) = env_mode {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !stdin_is_tty {
                    return Err("cannot start editor: stdin is not a TTY (use BF_REPL_MODE=bare)".to_string());
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!("invalid BF_REPL_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    if stdin_is_tty { Ok(ReplMode::Editor) } else { Ok(ReplMode::Bare) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Help,
    Exit,
    Reset,
    Tape,
}

impl MetaCommand {
    /// Parse a `:command` line. Returns `None` when `line` is not a meta
    /// command at all and `Some(Err)` for an unknown one.
    pub fn parse(line: &str) -> Option<Result<Self, String>> {
        let name = line.trim().strip_prefix(':')?;
        let name = name.split_whitespace().next().unwrap_or("");
        Some(match name {
            "help" | "h" | "?" => Ok(MetaCommand::Help),
            "exit" | "quit" | "q" => Ok(MetaCommand::Exit),
            "reset" => Ok(MetaCommand::Reset),
            "tape" => Ok(MetaCommand::Tape),
            other => Err(format!("unknown command ':{other}' (try :help)")),
        })
    }
}

/// Whether the loop should keep reading submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// REPL state: one persistent [`Session`] plus the limits applied to each
/// submission.
pub struct Repl {
    session: Session,
    fresh_session: bool,
    max_steps: Option<usize>,
    timeout_ms: Option<u64>,
    cancel_flag: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    styled_errors: bool,
    executions: usize,
}

impl Repl {
    pub fn new(settings: &Settings) -> Self {
        Self {
            session: Session::new(settings.tape_size).with_eof(settings.eof),
            fresh_session: settings.fresh_session,
            max_steps: settings.max_steps,
            timeout_ms: settings.timeout_ms,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            styled_errors: false,
            executions: 0,
        }
    }

    /// Style the first line of error reports (for a TTY stderr).
    pub fn with_styled_errors(mut self, styled: bool) -> Self {
        self.styled_errors = styled;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Number of programs executed so far.
    pub fn executions(&self) -> usize {
        self.executions
    }

    /// Set while a program runs; a signal handler uses it to decide between
    /// cancelling the program and leaving the REPL.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel_flag.clone()
    }

    fn step_control(&self) -> StepControl {
        let mut control = StepControl::new(self.max_steps, self.cancel_flag.clone());
        if let Some(ms) = self.timeout_ms {
            control = control.with_timeout(Duration::from_millis(ms));
        }
        control
    }

    /// Handle one submission: a meta command or a Brainfuck program.
    ///
    /// Program output goes to `output` followed by a newline so the next
    /// prompt starts at column 0. Errors, help and tape dumps go to `diag`.
    /// Submissions without any instruction are ignored.
    pub fn handle<R, W, D>(&mut self, submission: &str, input: &mut R, output: &mut W, diag: &mut D) -> io::Result<Flow>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
        D: Write + ?Sized,
    {
        let trimmed = submission.trim();
        if trimmed.is_empty() {
            return Ok(Flow::Continue);
        }

        if let Some(meta) = MetaCommand::parse(trimmed) {
            return self.handle_meta(meta, diag);
        }

        if Program::parse(trimmed).is_empty() {
            return Ok(Flow::Continue);
        }

        if self.fresh_session {
            self.session.reset();
        }

        self.cancel_flag.store(false, Ordering::Relaxed);
        self.running.store(true, Ordering::Relaxed);
        let result = self.session.run(trimmed, input, output, &self.step_control());
        self.running.store(false, Ordering::Relaxed);
        self.executions += 1;

        if let Err(err) = result {
            let text = cli_util::render_error(None, trimmed, &err, self.timeout_ms);
            cli_util::write_error(diag, &text, self.styled_errors)?;
        }
        writeln!(output)?;
        output.flush()?;
        Ok(Flow::Continue)
    }

    fn handle_meta<D: Write + ?Sized>(&mut self, meta: Result<MetaCommand, String>, diag: &mut D) -> io::Result<Flow> {
        match meta {
            Ok(MetaCommand::Exit) => return Ok(Flow::Exit),
            Ok(MetaCommand::Help) => write!(diag, "{HELP}")?,
            Ok(MetaCommand::Reset) => {
                self.session.reset();
                writeln!(diag, "session reset")?;
            }
            Ok(MetaCommand::Tape) => write!(diag, "{}", format_tape(&self.session))?,
            Err(msg) => writeln!(diag, "{msg}")?,
        }
        diag.flush()?;
        Ok(Flow::Continue)
    }

    /// Bare mode: read `stdin` to EOF, treating lines that start with `:` as
    /// meta commands and everything else as program text. Program text
    /// collected before a meta command (or EOF) runs as one submission.
    /// Programs see an empty input stream since stdin carried the code.
    pub fn run_bare<B, W, D>(&mut self, stdin: B, output: &mut W, diag: &mut D, once: bool) -> io::Result<()>
    where
        B: BufRead,
        W: Write + ?Sized,
        D: Write + ?Sized,
    {
        let mut buffer = String::new();
        for line in stdin.lines() {
            let line = line?;
            if MetaCommand::parse(&line).is_none() {
                buffer.push_str(&line);
                buffer.push('\n');
                continue;
            }

            if self.flush_buffer(&mut buffer, output, diag, once)? == Flow::Exit {
                return Ok(());
            }
            if self.handle(&line, &mut io::empty(), output, diag)? == Flow::Exit {
                return Ok(());
            }
        }
        self.flush_buffer(&mut buffer, output, diag, once)?;
        Ok(())
    }

    fn flush_buffer<W, D>(&mut self, buffer: &mut String, output: &mut W, diag: &mut D, once: bool) -> io::Result<Flow>
    where
        W: Write + ?Sized,
        D: Write + ?Sized,
    {
        let before = self.executions;
        let source = std::mem::take(buffer);
        let flow = self.handle(&source, &mut io::empty(), output, diag)?;
        if once && self.executions > before {
            return Ok(Flow::Exit);
        }
        Ok(flow)
    }
}

/// Render the `:tape` dump: the page of cells holding the data pointer,
/// with the current cell in brackets.
pub fn format_tape(session: &Session) -> String {
    let ptr = session.pointer();
    let (base, cells) = session.tape().window(ptr, TAPE_WINDOW);
    let mut out = format!(
        "ptr={ptr} cell={} cells {base}..{} of {}\n ",
        session.current_cell(),
        base + cells.len(),
        session.tape().len()
    );
    for (i, cell) in cells.iter().enumerate() {
        if base + i == ptr {
            out.push_str(&format!("[{cell:>3}]"));
        } else {
            out.push_str(&format!(" {cell:>3} "));
        }
    }
    out.push('\n');
    out
}

/// Interactive loop on top of a reedline editor. Enter inserts a newline,
/// Ctrl+D (Ctrl+Z on Windows) submits the buffer, Ctrl+C or EOF leave.
pub fn repl_loop(repl: &mut Repl, colors: &Colors, once: bool) -> io::Result<()> {
    let mut editor = init_line_editor(colors)?;

    loop {
        let Some(submission) = read_submission_interactive(&mut editor)? else {
            // EOF or editor closed. End the session cleanly to avoid hanging when stdin is closed
            println!();
            io::stdout().flush()?;
            return Ok(());
        };

        let before = repl.executions();
        let flow = repl.handle(&submission, &mut io::stdin(), &mut io::stdout(), &mut io::stderr())?;
        if flow == Flow::Exit {
            return Ok(());
        }

        // Test hook: exit after one execution
        if once && repl.executions() > before {
            return Ok(());
        }
    }
}

fn init_line_editor(colors: &Colors) -> io::Result<reedline::Reedline> {
    use reedline::{
        default_emacs_keybindings, EditCommand, Emacs, KeyCode, KeyModifiers, Reedline, ReedlineEvent,
    };

    // Start from default emacs-like bindings and adjust:
    // - Enter -> InsertNewLine (do not submit)
    // - Ctrl+D -> Submit
    // - Ctrl+Z -> Submit (Windows)
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Edit(vec![EditCommand::InsertNewline]));
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('z'), ReedlineEvent::Submit);

    // Up/down move within the current multiline buffer, not history.
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);

    // Alt/Ctrl + Up/Down browse previous submissions.
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = reedline::FileBackedHistory::new(1_000).map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(BrainfuckHighlighter::from_colors(colors)))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

fn read_submission_interactive(editor: &mut reedline::Reedline) -> io::Result<Option<String>> {
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("bf".to_string()), DefaultPromptSegment::Empty);

    match editor.read_line(&prompt) {
        Ok(Signal::Success(buffer)) => {
            // One history item per submitted buffer
            if !buffer.trim().is_empty() {
                let _ = editor.history_mut().save(HistoryItem::from_command_line(buffer.clone()));
            }
            Ok(Some(buffer))
        }
        Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => Ok(None),
        Err(e) => {
            eprintln!("repl: editor error: {e}");
            let _ = io::stderr().flush();
            Ok(None)
        }
    }
}

/// Per-instruction coloring for the editor buffer.
struct BrainfuckHighlighter {
    colors: Colors,
}

impl BrainfuckHighlighter {
    fn from_colors(colors: &Colors) -> Self {
        Self { colors: colors.clone() }
    }
}

impl Highlighter for BrainfuckHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out = StyledText::new();
        let mut current_style: Option<Style> = None;
        let mut buffer = String::new();

        for ch in line.chars() {
            let style = self.colors.style_for(ch);
            match current_style {
                Some(s) if s == style => buffer.push(ch),
                Some(s) => {
                    out.push((s, std::mem::take(&mut buffer)));
                    current_style = Some(style);
                    buffer.push(ch);
                }
                None => {
                    current_style = Some(style);
                    buffer.push(ch);
                }
            }
        }

        if let Some(s) = current_style {
            if !buffer.is_empty() {
                out.push((s, buffer));
            }
        }
        out
    }
}
