use std::io::{self, Read, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crate::program::{Op, Program};
use crate::session::Session;
use crate::validator::JumpTable;

/// How often (in steps) the wall-clock deadline is consulted.
const DEADLINE_CHECK_INTERVAL: usize = 1024;

/// Faults that abort a running program. `ip` is always the instruction
/// pointer at the moment of the fault.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeFault {
    /// The data pointer attempted to move left of cell 0 or beyond the last cell.
    #[error("Pointer out of bounds at instruction {ip} (ptr={ptr}, op='{op}')")]
    PointerOutOfBounds { ip: usize, ptr: usize, op: Op },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit}) at instruction {ip}")]
    StepLimitExceeded { ip: usize, limit: usize },

    /// Execution aborted because the wall-clock deadline passed.
    #[error("Execution aborted: wall-clock timeout exceeded at instruction {ip}")]
    Timeout { ip: usize },

    /// Execution aborted due to cooperative cancellation (e.g. Ctrl+C).
    #[error("Execution aborted: cancelled at instruction {ip}")]
    Canceled { ip: usize },

    /// Reading input or writing output failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: io::Error,
    },

    /// A bracket had no partner in the jump table, meaning the table was
    /// built for a different program.
    #[error("No jump target for bracket at instruction {ip}")]
    UnpairedBracket { ip: usize },
}

impl RuntimeFault {
    pub fn ip(&self) -> usize {
        match self {
            RuntimeFault::PointerOutOfBounds { ip, .. }
            | RuntimeFault::StepLimitExceeded { ip, .. }
            | RuntimeFault::Timeout { ip }
            | RuntimeFault::Canceled { ip }
            | RuntimeFault::Io { ip, .. }
            | RuntimeFault::UnpairedBracket { ip } => *ip,
        }
    }

    /// Limit faults are aborts requested by the caller rather than bugs in
    /// the program.
    pub fn is_abort(&self) -> bool {
        matches!(
            self,
            RuntimeFault::StepLimitExceeded { .. } | RuntimeFault::Timeout { .. } | RuntimeFault::Canceled { .. }
        )
    }
}

/// Controls for cooperative cancellation, step limiting and timeouts.
#[derive(Clone, Debug, Default)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub deadline: Option<Instant>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, deadline: None, cancel_flag }
    }

    /// No step limit, no deadline, and a private cancel flag nobody sets.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Set the deadline to `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    fn check(&self, ip: usize, step: usize) -> Result<(), RuntimeFault> {
        if self.cancel_flag.load(Ordering::Relaxed) {
            return Err(RuntimeFault::Canceled { ip });
        }
        if let Some(limit) = self.max_steps {
            if step >= limit {
                return Err(RuntimeFault::StepLimitExceeded { ip, limit });
            }
        }
        if let Some(deadline) = self.deadline {
            if step % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                return Err(RuntimeFault::Timeout { ip });
            }
        }
        Ok(())
    }
}

/// Summary of a completed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Instructions executed during this call.
    pub steps: usize,
    /// Bytes written by `.` during this call.
    pub output_bytes: usize,
}

/// Runs a validated program against a [`Session`].
pub struct Executor<'p> {
    program: &'p Program,
    jumps: &'p JumpTable,
    start: usize,
    trace: bool,
}

impl<'p> Executor<'p> {
    pub fn new(program: &'p Program, jumps: &'p JumpTable) -> Self {
        Self { program, jumps, start: 0, trace: false }
    }

    /// Begin at instruction `ip` instead of 0.
    pub fn start_at(mut self, ip: usize) -> Self {
        self.start = ip;
        self
    }

    /// Print a step-by-step table to the output sink instead of performing
    /// program I/O. The tape and pointers advance exactly as in a real run,
    /// but `.` emits nothing and `,` behaves as if input were exhausted.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Execute until the instruction pointer passes the end of the program
    /// or a fault occurs. Output is flushed in both cases.
    pub fn run<R, W>(
        &self,
        session: &mut Session,
        input: &mut R,
        output: &mut W,
        control: &StepControl,
    ) -> Result<ExecutionReport, RuntimeFault>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let result = self.run_loop(session, input, output, control);
        let flushed = output.flush();
        let report = result?;
        flushed.map_err(|source| RuntimeFault::Io { ip: self.program.len(), source })?;
        Ok(report)
    }

    fn run_loop<R, W>(
        &self,
        session: &mut Session,
        input: &mut R,
        output: &mut W,
        control: &StepControl,
    ) -> Result<ExecutionReport, RuntimeFault>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let code_len = self.program.len();
        let mut ip = self.start;
        let mut step: usize = 0;
        let mut output_bytes: usize = 0;

        if self.trace {
            write_trace_header(output).map_err(|source| RuntimeFault::Io { ip, source })?;
        }

        while ip < code_len {
            control.check(ip, step)?;

            let op = self.program.ops()[ip];
            let ip_before = ip;
            let (ptr_before, cell_before) = (session.pointer, session.current_cell());
            let mut action: Option<String> = if self.trace { Some(String::new()) } else { None };

            match op {
                Op::Right => {
                    let next = session
                        .pointer
                        .checked_add(1)
                        .filter(|&p| p < session.tape.len())
                        .ok_or(RuntimeFault::PointerOutOfBounds { ip, ptr: session.pointer, op })?;
                    session.pointer = next;
                    if let Some(a) = action.as_mut() {
                        *a = format!("Moved pointer head to index {next}");
                    }
                }
                Op::Left => {
                    let next = session
                        .pointer
                        .checked_sub(1)
                        .ok_or(RuntimeFault::PointerOutOfBounds { ip, ptr: session.pointer, op })?;
                    session.pointer = next;
                    if let Some(a) = action.as_mut() {
                        *a = format!("Moved pointer head to index {next}");
                    }
                }
                Op::Increment => {
                    let cell = session.tape.cell_mut(session.pointer);
                    *cell = cell.wrapping_add(1);
                    if let Some(a) = action.as_mut() {
                        *a = format!("Increment cell[{ptr_before}] from {cell_before} to {}", *cell);
                    }
                }
                Op::Decrement => {
                    let cell = session.tape.cell_mut(session.pointer);
                    *cell = cell.wrapping_sub(1);
                    if let Some(a) = action.as_mut() {
                        *a = format!("Decrement cell[{ptr_before}] from {cell_before} to {}", *cell);
                    }
                }
                Op::Output => {
                    if let Some(a) = action.as_mut() {
                        *a = format!("Output byte {cell_before} (suppressed in debug)");
                    } else {
                        output
                            .write_all(&[cell_before])
                            .map_err(|source| RuntimeFault::Io { ip, source })?;
                        output_bytes += 1;
                    }
                }
                Op::Input => {
                    let eof = session.eof();
                    let cell = session.tape.cell_mut(session.pointer);
                    if let Some(a) = action.as_mut() {
                        *cell = eof.apply(*cell);
                        *a = format!("Read byte -> simulated EOF ({eof}), cell = {}", *cell);
                    } else {
                        // Prompts written before a blocking read must be visible.
                        output.flush().map_err(|source| RuntimeFault::Io { ip, source })?;
                        *cell = match read_byte(input).map_err(|source| RuntimeFault::Io { ip, source })? {
                            Some(b) => b,
                            None => eof.apply(*cell),
                        };
                    }
                }
                Op::LoopStart => {
                    if cell_before == 0 {
                        let j = self.jump_target(ip)?;
                        if let Some(a) = action.as_mut() {
                            *a = format!("Cell is 0; jump forward to matching ']' at IP {j}");
                        }
                        ip = j;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Enter loop (cell != 0)".to_string();
                    }
                }
                Op::LoopEnd => {
                    if cell_before != 0 {
                        let j = self.jump_target(ip)?;
                        if let Some(a) = action.as_mut() {
                            *a = format!("Cell != 0; jump back to matching '[' at IP {j}");
                        }
                        ip = j;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Exit loop (cell is 0)".to_string();
                    }
                }
            }

            if let Some(action) = action {
                writeln!(
                    output,
                    "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}",
                    step, ip_before, ptr_before, cell_before, op, action
                )
                .map_err(|source| RuntimeFault::Io { ip, source })?;
            }

            step += 1;
            // Jumps land on the partner bracket, so this always moves one past it.
            ip += 1;
        }

        Ok(ExecutionReport { steps: step, output_bytes })
    }

    fn jump_target(&self, ip: usize) -> Result<usize, RuntimeFault> {
        self.jumps.target(ip).ok_or(RuntimeFault::UnpairedBracket { ip })
    }
}

/// Run `program` from instruction `ip` against `session`.
///
/// `jumps` must come from [`crate::validate`] on the same program.
pub fn execute<R, W>(
    program: &Program,
    jumps: &JumpTable,
    session: &mut Session,
    ip: usize,
    input: &mut R,
    output: &mut W,
    control: &StepControl,
) -> Result<ExecutionReport, RuntimeFault>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    Executor::new(program, jumps).start_at(ip).run(session, input, output, control)
}

fn read_byte<R: Read + ?Sized>(input: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

fn write_trace_header<W: Write + ?Sized>(output: &mut W) -> io::Result<()> {
    writeln!(output, "STEP | IP  | PTR | CELL | INSTR | ACTION")?;
    writeln!(output, "-----+-----+-----+------+-------+------------------------------------------------")
}
