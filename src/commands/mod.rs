use brainfuck::config::Settings;
use brainfuck::EofPolicy;
use clap::Args;

pub mod repl;
pub mod run;

/// Interpreter limits shared by `run` and `repl`. Flags win over the
/// environment and the config file.
#[derive(Args, Debug, Default)]
pub struct LimitArgs {
    /// Wall-clock timeout per execution in milliseconds, 0 for none (fallback BF_TIMEOUT_MS)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps per execution, 0 for none (fallback BF_MAX_STEPS)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<usize>,

    /// Number of tape cells (fallback BF_TAPE_SIZE; default 30000)
    #[arg(long = "tape-size", value_name = "N")]
    pub tape_size: Option<usize>,

    /// What `,` stores at end of input: zero, unchanged or max (fallback BF_EOF)
    #[arg(long = "eof", value_name = "POLICY")]
    pub eof: Option<EofPolicy>,
}

impl LimitArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(ms) = self.timeout_ms {
            settings.timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(n) = self.max_steps {
            settings.max_steps = (n > 0).then_some(n);
        }
        if let Some(n) = self.tape_size {
            settings.tape_size = n;
        }
        if let Some(eof) = self.eof {
            settings.eof = eof;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings_and_zero_disables() {
        let mut settings = Settings { max_steps: Some(10), timeout_ms: Some(5), ..Settings::default() };
        let args = LimitArgs { timeout_ms: Some(0), max_steps: Some(99), tape_size: None, eof: Some(EofPolicy::Max) };
        args.apply(&mut settings);
        assert_eq!(settings.timeout_ms, None);
        assert_eq!(settings.max_steps, Some(99));
        assert_eq!(settings.tape_size, brainfuck::DEFAULT_TAPE_SIZE);
        assert_eq!(settings.eof, EofPolicy::Max);
    }
}
