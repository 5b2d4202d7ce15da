use crate::program::{Op, Program};

/// Errors found while matching loop brackets. Positions index into the
/// instruction stream of the [`Program`], not the raw source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A `]` appeared with no open `[` before it.
    #[error("Unmatched bracket ']' at instruction {ip}")]
    UnmatchedClose { ip: usize },

    /// One or more `[` were still open at the end of the program.
    /// `ip` is the outermost one; `pending` lists all of them in order.
    #[error("Unmatched bracket '[' at instruction {ip}")]
    UnmatchedOpen { ip: usize, pending: Vec<usize> },
}

impl ValidationError {
    pub fn ip(&self) -> usize {
        match self {
            ValidationError::UnmatchedClose { ip } | ValidationError::UnmatchedOpen { ip, .. } => *ip,
        }
    }
}

/// Matching bracket positions, precomputed so loops jump in O(1).
///
/// `targets[i]` holds the partner index for a `[` or `]` at `i` and `None`
/// for every other instruction. Only [`validate`] builds one, so a table is
/// always a perfect pairing for the program it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JumpTable {
    targets: Vec<Option<usize>>,
}

impl JumpTable {
    pub fn target(&self, ip: usize) -> Option<usize> {
        self.targets.get(ip).copied().flatten()
    }

    /// Number of instruction slots covered (equals the program length).
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// `(open, close)` pairs ordered by the position of the `[`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.targets
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.filter(|&j| j > i).map(|j| (i, j)))
    }
}

/// Match every `[` with its `]` in a single pass.
pub fn validate(program: &Program) -> Result<JumpTable, ValidationError> {
    let mut targets: Vec<Option<usize>> = vec![None; program.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (i, op) in program.ops().iter().enumerate() {
        match op {
            Op::LoopStart => stack.push(i),
            Op::LoopEnd => {
                let Some(open) = stack.pop() else {
                    return Err(ValidationError::UnmatchedClose { ip: i });
                };
                targets[open] = Some(i);
                targets[i] = Some(open);
            }
            _ => {}
        }
    }

    if let Some(&first) = stack.first() {
        return Err(ValidationError::UnmatchedOpen { ip: first, pending: stack });
    }

    Ok(JumpTable { targets })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(src: &str) -> Result<JumpTable, ValidationError> {
        validate(&Program::parse(src))
    }

    #[test]
    fn nested_loops_pair_up() {
        let jumps = table("+[>[-]<[+]]").unwrap();
        assert_eq!(jumps.pairs().collect::<Vec<_>>(), vec![(1, 10), (3, 5), (7, 9)]);
        assert_eq!(jumps.target(10), Some(1));
        assert_eq!(jumps.target(0), None);
    }

    /// Balanced program of `pairs` loops with filler ops, shaped by `seed`.
    fn nested(seed: u64, pairs: usize) -> String {
        const FILLER: [char; 6] = ['+', '-', '>', '<', '.', ','];
        let mut state = seed;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as usize
        };
        let (mut out, mut open, mut left) = (String::new(), 0usize, pairs);
        while left > 0 || open > 0 {
            match next() % 3 {
                0 if left > 0 => {
                    out.push('[');
                    open += 1;
                    left -= 1;
                }
                1 if open > 0 => {
                    out.push(']');
                    open -= 1;
                }
                _ => out.push(FILLER[next() % FILLER.len()]),
            }
        }
        out
    }

    fn assert_involution(src: &str) {
        let program = Program::parse(src);
        let jumps = validate(&program).unwrap_or_else(|e| panic!("{src:?} should validate: {e}"));
        assert_eq!(jumps.len(), program.len());
        for (i, op) in program.ops().iter().enumerate() {
            match op {
                Op::LoopStart | Op::LoopEnd => {
                    let j = jumps.target(i).expect("bracket has a partner");
                    assert_eq!(jumps.target(j), Some(i), "{src:?} at {i}");
                    assert_ne!(program.get(i), program.get(j));
                    // '[' always pairs forward
                    assert_eq!(*op == Op::LoopStart, j > i);
                }
                _ => assert_eq!(jumps.target(i), None),
            }
        }
    }

    #[test]
    fn table_is_an_involution() {
        assert_involution("[[][[]]][]");
        for (seed, pairs) in [(1, 1), (2, 3), (7, 8), (42, 16), (1234, 40), (99_991, 64)] {
            assert_involution(&nested(seed, pairs));
        }
        // deep nesting
        assert_involution(&format!("{}{}", "[".repeat(500), "]".repeat(500)));
    }

    #[test]
    fn stray_close_reports_its_position() {
        assert_eq!(table("+[]]+"), Err(ValidationError::UnmatchedClose { ip: 3 }));
        assert_eq!(table("]"), Err(ValidationError::UnmatchedClose { ip: 0 }));
    }

    #[test]
    fn stray_open_reports_outermost_and_all_pending() {
        let err = table("[+[[]").unwrap_err();
        assert_eq!(err, ValidationError::UnmatchedOpen { ip: 0, pending: vec![0, 2] });
        assert_eq!(err.ip(), 0);
    }

    #[test]
    fn comments_do_not_shift_positions() {
        // positions are instruction indices, the 'x' is not counted
        assert_eq!(table("+x]"), Err(ValidationError::UnmatchedClose { ip: 1 }));
    }

    #[test]
    fn validating_twice_gives_same_table() {
        let program = Program::parse("++[>+[-]<-]");
        assert_eq!(validate(&program), validate(&program));
    }

    #[test]
    fn empty_program_is_valid() {
        assert!(table("").unwrap().is_empty());
    }
}
