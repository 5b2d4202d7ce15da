use std::fmt;

/// One of the eight Brainfuck instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Right,
    Left,
    Increment,
    Decrement,
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl Op {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '>' => Some(Op::Right),
            '<' => Some(Op::Left),
            '+' => Some(Op::Increment),
            '-' => Some(Op::Decrement),
            '.' => Some(Op::Output),
            ',' => Some(Op::Input),
            '[' => Some(Op::LoopStart),
            ']' => Some(Op::LoopEnd),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Op::Right => '>',
            Op::Left => '<',
            Op::Increment => '+',
            Op::Decrement => '-',
            Op::Output => '.',
            Op::Input => ',',
            Op::LoopStart => '[',
            Op::LoopEnd => ']',
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A Brainfuck program with comments stripped.
///
/// Every character outside `><+-.,[]` is a comment and is dropped while
/// parsing. For each kept instruction the program remembers the char offset
/// it had in the original source, so positions reported by the validator and
/// executor (which index into the instruction stream) can be mapped back onto
/// the text the user typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    ops: Vec<Op>,
    offsets: Vec<usize>,
}

impl Program {
    pub fn parse(source: &str) -> Self {
        let mut ops = Vec::new();
        let mut offsets = Vec::new();
        for (offset, ch) in source.chars().enumerate() {
            if let Some(op) = Op::from_char(ch) {
                ops.push(op);
                offsets.push(offset);
            }
        }
        Self { ops, offsets }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn get(&self, ip: usize) -> Option<Op> {
        self.ops.get(ip).copied()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Char offset in the original source of the instruction at `ip`.
    ///
    /// Positions at or past the end map to one past the last instruction.
    pub fn source_offset(&self, ip: usize) -> usize {
        match self.offsets.get(ip) {
            Some(&offset) => offset,
            None => self.offsets.last().map_or(0, |&last| last + 1),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_dropped() {
        let program = Program::parse("a+b\n-c[ ]!");
        assert_eq!(program.to_string(), "+-[]");
        assert_eq!(program.len(), 4);
    }

    #[test]
    fn source_offsets_follow_chars_not_bytes() {
        // 'é' is two bytes but one char
        let program = Program::parse("é+ >");
        assert_eq!(program.source_offset(0), 1);
        assert_eq!(program.source_offset(1), 3);
        assert_eq!(program.source_offset(2), 4);
    }

    #[test]
    fn empty_source_is_empty_program() {
        let program = Program::parse("just a comment");
        assert!(program.is_empty());
        assert_eq!(program.source_offset(0), 0);
    }
}
