//! Editor color scheme: one color per instruction class, defaulting to the
//! Catppuccin Mocha accents.

use nu_ansi_term::{Color, Style};

use crate::program::Op;

/// The Catppuccin Mocha colors the default scheme draws from.
pub mod mocha {
    use nu_ansi_term::Color;

    pub const SURFACE2: Color = Color::Rgb(108, 112, 134);
    pub const RED: Color = Color::Rgb(243, 139, 168);
    pub const GREEN: Color = Color::Rgb(166, 227, 161);
    pub const YELLOW: Color = Color::Rgb(249, 226, 175);
    pub const MAUVE: Color = Color::Rgb(203, 166, 247);
    pub const PEACH: Color = Color::Rgb(250, 179, 135);
    pub const TEAL: Color = Color::Rgb(148, 226, 213);
    pub const SKY: Color = Color::Rgb(137, 220, 235);
}

/// Highlighter colors for the REPL editor. Overridable from the `[colors]`
/// section of the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub op_right: Color,   // '>'
    pub op_left: Color,    // '<'
    pub op_inc: Color,     // '+'
    pub op_dec: Color,     // '-'
    pub op_output: Color,  // '.'
    pub op_input: Color,   // ','
    pub op_bracket: Color, // '[' and ']'
    pub comment: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            op_right: mocha::SKY,
            op_left: mocha::TEAL,
            op_inc: mocha::GREEN,
            op_dec: mocha::RED,
            op_output: mocha::YELLOW,
            op_input: mocha::PEACH,
            op_bracket: mocha::MAUVE,
            comment: mocha::SURFACE2,
        }
    }
}

impl Colors {
    pub fn for_op(&self, op: Op) -> Color {
        match op {
            Op::Right => self.op_right,
            Op::Left => self.op_left,
            Op::Increment => self.op_inc,
            Op::Decrement => self.op_dec,
            Op::Output => self.op_output,
            Op::Input => self.op_input,
            Op::LoopStart | Op::LoopEnd => self.op_bracket,
        }
    }

    /// Instructions are bold, everything else is a dimmed comment.
    pub fn style_for(&self, ch: char) -> Style {
        match Op::from_char(ch) {
            Some(op) => Style::new().fg(self.for_op(op)).bold(),
            None => Style::new().fg(self.comment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_share_a_color() {
        let c = Colors::default();
        assert_eq!(c.style_for('['), c.style_for(']'));
        assert_ne!(c.style_for('+'), c.style_for('-'));
    }

    #[test]
    fn comments_are_not_bold() {
        let c = Colors::default();
        assert_eq!(c.style_for('x'), Style::new().fg(mocha::SURFACE2));
        assert!(c.style_for('.').is_bold);
    }
}
