use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use cross_xdg::BaseDirs;
use nu_ansi_term::Color;

use crate::session::EofPolicy;
use crate::tape::DEFAULT_TAPE_SIZE;
pub use crate::theme::Colors;

/// Name of the config file looked up in the XDG config home.
pub const CONFIG_FILE_NAME: &str = "brainfuck.toml";

/// Interpreter and REPL settings resolved from the config file and the
/// environment. Command-line flags are applied on top by the commands.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub tape_size: usize,
    /// `None` means unlimited.
    pub max_steps: Option<usize>,
    /// `None` means the command's own default.
    pub timeout_ms: Option<u64>,
    pub eof: EofPolicy,
    /// Reset the REPL session before every submission.
    pub fresh_session: bool,
    pub colors: Colors,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tape_size: DEFAULT_TAPE_SIZE,
            max_steps: None,
            timeout_ms: None,
            eof: EofPolicy::default(),
            fresh_session: false,
            colors: Colors::default(),
        }
    }
}

impl Settings {
    /// Defaults, overridden by the config file (if any), overridden by the
    /// `BF_*` environment variables.
    pub fn load() -> Self {
        let mut settings = config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .map(|content| Self::from_toml_str(&content))
            .unwrap_or_default();
        settings.apply_env(|key| env::var(key).ok());
        settings
    }

    /// Parse the small TOML subset the config file uses: `[section]`
    /// headers and `key = value` pairs, values optionally double-quoted.
    /// Unknown keys and unparsable values are ignored.
    pub fn from_toml_str(content: &str) -> Self {
        let sections = parse_sections(content);
        let mut cfg = Settings::default();

        if let Some(map) = sections.get("interpreter") {
            if let Some(n) = map.get("tape_size").and_then(|s| parse_tape_size(s)) {
                cfg.tape_size = n;
            }
            if let Some(n) = map.get("max_steps").and_then(|s| s.parse::<usize>().ok()) {
                cfg.max_steps = (n > 0).then_some(n);
            }
            if let Some(n) = map.get("timeout_ms").and_then(|s| s.parse::<u64>().ok()) {
                cfg.timeout_ms = (n > 0).then_some(n);
            }
            if let Some(p) = map.get("eof").and_then(|s| s.parse::<EofPolicy>().ok()) {
                cfg.eof = p;
            }
            match map.get("session").map(|s| s.to_ascii_lowercase()).as_deref() {
                Some("fresh") => cfg.fresh_session = true,
                Some("persistent") => cfg.fresh_session = false,
                _ => {}
            }
        }

        if let Some(map) = sections.get("colors") {
            let colors = &mut cfg.colors;

            macro_rules! set {
                ($field:ident, $key:literal) => {
                    if let Some(v) = map.get($key).and_then(|s| parse_color(s)) {
                        colors.$field = v;
                    }
                };
            }

            set!(op_right, "op_right");
            set!(op_left, "op_left");
            set!(op_inc, "op_inc");
            set!(op_dec, "op_dec");
            set!(op_output, "op_output");
            set!(op_input, "op_input");
            set!(op_bracket, "op_bracket");
            set!(comment, "comment");
        }

        cfg
    }

    /// Apply `BF_TAPE_SIZE`, `BF_MAX_STEPS`, `BF_TIMEOUT_MS` and `BF_EOF`.
    /// Values that fail to parse are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(n) = lookup("BF_TAPE_SIZE").and_then(|s| parse_tape_size(&s)) {
            self.tape_size = n;
        }
        if let Some(n) = lookup("BF_MAX_STEPS").and_then(|s| s.trim().parse::<usize>().ok()) {
            self.max_steps = (n > 0).then_some(n);
        }
        if let Some(n) = lookup("BF_TIMEOUT_MS").and_then(|s| s.trim().parse::<u64>().ok()) {
            self.timeout_ms = (n > 0).then_some(n);
        }
        if let Some(p) = lookup("BF_EOF").and_then(|s| s.parse::<EofPolicy>().ok()) {
            self.eof = p;
        }
    }
}

/// `$BF_CONFIG` when set, otherwise `brainfuck.toml` in the XDG config home
/// (`~/.config` on Linux and macOS, `C:\Users\<user>\.config` on Windows).
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os("BF_CONFIG") {
        return Some(PathBuf::from(explicit));
    }
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push(CONFIG_FILE_NAME);
    Some(path)
}

fn parse_tape_size(s: &str) -> Option<usize> {
    s.trim().replace('_', "").parse::<usize>().ok().filter(|&n| n > 0)
}

fn parse_sections(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            current = Some(line[1..line.len() - 1].trim().to_string());
            continue;
        }
        let Some(section) = current.as_ref() else { continue };
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq + 1..].trim();
            // Accept quoted or unquoted
            let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                val_raw[1..val_raw.len() - 1].to_string()
            } else {
                val_raw.to_string()
            };
            sections.entry(section.clone()).or_default().insert(key, val);
        }
    }

    sections
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        return None;
    }

    let name = s.to_ascii_lowercase();
    Some(match name.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "purple" | "magenta" => Color::Purple,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "lightgray" | "light_gray" => Color::LightGray,
        "darkgray" | "dark_gray" | "darkgrey" | "dark_grey" => Color::DarkGray,
        "lightred" | "light_red" => Color::LightRed,
        "lightgreen" | "light_green" => Color::LightGreen,
        "lightblue" | "light_blue" => Color::LightBlue,
        "lightpurple" | "light_purple" | "lightmagenta" | "light_magenta" => Color::LightPurple,
        "lightcyan" | "light_cyan" => Color::LightCyan,
        _ => return None,
    })
}
