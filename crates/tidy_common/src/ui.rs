//! Terminal output for tidyctl.
//!
//! Lines are built as strings first and printed second, so layout can be
//! tested without a terminal. Colour is dropped when stdout is not a
//! terminal or `NO_COLOR` is set.

use crate::outcome::OutcomeStatus;
use std::io::{self, IsTerminal, Write};
use std::sync::OnceLock;

const RESET: &str = "\x1b[0m";
const RULE_WIDTH: usize = 64;

/// Visual weight of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Title,
    Ok,
    Warn,
    Err,
    Dim,
}

impl Tone {
    fn sgr(self) -> &'static str {
        match self {
            Tone::Title => "\x1b[1;36m",
            Tone::Ok => "\x1b[32m",
            Tone::Warn => "\x1b[33m",
            Tone::Err => "\x1b[31m",
            Tone::Dim => "\x1b[90m",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Tone::Ok => "✓",
            Tone::Warn => "!",
            Tone::Err => "✗",
            Tone::Title | Tone::Dim => "·",
        }
    }
}

impl From<OutcomeStatus> for Tone {
    fn from(status: OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Success => Tone::Ok,
            OutcomeStatus::ElevationRequired => Tone::Warn,
            OutcomeStatus::Failed => Tone::Err,
        }
    }
}

fn color_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal())
}

fn paint_with(color: bool, tone: Tone, text: &str) -> String {
    if color {
        format!("{}{}{}", tone.sgr(), text, RESET)
    } else {
        text.to_string()
    }
}

/// `text` in `tone`, or plain when colour is off
pub fn paint(tone: Tone, text: &str) -> String {
    paint_with(color_enabled(), tone, text)
}

pub fn title_line(name: &str, version: &str) -> String {
    format!("{} {}", name, version)
}

pub fn section_line(name: &str, detail: &str) -> String {
    format!("== {} == {}", name.to_uppercase(), detail)
}

pub fn status_line(tone: Tone, message: &str) -> String {
    format!("{} {}", tone.glyph(), message)
}

pub fn kv_line(key: &str, value: &str, key_width: usize) -> String {
    format!("  {:<width$} {}", format!("{}:", key), value, width = key_width + 1)
}

pub fn print_title(name: &str, version: &str) {
    println!("{}", paint(Tone::Title, &title_line(name, version)));
    println!("{}", paint(Tone::Dim, &"─".repeat(RULE_WIDTH)));
}

pub fn print_rule() {
    println!("{}", paint(Tone::Dim, &"─".repeat(RULE_WIDTH)));
}

pub fn print_section(name: &str, detail: &str) {
    println!("{}", paint(Tone::Title, &section_line(name, detail)));
}

pub fn print_status(tone: Tone, message: &str) {
    println!("{}", paint(tone, &status_line(tone, message)));
}

pub fn print_kv(key: &str, value: &str, key_width: usize) {
    println!("{}", kv_line(key, value, key_width));
}

/// Indented multi-line text, e.g. captured tool output
pub fn print_block(tone: Tone, text: &str) {
    for line in text.lines() {
        println!("    {}", paint(tone, line));
    }
}

/// Live tool output: printed as-is and flushed at once
pub fn print_inline(text: &str) {
    print!("{}", text);
    io::stdout().flush().ok();
}
