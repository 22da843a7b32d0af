// ANSI styling helpers for terminal output

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const UNDERLINE: &str = "\x1b[4m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

static RE_ANSI_SGR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());

fn wrap(codes: &str, text: &str) -> String {
    format!("{codes}{text}{RESET}")
}

pub fn green(text: &str) -> String {
    wrap(GREEN, text)
}

pub fn red(text: &str) -> String {
    wrap(RED, text)
}

pub fn yellow(text: &str) -> String {
    wrap(YELLOW, text)
}

pub fn bold(text: &str) -> String {
    wrap(BOLD, text)
}

pub fn bold_underline(text: &str) -> String {
    wrap(&format!("{BOLD}{UNDERLINE}"), text)
}

/// Remove SGR escape sequences, leaving only printable text
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    RE_ANSI_SGR.replace_all(text, "")
}

/// Number of terminal columns `text` occupies once escapes are ignored
pub fn visible_width(text: &str) -> usize {
    strip_ansi(text).chars().count()
}
