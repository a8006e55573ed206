//! Styling for diagnostics on stderr.

use std::io::IsTerminal;

use owo_colors::OwoColorize;

fn should_color() -> bool {
    std::io::stderr().is_terminal()
}

pub fn error(text: impl AsRef<str>) -> String {
    let text = text.as_ref();
    if should_color() {
        format!("{}", text.red())
    } else {
        text.to_string()
    }
}
