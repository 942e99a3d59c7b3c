//! Terminal helpers shared by the CLI and printers.

use owo_colors::OwoColorize;

/// Colors are on unless `NO_COLOR` is set or output is machine-readable.
pub fn use_colors(json: bool) -> bool {
    !json && std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if use_colors(false) {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors(false) {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}
