//! Colored terminal output
//!
//! All termcolor operations use `let _ =` to deliberately ignore errors.
//! Colored output is decorative: if stdout/stderr is unavailable (broken
//! pipe, no TTY), the run continues without it.

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Print a warning in yellow on stderr
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        let bufwtr = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Yellow)));
        let _ = write!(&mut buffer, "⚠️  ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print an error in red on stderr
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        let bufwtr = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Red)));
        let _ = write!(&mut buffer, "❌ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print a success message in green on stdout
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        let bufwtr = termcolor::BufferWriter::stdout(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Green)));
        let _ = write!(&mut buffer, "✓ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print `[VERBOSE] msg` on stdout when verbose output is enabled
pub fn verbose(enabled: bool, msg: &str) {
    if enabled {
        let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = writeln!(&mut buffer, "[VERBOSE] {msg}");
        let _ = bufwtr.print(&buffer);
    }
}

/// Render a two-column key/value table
#[must_use]
pub fn render_table(title: &str, rows: &[(&str, String)]) -> String {
    let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| v.chars().count()).max().unwrap_or(0);
    let inner = (key_width + value_width + 3).max(title.chars().count());
    let rule = format!("+{}+", "-".repeat(inner + 2));

    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("| {title:<inner$} |\n"));
    out.push_str(&rule);
    out.push('\n');
    for (key, value) in rows {
        let value_pad = inner - key_width - 3;
        out.push_str(&format!("| {key:<key_width$} | {value:<value_pad$} |\n"));
    }
    out.push_str(&rule);
    out
}

/// Print the run summary table to stdout
pub fn print_summary(title: &str, rows: &[(&str, String)]) {
    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
    let _ = writeln!(&mut buffer, "{}", render_table(title, rows));
    let _ = buffer.reset();
    let _ = bufwtr.print(&buffer);
}
