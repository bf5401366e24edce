//! Terminal output for the nimbus CLI.
//!
//! Status lines go through the `print_*` helpers. Diagnostics and errors go to
//! stderr so `--format json` output on stdout stays parseable.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use nimbus_lib::diagnostic::{Diagnostic, Severity};
use owo_colors::{OwoColorize, Stream, Style};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
}

/// Shorten a template hash for display.
pub fn truncate_hash(hash: &str) -> &str {
  hash.get(..12).unwrap_or(hash)
}

pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];

  if bytes < 1024 {
    return format!("{} B", bytes);
  }
  let mut size = bytes as f64 / 1024.0;
  let mut unit = 0;
  while size >= 1024.0 && unit < UNITS.len() - 1 {
    size /= 1024.0;
    unit += 1;
  }
  format!("{:.1} {}", size, UNITS[unit])
}

pub fn format_duration(duration: Duration) -> String {
  match duration.as_secs() {
    0 => format!("{}ms", duration.as_millis()),
    1..60 => format!("{:.2}s", duration.as_secs_f64()),
    secs => format!("{}m {}s", secs / 60, secs % 60),
  }
}

fn status_line(stream: Stream, symbol: &str, style: Style, message: &str, style_message: bool) {
  let symbol = symbol.if_supports_color(stream, |s| s.style(style));
  let line = if style_message {
    format!("{} {}", symbol, message.if_supports_color(stream, |s| s.style(style)))
  } else {
    format!("{} {}", symbol, message)
  };
  match stream {
    Stream::Stderr => eprintln!("{}", line),
    _ => println!("{}", line),
  }
}

pub fn print_success(message: &str) {
  status_line(Stream::Stdout, symbols::SUCCESS, Style::new().green(), message, false);
}

pub fn print_error(message: &str) {
  status_line(Stream::Stderr, symbols::ERROR, Style::new().red(), message, true);
}

pub fn print_warning(message: &str) {
  status_line(Stream::Stderr, symbols::WARNING, Style::new().yellow(), message, true);
}

pub fn print_info(message: &str) {
  status_line(Stream::Stdout, symbols::INFO, Style::new().blue(), message, false);
}

/// Print a synthesis diagnostic on stderr, colored by severity.
pub fn print_diagnostic(diagnostic: &Diagnostic) {
  let message = diagnostic.to_string();
  match diagnostic.severity {
    Severity::Error => print_error(&message),
    Severity::Warning => print_warning(&message),
    Severity::Note => status_line(Stream::Stderr, symbols::INFO, Style::new().blue(), &message, false),
  }
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Print an indented list entry.
pub fn print_item(indent: usize, symbol: &str, text: &str) {
  println!("{:width$}{} {}", "", symbol, text, width = indent * 2);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
