//! Build diagnostics.
//!
//! Cross-reference problems found during generation (a function invoking a
//! method that does not exist, a stream trigger on an unknown store) are not
//! fatal to the generator. They are reported to a [`DiagnosticSink`] with the
//! source location of the offending declaration so one pass can surface every
//! problem, and the caller decides whether the build fails.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Note,
  Warning,
  Error,
}

impl fmt::Display for Severity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Severity::Note => write!(f, "note"),
      Severity::Warning => write!(f, "warning"),
      Severity::Error => write!(f, "error"),
    }
  }
}

/// Where a declaration came from in developer code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
  pub file: String,
  #[serde(default)]
  pub line: u32,
  /// The annotated element, e.g. `ItemsHandler.getItems`.
  #[serde(default)]
  pub element: Option<String>,
}

impl fmt::Display for SourceLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.file, self.line)?;
    if let Some(element) = &self.element {
      write!(f, " ({})", element)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
  pub severity: Severity,
  pub message: String,
  pub location: Option<SourceLocation>,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.location {
      Some(location) => write!(f, "{}: {} at {}", self.severity, self.message, location),
      None => write!(f, "{}: {}", self.severity, self.message),
    }
  }
}

pub trait DiagnosticSink {
  fn report(&mut self, diagnostic: Diagnostic);

  fn error(&mut self, message: String, location: Option<&SourceLocation>) {
    self.report(Diagnostic {
      severity: Severity::Error,
      message,
      location: location.cloned(),
    });
  }

  fn warning(&mut self, message: String, location: Option<&SourceLocation>) {
    self.report(Diagnostic {
      severity: Severity::Warning,
      message,
      location: location.cloned(),
    });
  }
}

/// Collects every reported diagnostic and mirrors it to the log.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
  items: Vec<Diagnostic>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn all(&self) -> &[Diagnostic] {
    &self.items
  }

  pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
    self.items.iter().filter(|d| d.severity == Severity::Error)
  }

  pub fn has_errors(&self) -> bool {
    self.errors().next().is_some()
  }

  pub fn error_count(&self) -> usize {
    self.errors().count()
  }
}

impl DiagnosticSink for Diagnostics {
  fn report(&mut self, diagnostic: Diagnostic) {
    let location = diagnostic.location.as_ref().map(ToString::to_string).unwrap_or_default();
    match diagnostic.severity {
      Severity::Error => error!(location = %location, "{}", diagnostic.message),
      Severity::Warning => warn!(location = %location, "{}", diagnostic.message),
      Severity::Note => info!(location = %location, "{}", diagnostic.message),
    }
    self.items.push(diagnostic);
  }
}
