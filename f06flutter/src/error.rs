//! This module contains the error type returned when reading reports and
//! assembling their results.

use std::error::Error;
use std::fmt::Display;
use std::io;

use crate::metadata::MetaKey;

/// What was missing or invalid in a malformed page.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MissingItem {
  /// The line carrying the label and the subcase ID.
  LabelLine,
  /// A metadata key, either absent or holding a value of the wrong kind.
  Key(MetaKey),
  /// The line with the column headers.
  HeaderLine,
}

impl Display for MissingItem {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::LabelLine => write!(f, "label/subcase line"),
      Self::Key(k) => write!(f, "key \"{}\"", k.name()),
      Self::HeaderLine => write!(f, "column header line"),
    };
  }
}

/// Errors that abort the reading of a report or the assembly of a table.
#[derive(Debug)]
pub enum ParseError {
  /// The report could not be read.
  Io(io::Error),
  /// A page was classified as a flutter summary, but the metadata we need to
  /// key its rows could not be found.
  MalformedPage {
    /// The ordinal of the page within the report (zero-based).
    page: usize,
    /// What was missing.
    missing: MissingItem,
  },
  /// Tried to concatenate tables labelled with different label names.
  LabelMismatch {
    /// The label name of the first table.
    expected: Option<String>,
    /// The offending label name.
    found: Option<String>,
  },
  /// A batch read got a different number of files and labels.
  LabelCount {
    /// How many files were given.
    files: usize,
    /// How many labels were given.
    labels: usize,
  },
}

impl Display for ParseError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::Io(e) => e.fmt(f),
      Self::MalformedPage { page, missing } => write!(
        f,
        "malformed flutter summary on page {}: missing or invalid {}",
        page,
        missing
      ),
      Self::LabelMismatch { expected, found } => write!(
        f,
        "label mismatch (expected {}, found {})",
        expected.as_deref().unwrap_or("no label"),
        found.as_deref().unwrap_or("no label")
      ),
      Self::LabelCount { files, labels } => write!(
        f,
        "got {} files but {} labels",
        files,
        labels
      ),
    };
  }
}

impl Error for ParseError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    return match self {
      Self::Io(e) => Some(e),
      _ => None,
    };
  }
}

impl From<io::Error> for ParseError {
  fn from(value: io::Error) -> Self {
    return Self::Io(value);
  }
}
