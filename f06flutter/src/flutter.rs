//! This module implements the decoding of flutter summary pages and the
//! joining of pages that continue the same sweep.

use std::fmt::Display;

use log::{debug, warn};
use serde::{Serialize, Deserialize};

use crate::error::{MissingItem, ParseError};
use crate::metadata::*;
use crate::pages::{Page, PageKind};
use crate::util::{split_fields, tabular_range};

/// Line with the label and the subcase ID.
pub const FLUTTER_SUMMARY_SUBCASE_LINE: usize = 2;
/// Lines with the `KEY = value` tokens.
pub const FLUTTER_SUMMARY_INFO_LINES: (usize, usize) = (4, 5);
/// Line with the column headers.
pub const FLUTTER_SUMMARY_HEADER_LINE: usize = 8;
/// First line of tabular data.
pub const FLUTTER_SUMMARY_TABULAR_LINE: usize = 9;

/// Number of columns in a flutter summary.
pub const FLUTTER_WIDTH: usize = 7;

/// The columns of a flutter summary, in the order they're printed.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
  Hash
)]
pub enum FlutterColumn {
  /// Reduced frequency.
  Kfreq,
  /// Inverse of the reduced frequency.
  InvKfreq,
  /// Velocity.
  Velocity,
  /// Damping.
  Damping,
  /// Frequency.
  Frequency,
  /// Real part of the eigenvalue.
  RealEigval,
  /// Imaginary part of the eigenvalue.
  ImagEigval
}

impl FlutterColumn {
  /// Returns all the columns, in printed order.
  pub const fn all() -> &'static [Self; FLUTTER_WIDTH] {
    return &[
      Self::Kfreq,
      Self::InvKfreq,
      Self::Velocity,
      Self::Damping,
      Self::Frequency,
      Self::RealEigval,
      Self::ImagEigval
    ];
  }

  /// Returns the position of the column in a row.
  pub const fn position(&self) -> usize {
    return *self as usize;
  }

  /// Returns the upper-case name of the column.
  pub const fn name(&self) -> &'static str {
    return match self {
      Self::Kfreq => "KFREQ",
      Self::InvKfreq => "INV_KFREQ",
      Self::Velocity => "VELOCITY",
      Self::Damping => "DAMPING",
      Self::Frequency => "FREQUENCY",
      Self::RealEigval => "REALEIGVAL",
      Self::ImagEigval => "IMAGEIGVAL",
    };
  }
}

impl Display for FlutterColumn {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.name());
  }
}

/// A row of a flutter summary. Missing values are None.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FlutterRow(pub [Option<f64>; FLUTTER_WIDTH]);

impl FlutterRow {
  /// Decodes a table line.
  pub fn parse(line: &str) -> Self {
    let ntokens = line.split_whitespace().count();
    if ntokens != FLUTTER_WIDTH {
      debug!(
        "Flutter summary line has {} fields instead of {}: {}",
        ntokens,
        FLUTTER_WIDTH,
        line.trim()
      );
    }
    return Self(split_fields::<FLUTTER_WIDTH>(line));
  }

  /// Gets the value in a column.
  pub fn get(&self, col: FlutterColumn) -> Option<f64> {
    return self.0[col.position()];
  }

  /// Gets the velocity.
  pub fn velocity(&self) -> Option<f64> {
    return self.get(FlutterColumn::Velocity);
  }

  /// Gets the damping.
  pub fn damping(&self) -> Option<f64> {
    return self.get(FlutterColumn::Damping);
  }

  /// Gets the frequency.
  pub fn frequency(&self) -> Option<f64> {
    return self.get(FlutterColumn::Frequency);
  }
}

impl From<[f64; FLUTTER_WIDTH]> for FlutterRow {
  fn from(value: [f64; FLUTTER_WIDTH]) -> Self {
    return Self(value.map(Some));
  }
}

/// A decoded flutter summary: the metadata and the rows. After joining, a
/// record may span several pages.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FlutterPageRecord {
  /// The metadata, taken from the first page.
  pub meta: PageMetadata,
  /// The sweep key.
  pub key: SweepKey,
  /// The rows, in the printed order.
  pub rows: Vec<FlutterRow>,
  /// Ordinals of the pages this was decoded from.
  pub pages: Vec<usize>
}

impl FlutterPageRecord {
  /// Returns true if the other record continues this one: same sweep key and
  /// same sweep settings.
  pub fn continued_by(&self, other: &Self) -> bool {
    return self.key == other.key && self.meta.same_sweep_settings(&other.meta);
  }
}

impl Display for FlutterPageRecord {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(
      f,
      "flutter summary ({}, label \"{}\", {} rows)",
      self.key,
      self.meta.label,
      self.rows.len()
    );
  }
}

/// Decodes a flutter summary page. Fails if the metadata needed to key the
/// rows can't be found, or if the column headers aren't where expected.
pub fn parse_flutter_page(
  page: &Page
) -> Result<FlutterPageRecord, ParseError> {
  let malformed = |missing| ParseError::MalformedPage {
    page: page.ordinal,
    missing
  };
  if page.kind != PageKind::FlutterSummary {
    warn!(
      "Decoding page {} as a flutter summary, but it's a {} page.",
      page.ordinal,
      page.kind
    );
  }
  let (a, b) = FLUTTER_SUMMARY_INFO_LINES;
  let meta = parse_metadata(
    page.line(FLUTTER_SUMMARY_SUBCASE_LINE),
    (page.line(a), page.line(b))
  ).map_err(malformed)?;
  let key = meta.sweep_key().map_err(malformed)?;
  let header = page.line(FLUTTER_SUMMARY_HEADER_LINE);
  if !header.contains(FlutterColumn::Kfreq.name()) {
    return Err(malformed(MissingItem::HeaderLine));
  }
  let (start, end) = tabular_range(&page.lines, FLUTTER_SUMMARY_TABULAR_LINE);
  let rows = page.lines[start..end]
    .iter()
    .map(|l| FlutterRow::parse(l))
    .collect::<Vec<_>>();
  debug!(
    "Page {} is a flutter summary for {} with {} rows.",
    page.ordinal,
    key,
    rows.len()
  );
  return Ok(FlutterPageRecord {
    meta,
    key,
    rows,
    pages: vec![page.ordinal]
  });
}

/// Joins flutter records that continue the same sweep across page breaks.
/// Only adjacent records are joined; rows keep their page order. Records
/// sharing a key but disagreeing on the other sweep settings are kept apart.
pub fn join_continuations(
  records: Vec<FlutterPageRecord>
) -> Vec<FlutterPageRecord> {
  let mut joined: Vec<FlutterPageRecord> = Vec::new();
  for record in records {
    let (continues, same_key) = match joined.last() {
      Some(last) => (last.continued_by(&record), last.key == record.key),
      None => (false, false)
    };
    if let (true, Some(last)) = (continues, joined.last_mut()) {
      debug!(
        "Joining {} rows from page(s) {:?} into {}.",
        record.rows.len(),
        record.pages,
        last
      );
      last.rows.extend(record.rows);
      last.pages.extend(record.pages);
      continue;
    }
    if same_key {
      warn!(
        "Page(s) {:?} share a key ({}) with the previous flutter summary but \
        not its sweep settings, keeping them apart.",
        record.pages,
        record.key
      );
    }
    joined.push(record);
  }
  return joined;
}
