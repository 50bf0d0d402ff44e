//! This module implements the normalized table all flutter rows of one or more
//! reports are flattened into.

use std::cmp::Ordering;
use std::fmt::Display;

use log::warn;
use serde::{Serialize, Deserialize};

use crate::error::ParseError;
use crate::flutter::{FlutterColumn, FlutterPageRecord, FlutterRow};
use crate::metadata::SweepKey;

/// The key of a group of rows: everything in a row key but the row index.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct GroupKey {
  /// The outer label attached by the caller, if any.
  pub label: Option<f64>,
  /// The sweep.
  pub sweep: SweepKey
}

impl PartialEq for GroupKey {
  fn eq(&self, other: &Self) -> bool {
    return self.cmp(other) == Ordering::Equal;
  }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    return Some(self.cmp(other));
  }
}

impl Ord for GroupKey {
  fn cmp(&self, other: &Self) -> Ordering {
    let labels = match (self.label, other.label) {
      (Some(a), Some(b)) => a.total_cmp(&b),
      (a, b) => a.is_some().cmp(&b.is_some())
    };
    return labels.then(self.sweep.cmp(&other.sweep));
  }
}

impl Display for GroupKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if let Some(label) = self.label {
      write!(f, "label {}, ", label)?;
    }
    return write!(f, "{}", self.sweep);
  }
}

/// The key of a row: the group key plus the row's position within its sweep.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowKey {
  /// The group the row belongs to.
  pub group: GroupKey,
  /// The position of the row within the joined sweep.
  pub index: usize
}

/// A row of the normalized table.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TableRow {
  /// The key.
  pub key: RowKey,
  /// The values.
  pub values: FlutterRow
}

/// All the flutter rows of a report (or several labelled ones), one row per
/// sample.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NormalizedTable {
  /// The name of the outer label (like "THETA"), if labelled.
  pub label_name: Option<String>,
  /// The rows, in sweep order.
  pub rows: Vec<TableRow>
}

impl NormalizedTable {
  /// Returns the number of rows.
  pub fn len(&self) -> usize {
    return self.rows.len();
  }

  /// Returns true if there are no rows.
  pub fn is_empty(&self) -> bool {
    return self.rows.is_empty();
  }

  /// Gets a whole column.
  pub fn column(&self, col: FlutterColumn) -> Vec<Option<f64>> {
    return self.rows.iter().map(|r| r.values.get(col)).collect();
  }

  /// Attaches an outer label to every row, so the table can be concatenated
  /// with tables from other reports without key collisions.
  pub fn labelled<S: Into<String>>(mut self, name: S, value: f64) -> Self {
    self.label_name = Some(name.into());
    for row in self.rows.iter_mut() {
      row.key.group.label = Some(value);
    }
    return self;
  }

  /// Concatenates tables, keeping each one's internal row order. All tables
  /// must carry the same label name (or none at all).
  pub fn concat<I>(tables: I) -> Result<Self, ParseError>
    where I: IntoIterator<Item = Self> {
    let mut tables = tables.into_iter();
    let mut out = match tables.next() {
      Some(t) => t,
      None => return Ok(Self::default())
    };
    let mut unlabelled_joins = 0;
    for table in tables {
      if table.label_name != out.label_name {
        return Err(ParseError::LabelMismatch {
          expected: out.label_name,
          found: table.label_name
        });
      }
      if table.label_name.is_none() {
        unlabelled_joins += 1;
      }
      out.rows.extend(table.rows);
    }
    if unlabelled_joins > 0 {
      warn!(
        "Concatenated {} unlabelled tables; their keys may collide.",
        unlabelled_joins + 1
      );
    }
    return Ok(out);
  }

  /// Iterates over the groups of rows: runs of rows sharing a group key with
  /// consecutive row indices.
  pub fn groups(&self) -> impl Iterator<Item = &[TableRow]> + '_ {
    return self.rows.chunk_by(|a, b| {
      return a.key.group == b.key.group && b.key.index == a.key.index + 1;
    });
  }

  /// Returns true if every group's row indices are dense and zero-based.
  pub fn is_dense(&self) -> bool {
    return self.groups().all(|g| g[0].key.index == 0);
  }
}

/// Flattens (joined) flutter records into a normalized table. Each row is
/// keyed by its record's sweep key and its position within the record.
pub fn to_table(records: &[FlutterPageRecord]) -> NormalizedTable {
  let rows = records.iter()
    .flat_map(|rec| {
      let group = GroupKey { label: None, sweep: rec.key };
      return rec.rows.iter().enumerate().map(move |(index, values)| {
        return TableRow { key: RowKey { group, index }, values: *values };
      });
    })
    .collect();
  return NormalizedTable { label_name: None, rows };
}
