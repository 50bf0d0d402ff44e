//! This module implements the search for critical roots: the points where a
//! mode's damping crosses zero, i.e. where flutter starts.
//!
//! Within each group of the normalized table (one label, subcase, Mach number
//! and mode), the first row whose damping is considered unstable is the upper
//! bound, the row right before it is the lower bound, and every column is
//! linearly interpolated between them to the point where damping is zero.

use std::cmp::Ordering;
use std::str::FromStr;

use clap::{Args, ValueEnum};
use itertools::Itertools;
use log::{debug, warn};
use serde::{Serialize, Deserialize};

use crate::flutter::{FlutterColumn, FlutterRow, FLUTTER_WIDTH};
use crate::table::{GroupKey, NormalizedTable, TableRow};

/// How damping is compared against the tolerance to be deemed unstable.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Comparison {
  /// Unstable if `damping >= -epsilon`.
  AtLeast,
  /// Unstable if `damping > -epsilon`.
  Above
}

impl Default for Comparison {
  fn default() -> Self {
    return Self::AtLeast;
  }
}

impl FromStr for Comparison {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    return Self::all()
      .iter()
      .copied()
      .find(|v| s.eq_ignore_ascii_case(v.small_lc_name()))
      .ok_or(());
  }
}

impl ValueEnum for Comparison {
  fn value_variants<'a>() -> &'a [Self] {
    return Self::all();
  }

  fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
    return Some(self.small_lc_name().into());
  }
}

impl Comparison {
  /// Returns all variants.
  pub const fn all() -> &'static [Self] {
    return &[Self::AtLeast, Self::Above];
  }

  /// Returns a small name for the variant (lower-case).
  pub const fn small_lc_name(&self) -> &'static str {
    return match self {
      Self::AtLeast => "at-least",
      Self::Above => "above",
    };
  }
}

/// What to do when a mode is already unstable at the first sample of its
/// sweep, so there is no stable sample to interpolate from.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum FirstSamplePolicy {
  /// Warn and produce no root for the mode.
  Skip,
  /// Produce the first sample itself as the root, tagged as such.
  Report
}

impl Default for FirstSamplePolicy {
  fn default() -> Self {
    return Self::Skip;
  }
}

impl FromStr for FirstSamplePolicy {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    return Self::all()
      .iter()
      .copied()
      .find(|v| s.eq_ignore_ascii_case(v.small_lc_name()))
      .ok_or(());
  }
}

impl ValueEnum for FirstSamplePolicy {
  fn value_variants<'a>() -> &'a [Self] {
    return Self::all();
  }

  fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
    return Some(self.small_lc_name().into());
  }
}

impl FirstSamplePolicy {
  /// Returns all variants.
  pub const fn all() -> &'static [Self] {
    return &[Self::Skip, Self::Report];
  }

  /// Returns a small name for the variant (lower-case).
  pub const fn small_lc_name(&self) -> &'static str {
    return match self {
      Self::Skip => "skip",
      Self::Report => "report",
    };
  }
}

/// The settings for a critical root search.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Args)]
pub struct RootSearch {
  /// Damping tolerance: damping is unstable when compared to -epsilon.
  #[arg(short = 'e', long = "epsilon", default_value = "1e-9")]
  pub epsilon: f64,
  /// How damping is compared against -epsilon.
  #[arg(short = 'c', long = "comparison", default_value = "at-least")]
  pub comparison: Comparison,
  /// What to do with modes already unstable at the first sample.
  #[arg(short = 'f', long = "first-sample", default_value = "skip")]
  pub first_sample: FirstSamplePolicy
}

impl Default for RootSearch {
  fn default() -> Self {
    return Self {
      epsilon: 1e-9,
      comparison: Comparison::default(),
      first_sample: FirstSamplePolicy::default()
    };
  }
}

impl RootSearch {
  /// Instantiates a search with a tolerance and the default settings
  /// otherwise.
  pub fn with_epsilon(epsilon: f64) -> Self {
    return Self { epsilon, ..Self::default() };
  }

  /// Returns true if a damping value counts as unstable.
  pub fn unstable(&self, damping: f64) -> bool {
    return match self.comparison {
      Comparison::AtLeast => damping >= -self.epsilon,
      Comparison::Above => damping > -self.epsilon,
    };
  }

  /// Returns true if a row counts as unstable. Missing damping never does.
  fn unstable_row(&self, row: &TableRow) -> bool {
    return row.values.damping().is_some_and(|d| self.unstable(d));
  }
}

/// How a critical root was obtained.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Onset {
  /// Interpolated between a stable and an unstable sample.
  Interpolated,
  /// The first sample of the sweep, which was already unstable.
  FirstSample
}

/// A critical root: where a mode starts to flutter.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CriticalRoot {
  /// The group the root was found in.
  pub key: GroupKey,
  /// The values at the root. Damping is zero if interpolated.
  pub values: FlutterRow,
  /// How the root was obtained.
  pub onset: Onset,
  /// The row index of the first unstable sample.
  pub upper_index: usize
}

impl CriticalRoot {
  /// Gets the flutter velocity.
  pub fn velocity(&self) -> Option<f64> {
    return self.values.velocity();
  }

  /// Gets the flutter frequency.
  pub fn frequency(&self) -> Option<f64> {
    return self.values.frequency();
  }
}

/// Linearly interpolates every column between two rows, parameterized on
/// damping, to the point where damping is zero. Returns None if either
/// damping is missing or both are equal.
pub fn interpolate_to_zero_damping(
  lower: &FlutterRow,
  upper: &FlutterRow
) -> Option<FlutterRow> {
  let dl = lower.damping()?;
  let du = upper.damping()?;
  if du == dl {
    return None;
  }
  let mut out = [None; FLUTTER_WIDTH];
  for (slot, col) in out.iter_mut().zip(FlutterColumn::all()) {
    *slot = match (col, lower.get(*col), upper.get(*col)) {
      (FlutterColumn::Damping, _, _) => Some(0.0),
      (_, Some(yl), Some(yu)) => Some(yl + (0.0 - dl) * (yu - yl) / (du - dl)),
      _ => None
    };
  }
  return Some(FlutterRow(out));
}

/// Finds the critical root within a single group, if any.
fn group_root(group: &[TableRow], search: &RootSearch) -> Option<CriticalRoot> {
  let first = group.first()?;
  let key = first.key.group;
  let upper_pos = match group.iter().position(|r| search.unstable_row(r)) {
    Some(p) => p,
    None => {
      debug!("No unstable samples in {}.", key);
      return None;
    }
  };
  let upper = &group[upper_pos];
  if upper_pos == 0 {
    return match search.first_sample {
      FirstSamplePolicy::Skip => {
        warn!(
          "Can't interpolate in {}: mode is already unstable at the first \
          sample.",
          key
        );
        None
      },
      FirstSamplePolicy::Report => Some(CriticalRoot {
        key,
        values: upper.values,
        onset: Onset::FirstSample,
        upper_index: upper.key.index
      })
    };
  }
  let lower = &group[upper_pos - 1];
  let values = match interpolate_to_zero_damping(&lower.values, &upper.values) {
    Some(v) => v,
    None => {
      warn!(
        "Can't interpolate in {} between rows {} and {}: bad damping values.",
        key,
        lower.key.index,
        upper.key.index
      );
      return None;
    }
  };
  return Some(CriticalRoot {
    key,
    values,
    onset: Onset::Interpolated,
    upper_index: upper.key.index
  });
}

/// Finds the critical root of every group in a table. An empty result is a
/// valid outcome (nothing flutters), and gets a warning.
pub fn critical_roots(
  table: &NormalizedTable,
  search: &RootSearch
) -> Vec<CriticalRoot> {
  let roots = table.groups()
    .filter_map(|g| group_root(g, search))
    .collect::<Vec<_>>();
  if roots.is_empty() {
    warn!(
      "No critical roots were found; check the epsilon value ({}) or the \
      analysis parameters.",
      search.epsilon
    );
  }
  return roots;
}

/// The flow condition of a root: everything in its key but the mode.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Condition {
  /// The outer label.
  label: Option<f64>,
  /// The subcase ID.
  subcase: usize,
  /// The Mach number.
  mach_number: f64
}

impl From<&GroupKey> for Condition {
  fn from(key: &GroupKey) -> Self {
    return Self {
      label: key.label,
      subcase: key.sweep.subcase,
      mach_number: key.sweep.mach_number
    };
  }
}

/// Orders roots by velocity, missing velocities last.
fn by_velocity(a: &CriticalRoot, b: &CriticalRoot) -> Ordering {
  let v = |r: &CriticalRoot| r.velocity().unwrap_or(f64::INFINITY);
  return v(a).total_cmp(&v(b));
}

/// Keeps, for every label, subcase and Mach number, only the root with the
/// lowest velocity: the mode that flutters first.
pub fn governing_roots(roots: &[CriticalRoot]) -> Vec<CriticalRoot> {
  let mut sorted = roots.to_vec();
  sorted.sort_by(|a, b| a.key.cmp(&b.key));
  let grouped = sorted.into_iter().group_by(|r| Condition::from(&r.key));
  return grouped.into_iter()
    .filter_map(|(_, group)| group.min_by(by_velocity))
    .collect();
}
