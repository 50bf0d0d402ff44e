//! This module implements the detection of the solver that wrote a report,
//! from the version name printed on every page header.

use std::fmt::Display;

use serde::{Serialize, Deserialize};

/// The different known solvers.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum Solver {
  /// MSC Nastran (and its older MSC.NASTRAN spelling).
  Msc,
  /// The Simcenter Nastran solver, formerly known as NX Nastran.
  Simcenter,
  /// The MYSTRAN solver originally developed by Dr. Bill Case.
  Mystran
}

impl Solver {
  /// Returns all known solvers.
  pub const fn all() -> &'static [Self] {
    return &[Self::Msc, Self::Simcenter, Self::Mystran];
  }

  /// Returns a human-readable name for the solver.
  pub const fn name(&self) -> &'static str {
    return match self {
      Self::Msc => "MSC Nastran",
      Self::Simcenter => "Simcenter Nastran",
      Self::Mystran => "MYSTRAN",
    };
  }

  /// Returns the upper-case fragments that identify the solver in a version
  /// name.
  const fn fragments(&self) -> &'static [&'static str] {
    return match self {
      Self::Msc => &["MSC.NASTRAN", "MSC NASTRAN", "MSC"],
      Self::Simcenter => &["SIMCENTER", "NX NASTRAN", "NX"],
      Self::Mystran => &["MYSTRAN"],
    };
  }

  /// Tries to detect the solver from a version name.
  pub fn detect(version_name: &str) -> Option<Self> {
    let upper = version_name.to_uppercase();
    return Self::all()
      .iter()
      .copied()
      .find(|s| s.fragments().iter().any(|f| upper.contains(f)));
  }
}

impl Display for Solver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.name());
  }
}
