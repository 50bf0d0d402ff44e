//! This module implements the decoding of the modal results that usually come
//! along with a flutter analysis: real eigenvalue tables and modal effective
//! mass fraction tables.

use std::collections::BTreeMap;
use std::fmt::Display;

use log::{debug, warn};
use serde::{Serialize, Deserialize};

use crate::metadata::parse_label_subcase;
use crate::pages::Page;
use crate::util::{split_fields, tabular_range};

/// Line with the label and the subcase ID, in both kinds of page.
pub const MODAL_SUBCASE_LINE: usize = 2;
/// First line of tabular data in a real eigenvalue table.
pub const EIGENVALUE_TABULAR_LINE: usize = 7;
/// Line that may hold the residual vector augmentation notice, which pushes
/// the table one line down.
pub const EIGENVALUE_AUGMENTATION_LINE: usize = 5;
/// The residual vector augmentation notice.
pub const EIGENVALUE_AUGMENTATION_NOTICE: &str =
  "AUGMENTATION OF RESIDUAL VECTORS";
/// Number of columns in a real eigenvalue table.
pub const EIGENVALUE_WIDTH: usize = 7;

/// First line of tabular data in a mass fraction table.
pub const MASS_FRACTION_TABULAR_LINE: usize = 10;
/// First line of tabular data in a mass fraction continuation page.
pub const MASS_FRACTION_CONTINUATION_TABULAR_LINE: usize = 7;
/// Line telling translational tables apart.
pub const MASS_FRACTION_TRANSLATION_LINE: usize = 5;
/// The text telling translational tables apart.
pub const MASS_FRACTION_TRANSLATION_NOTICE: &str =
  "FOR TRANSLATIONAL DEGREES OF FREEDOM";
/// Line with the column headers in a continuation page.
pub const MASS_FRACTION_CONTINUATION_HEADER_LINE: usize = 4;
/// Number of columns in a mass fraction table.
pub const MASS_FRACTION_WIDTH: usize = 8;

/// The columns of a real eigenvalue table, in the order they're printed.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum EigenColumn {
  /// Mode number.
  Mode,
  /// Extraction order.
  ExtractionOrder,
  /// The eigenvalue.
  Eigenvalue,
  /// Natural frequency in rad/s.
  Radians,
  /// Natural frequency in Hz.
  Cycles,
  /// Generalized mass.
  GeneralizedMass,
  /// Generalized stiffness.
  GeneralizedStiffness
}

impl EigenColumn {
  /// Returns all the columns, in printed order.
  pub const fn all() -> &'static [Self; EIGENVALUE_WIDTH] {
    return &[
      Self::Mode,
      Self::ExtractionOrder,
      Self::Eigenvalue,
      Self::Radians,
      Self::Cycles,
      Self::GeneralizedMass,
      Self::GeneralizedStiffness
    ];
  }

  /// Returns the upper-case name of the column.
  pub const fn name(&self) -> &'static str {
    return match self {
      Self::Mode => "MODE",
      Self::ExtractionOrder => "EXTRACTIONORDER",
      Self::Eigenvalue => "EIGENVALUE",
      Self::Radians => "RADIANS",
      Self::Cycles => "CYCLES",
      Self::GeneralizedMass => "GENERALIZEDMASS",
      Self::GeneralizedStiffness => "GENERALIZEDSTIFF",
    };
  }
}

impl Display for EigenColumn {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.name());
  }
}

/// A decoded real eigenvalue table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RealEigenvalueTable {
  /// The subcase ID, if the label line was found.
  pub subcase: Option<usize>,
  /// The subcase label.
  pub label: Option<String>,
  /// The rows. Missing values are None.
  pub rows: Vec<[Option<f64>; EIGENVALUE_WIDTH]>,
  /// The ordinal of the page.
  pub page: usize
}

impl RealEigenvalueTable {
  /// Gets a whole column.
  pub fn column(&self, col: EigenColumn) -> Vec<Option<f64>> {
    return self.rows.iter().map(|r| r[col as usize]).collect();
  }
}

/// Decodes the label and subcase of a modal page, warning if absent.
fn label_subcase(page: &Page) -> (Option<String>, Option<usize>) {
  return match parse_label_subcase(page.line(MODAL_SUBCASE_LINE)) {
    Some((label, subcase)) => (Some(label), Some(subcase)),
    None => {
      warn!("Page {} has no label/subcase line.", page.ordinal);
      (None, None)
    }
  };
}

/// Decodes a real eigenvalue page.
pub fn parse_real_eigenvalue_page(page: &Page) -> RealEigenvalueTable {
  let augmented = page.line(EIGENVALUE_AUGMENTATION_LINE)
    .contains(EIGENVALUE_AUGMENTATION_NOTICE);
  let start = EIGENVALUE_TABULAR_LINE + usize::from(augmented);
  let (a, b) = tabular_range(&page.lines, start);
  let (label, subcase) = label_subcase(page);
  let rows = page.lines[a..b]
    .iter()
    .map(|l| split_fields::<EIGENVALUE_WIDTH>(l))
    .collect::<Vec<_>>();
  debug!(
    "Page {} is a real eigenvalue table with {} modes.",
    page.ordinal,
    rows.len()
  );
  return RealEigenvalueTable { subcase, label, rows, page: page.ordinal };
}

/// Summarizes the real eigenvalues per subcase: one column of each subcase's
/// last table, indexed by mode (first mode first).
pub fn summarize_real_eigenvalues(
  tables: &[RealEigenvalueTable],
  col: EigenColumn
) -> BTreeMap<usize, Vec<Option<f64>>> {
  return tables.iter()
    .filter_map(|t| t.subcase.map(|sc| (sc, t.column(col))))
    .collect();
}

/// The degrees of freedom a mass fraction table refers to.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MassFractionDofs {
  /// T1, T2 and T3.
  Translational,
  /// R1, R2 and R3.
  Rotational
}

impl MassFractionDofs {
  /// Returns the column names.
  pub const fn columns(&self) -> &'static [&'static str; MASS_FRACTION_WIDTH] {
    return match self {
      Self::Translational => &[
        "MODE", "FREQUENCY", "T1FRAC", "T1SUM", "T2FRAC", "T2SUM", "T3FRAC",
        "T3SUM"
      ],
      Self::Rotational => &[
        "MODE", "FREQUENCY", "R1FRAC", "R1SUM", "R2FRAC", "R2SUM", "R3FRAC",
        "R3SUM"
      ],
    };
  }
}

/// A decoded modal effective mass fraction table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MassFractionTable {
  /// The subcase ID, if the label line was found.
  pub subcase: Option<usize>,
  /// The subcase label.
  pub label: Option<String>,
  /// The degrees of freedom in this table.
  pub dofs: MassFractionDofs,
  /// Whether the first page continued a previous page's table.
  pub continuation: bool,
  /// The rows. Missing values are None.
  pub rows: Vec<[Option<f64>; MASS_FRACTION_WIDTH]>,
  /// The ordinals of the pages.
  pub pages: Vec<usize>
}

/// Decodes a modal effective mass fraction page. Continuation pages have a
/// shorter preamble and tell the degrees of freedom by the column headers.
pub fn parse_mass_fraction_page(page: &Page) -> MassFractionTable {
  let (start, dofs) = if page.continuation {
    let translational = page.line(MASS_FRACTION_CONTINUATION_HEADER_LINE)
      .contains("T1");
    (MASS_FRACTION_CONTINUATION_TABULAR_LINE, translational)
  } else {
    let translational = page.line(MASS_FRACTION_TRANSLATION_LINE)
      .contains(MASS_FRACTION_TRANSLATION_NOTICE);
    (MASS_FRACTION_TABULAR_LINE, translational)
  };
  let dofs = if dofs {
    MassFractionDofs::Translational
  } else {
    MassFractionDofs::Rotational
  };
  let (a, b) = tabular_range(&page.lines, start);
  let (label, subcase) = label_subcase(page);
  let rows = page.lines[a..b]
    .iter()
    .map(|l| split_fields::<MASS_FRACTION_WIDTH>(l))
    .collect::<Vec<_>>();
  return MassFractionTable {
    subcase,
    label,
    dofs,
    continuation: page.continuation,
    rows,
    pages: vec![page.ordinal]
  };
}

/// Joins continuation pages into the table they continue (same subcase and
/// degrees of freedom).
pub fn join_mass_fractions(
  tables: Vec<MassFractionTable>
) -> Vec<MassFractionTable> {
  let mut joined: Vec<MassFractionTable> = Vec::new();
  for table in tables {
    if let Some(last) = joined.last_mut() {
      let continues = table.continuation
        && last.subcase == table.subcase
        && last.dofs == table.dofs;
      if continues {
        last.rows.extend(table.rows);
        last.pages.extend(table.pages);
        continue;
      }
    }
    joined.push(table);
  }
  return joined;
}
