//! This module defines the metadata found on top of flutter summary pages and
//! the keys built out of it.

use std::cmp::Ordering;
use std::fmt::Display;

use serde::{Serialize, Deserialize};

use crate::error::MissingItem;
use crate::util::word_boundary_before;

/// Generates the MetaKey enum out of the keys' literal texts.
macro_rules! gen_meta_keys {
  (
    $(($vn:ident, $txt:literal),)*
  ) => {
    /// The known metadata keys in a flutter summary page.
    #[derive(
      Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd,
      Ord, Hash
    )]
    #[allow(missing_docs)]
    pub enum MetaKey {
      $($vn,)*
    }

    impl MetaKey {
      /// Returns the literal text of the key, as printed by the solver.
      pub const fn name(&self) -> &'static str {
        return match self {
          $(Self::$vn => $txt,)*
        };
      }

      /// Returns all the keys, in canonical order.
      pub const fn all() -> &'static [Self] {
        return &[$(Self::$vn,)*];
      }
    }
  };
}

gen_meta_keys!(
  (Subcase, "SUBCASE"),
  (Label, "LABEL"),
  (Point, "POINT"),
  (MachNumber, "MACH NUMBER"),
  (DensityRatio, "DENSITY RATIO"),
  (Method, "METHOD"),
  (Configuration, "CONFIGURATION"),
  (XySymmetry, "XY-SYMMETRY"),
  (XzSymmetry, "XZ-SYMMETRY"),
);

impl Display for MetaKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.name());
  }
}

/// A scalar metadata value. Numeric when parseable, else kept as text.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, derive_more::From)]
pub enum MetaValue {
  /// An integer, like a point ID.
  Integer(i64),
  /// A real, like a Mach number.
  Real(f64),
  /// Anything that didn't parse as a number.
  Text(String),
}

impl MetaValue {
  /// Parses a token: integer first, then real, else text.
  pub fn parse(token: &str) -> Self {
    if let Ok(i) = token.parse::<i64>() {
      return Self::Integer(i);
    }
    if let Ok(x) = token.parse::<f64>() {
      return Self::Real(x);
    }
    return Self::Text(token.to_string());
  }

  /// Returns the value as a real, if it's numeric.
  pub fn as_real(&self) -> Option<f64> {
    return match self {
      Self::Integer(i) => Some(*i as f64),
      Self::Real(x) => Some(*x),
      Self::Text(_) => None,
    };
  }

  /// Returns the value as an integer, if it's integral.
  pub fn as_integer(&self) -> Option<i64> {
    return match self {
      Self::Integer(i) => Some(*i),
      Self::Real(x) if x.fract() == 0.0 && x.is_finite() => Some(*x as i64),
      _ => None,
    };
  }
}

impl Display for MetaValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::Integer(i) => write!(f, "{}", i),
      Self::Real(x) => write!(f, "{}", x),
      Self::Text(s) => write!(f, "{}", s),
    };
  }
}

/// Identifies a sweep: one subcase, one Mach number, one mode.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct SweepKey {
  /// The subcase ID.
  pub subcase: usize,
  /// The Mach number.
  pub mach_number: f64,
  /// The point (mode) ID.
  pub point: usize,
}

impl PartialEq for SweepKey {
  fn eq(&self, other: &Self) -> bool {
    return self.cmp(other) == Ordering::Equal;
  }
}

impl Eq for SweepKey {}

impl PartialOrd for SweepKey {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    return Some(self.cmp(other));
  }
}

impl Ord for SweepKey {
  fn cmp(&self, other: &Self) -> Ordering {
    return self.subcase.cmp(&other.subcase)
      .then(self.mach_number.total_cmp(&other.mach_number))
      .then(self.point.cmp(&other.point));
  }
}

impl Display for SweepKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(
      f,
      "subcase {}, mach {}, point {}",
      self.subcase,
      self.mach_number,
      self.point
    );
  }
}

/// The metadata of a flutter summary page, one field per known key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PageMetadata {
  /// The subcase ID.
  pub subcase: usize,
  /// The subcase label (free text, may be empty).
  pub label: String,
  /// The point (mode) ID.
  pub point: MetaValue,
  /// The Mach number.
  pub mach_number: MetaValue,
  /// The density ratio.
  pub density_ratio: MetaValue,
  /// The flutter method (PK, PKNL, K...).
  pub method: MetaValue,
  /// The aerodynamic configuration name.
  pub configuration: MetaValue,
  /// XY-symmetry flag.
  pub xy_symmetry: MetaValue,
  /// XZ-symmetry flag.
  pub xz_symmetry: MetaValue,
}

impl PageMetadata {
  /// Gets the value for a key.
  pub fn get(&self, key: MetaKey) -> MetaValue {
    return match key {
      MetaKey::Subcase => MetaValue::Integer(self.subcase as i64),
      MetaKey::Label => MetaValue::Text(self.label.clone()),
      MetaKey::Point => self.point.clone(),
      MetaKey::MachNumber => self.mach_number.clone(),
      MetaKey::DensityRatio => self.density_ratio.clone(),
      MetaKey::Method => self.method.clone(),
      MetaKey::Configuration => self.configuration.clone(),
      MetaKey::XySymmetry => self.xy_symmetry.clone(),
      MetaKey::XzSymmetry => self.xz_symmetry.clone(),
    };
  }

  /// Builds the sweep key. Fails if the point or the Mach number aren't
  /// numeric, since rows can't be keyed without them.
  pub fn sweep_key(&self) -> Result<SweepKey, MissingItem> {
    let point = self.point.as_integer()
      .and_then(|p| usize::try_from(p).ok())
      .ok_or(MissingItem::Key(MetaKey::Point))?;
    let mach_number = self.mach_number.as_real()
      .ok_or(MissingItem::Key(MetaKey::MachNumber))?;
    return Ok(SweepKey { subcase: self.subcase, mach_number, point });
  }

  /// Returns true if the sweep-defining metadata other than the key (label,
  /// density ratio, method, configuration) agree between two pages.
  pub fn same_sweep_settings(&self, other: &Self) -> bool {
    return self.label == other.label
      && self.density_ratio == other.density_ratio
      && self.method == other.method
      && self.configuration == other.configuration;
  }
}

/// Decodes the label/subcase line. The label is whatever comes before the
/// last `SUBCASE` token (skipping the carriage control column), and the
/// subcase ID is the integer right after it.
pub fn parse_label_subcase(line: &str) -> Option<(String, usize)> {
  let body = line.get(1..)?;
  let pos = body.rfind(MetaKey::Subcase.name())?;
  let label = body[..pos].trim().to_string();
  let subcase = body[pos + MetaKey::Subcase.name().len()..]
    .split_whitespace()
    .next()?
    .parse::<usize>()
    .ok()?;
  return Some((label, subcase));
}

/// Finds the token following `KEY =` in a line. The key must not be preceded
/// by a word character. Returns None if the key isn't there.
pub fn find_key_value<'a>(line: &'a str, key: MetaKey) -> Option<&'a str> {
  let pattern = format!("{} =", key.name());
  let mut start = 0;
  while let Some(rel) = line[start..].find(&pattern) {
    let pos = start + rel;
    if word_boundary_before(line, pos) {
      let rest = &line[pos + pattern.len()..];
      return Some(rest.split_whitespace().next().unwrap_or(""));
    }
    start = pos + pattern.len();
  }
  return None;
}

/// Decodes the flutter summary metadata out of the label/subcase line and the
/// two info lines.
pub fn parse_metadata(
  label_line: &str,
  info_lines: (&str, &str)
) -> Result<PageMetadata, MissingItem> {
  let (label, subcase) = parse_label_subcase(label_line)
    .ok_or(MissingItem::LabelLine)?;
  let raw = format!("{} {}", info_lines.0, info_lines.1);
  let value = |key: MetaKey| -> Result<MetaValue, MissingItem> {
    return find_key_value(&raw, key)
      .map(MetaValue::parse)
      .ok_or(MissingItem::Key(key));
  };
  return Ok(PageMetadata {
    subcase,
    label,
    point: value(MetaKey::Point)?,
    mach_number: value(MetaKey::MachNumber)?,
    density_ratio: value(MetaKey::DensityRatio)?,
    method: value(MetaKey::Method)?,
    configuration: value(MetaKey::Configuration)?,
    xy_symmetry: value(MetaKey::XySymmetry)?,
    xz_symmetry: value(MetaKey::XzSymmetry)?,
  });
}
