//! This module implements the splitting of a report into pages and the
//! classification of those pages by the banners found at fixed offsets.

use std::fmt::Display;

use chrono::{Month, NaiveDate};
use convert_case::{Case, Casing};
use serde::{Serialize, Deserialize};

use crate::flavour::Solver;
use crate::util::is_page_break;

/// Line where the flutter summary banner is printed.
pub const FLUTTER_CHECK_LINE: usize = 3;
/// The flutter summary banner.
pub const FLUTTER_BANNER: &str = "FLUTTER  SUMMARY";
/// Lines where the real eigenvalue banner can be printed.
pub const EIGENVALUE_CHECK_LINES: [usize; 2] = [3, 4];
/// The real eigenvalue banner.
pub const EIGENVALUE_BANNER: &str = "R E A L   E I G E N V A L U E S";
/// Line where the modal effective mass fraction banner is printed.
pub const MASS_FRACTION_CHECK_LINE: usize = 4;
/// The modal effective mass fraction banner.
pub const MASS_FRACTION_BANNER: &str = "MODAL EFFECTIVE MASS FRACTION";
/// Line where the short banner of a mass fraction continuation page is.
pub const MASS_FRACTION_CONTINUATION_LINE: usize = 5;
/// The short banner of a mass fraction continuation page.
pub const MASS_FRACTION_CONTINUATION_BANNER: &str = "FRACTION";

/// The kinds of page we know of.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
  Hash
)]
pub enum PageKind {
  /// A flutter summary for one subcase, Mach number and mode.
  FlutterSummary,
  /// A real eigenvalue table.
  RealEigenvalues,
  /// A modal effective mass fraction table.
  ModalMassFraction,
  /// Anything else. Kept verbatim.
  Text
}

impl PageKind {
  /// Returns all the page kinds.
  pub const fn all() -> &'static [Self] {
    return &[
      Self::FlutterSummary,
      Self::RealEigenvalues,
      Self::ModalMassFraction,
      Self::Text
    ];
  }

  /// Returns the small name of the variant, CamelCase.
  pub const fn short_name(&self) -> &'static str {
    return match self {
      Self::FlutterSummary => "FlutterSummary",
      Self::RealEigenvalues => "RealEigenvalues",
      Self::ModalMassFraction => "ModalMassFraction",
      Self::Text => "Text",
    };
  }

  /// Returns the small, snake case name of the variant.
  pub fn snake_case_name(&self) -> String {
    return self.short_name().to_case(Case::Snake);
  }
}

impl Display for PageKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.short_name().to_case(Case::Lower));
  }
}

/// What gets printed on the first line of every page.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PageHeader {
  /// The page number, as printed.
  pub number: Option<usize>,
  /// The date of the run.
  pub run_date: Option<NaiveDate>,
  /// The version name of the solver (e.g. "MSC.NASTRAN").
  pub version_name: Option<String>,
  /// The release date of the solver version.
  pub version_date: Option<NaiveDate>,
  /// The solver, if the version name is known.
  pub solver: Option<Solver>
}

impl PageHeader {
  /// Decodes a page header line. Every field is optional since solvers and
  /// versions differ in what they print. Returns None if the line doesn't
  /// start a page at all.
  pub fn parse(line: &str) -> Option<Self> {
    if !is_page_break(line) {
      return None;
    }
    let tokens = line[1..].split_whitespace().collect::<Vec<_>>();
    let mut header = Self::default();
    // page number: last "PAGE" followed by an integer
    header.number = tokens.iter()
      .rposition(|t| *t == "PAGE")
      .and_then(|i| tokens.get(i+1))
      .and_then(|t| t.parse::<usize>().ok());
    // run date: "MONTH DD, YYYY"
    let date_pos = tokens.windows(3).position(|w| {
      return decode_run_date(w[0], w[1], w[2]).is_some();
    });
    if let Some(i) = date_pos {
      header.run_date = decode_run_date(tokens[i], tokens[i+1], tokens[i+2]);
      // version: name tokens right after the date, then the version date
      let rest = &tokens[i+3..];
      if let Some(j) = rest.iter().position(|t| decode_short_date(t).is_some()) {
        if j > 0 {
          let name = rest[..j].join(" ");
          header.solver = Solver::detect(&name);
          header.version_name = Some(name);
        }
        header.version_date = decode_short_date(rest[j]);
      }
    }
    return Some(header);
  }
}

/// Decodes a run date printed as three tokens, like `MARCH  10, 2020`.
fn decode_run_date(month: &str, day: &str, year: &str) -> Option<NaiveDate> {
  let month = month.parse::<Month>().ok()?.number_from_month();
  let day = day.strip_suffix(',')?.parse::<u32>().ok()?;
  if year.len() != 4 {
    return None;
  }
  let year = year.parse::<i32>().ok()?;
  return NaiveDate::from_ymd_opt(year, month, day);
}

/// Decodes a short `M/D/YY` date. Two-digit years below 69 are in the 2000s.
fn decode_short_date(s: &str) -> Option<NaiveDate> {
  let parts = s.split('/')
    .map(|p| p.parse::<u32>().ok())
    .collect::<Option<Vec<_>>>()?;
  if let [m, d, y] = parts[..] {
    if y > 99 {
      return None;
    }
    let year = if y < 69 { 2000 + y } else { 1900 + y };
    return NaiveDate::from_ymd_opt(year as i32, m, d);
  }
  return None;
}

/// One page of a report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page {
  /// The ordinal of the page within the report (zero-based).
  pub ordinal: usize,
  /// The kind of page.
  pub kind: PageKind,
  /// Whether this page continues a table from the previous page.
  pub continuation: bool,
  /// The decoded header, if the page starts with one.
  pub header: Option<PageHeader>,
  /// The raw lines, without line terminators.
  pub lines: Vec<String>
}

impl Page {
  /// Returns a line of the page, or an empty string past its end.
  pub fn line(&self, i: usize) -> &str {
    return self.lines.get(i).map_or("", |s| s.as_str());
  }
}

/// Splits lines into pages. Consumes one line at a time; a page is emitted
/// once the next page starts, or once `finish` is called.
#[derive(Debug, Default)]
pub struct PageSegmenter {
  /// The lines of the page being built.
  current: Vec<String>
}

impl PageSegmenter {
  /// Instantiates a new segmenter.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Consumes a line. Returns the previous page's lines if this line starts a
  /// new page.
  pub fn consume(&mut self, line: String) -> Option<Vec<String>> {
    let done = if is_page_break(&line) && !self.current.is_empty() {
      Some(std::mem::take(&mut self.current))
    } else {
      None
    };
    self.current.push(line);
    return done;
  }

  /// Finishes up and returns the trailing page, if any.
  pub fn finish(self) -> Option<Vec<String>> {
    if self.current.is_empty() {
      return None;
    }
    return Some(self.current);
  }
}

/// Splits a whole line sequence into page line groups. Every line lands in
/// exactly one group, and order is kept.
pub fn segment_lines<I>(lines: I) -> Vec<Vec<String>>
  where I: IntoIterator, I::Item: Into<String> {
  let mut segmenter = PageSegmenter::new();
  let mut groups = lines.into_iter()
    .filter_map(|l| segmenter.consume(l.into()))
    .collect::<Vec<_>>();
  groups.extend(segmenter.finish());
  return groups;
}

/// The result of classifying a page.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Classification {
  /// The kind of page.
  pub kind: PageKind,
  /// Whether it continues the previous page's table.
  pub continuation: bool
}

/// Classifies pages. Only remembers the kind of the previous page, which is
/// what tells a mass fraction continuation page apart.
#[derive(Copy, Clone, Debug, Default)]
pub struct PageClassifier {
  /// The kind of the previously classified page.
  previous: Option<PageKind>,
  /// The number of classified pages.
  count: usize
}

impl PageClassifier {
  /// Instantiates a new classifier.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Classifies a page by its lines, and remembers its kind.
  pub fn classify(&mut self, lines: &[String]) -> Classification {
    let has = |i: usize, s: &str| lines.get(i).is_some_and(|l| l.contains(s));
    let mut continuation = false;
    let kind = if has(FLUTTER_CHECK_LINE, FLUTTER_BANNER) {
      PageKind::FlutterSummary
    } else if EIGENVALUE_CHECK_LINES.iter().any(|i| has(*i, EIGENVALUE_BANNER)) {
      PageKind::RealEigenvalues
    } else if has(MASS_FRACTION_CHECK_LINE, MASS_FRACTION_BANNER) {
      PageKind::ModalMassFraction
    } else if self.previous == Some(PageKind::ModalMassFraction)
      && has(
        MASS_FRACTION_CONTINUATION_LINE,
        MASS_FRACTION_CONTINUATION_BANNER
      ) {
      continuation = true;
      PageKind::ModalMassFraction
    } else {
      PageKind::Text
    };
    self.previous = Some(kind);
    self.count += 1;
    return Classification { kind, continuation };
  }

  /// Classifies a page and builds it.
  pub fn make_page(&mut self, lines: Vec<String>) -> Page {
    let Classification { kind, continuation } = self.classify(&lines);
    let header = lines.first().and_then(|l| PageHeader::parse(l));
    return Page {
      ordinal: self.count - 1,
      kind,
      continuation,
      header,
      lines
    };
  }
}

/// Segments and classifies a whole line sequence, in one fold.
pub fn paginate<I>(lines: I) -> Vec<Page>
  where I: IntoIterator, I::Item: Into<String> {
  let mut classifier = PageClassifier::new();
  return segment_lines(lines)
    .into_iter()
    .map(|group| classifier.make_page(group))
    .collect();
}
