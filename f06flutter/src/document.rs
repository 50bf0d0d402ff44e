//! This module implements the general structure of a report as we interpret
//! it: a sequence of classified pages, some of them decoded.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::flavour::Solver;
use crate::flutter::FlutterPageRecord;
use crate::modal::*;
use crate::pages::{Page, PageKind};

/// What was decoded out of a page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PageContent {
  /// A flutter summary.
  Flutter(FlutterPageRecord),
  /// A real eigenvalue table.
  RealEigenvalues(RealEigenvalueTable),
  /// A modal effective mass fraction table.
  ModalMassFraction(MassFractionTable),
  /// Nothing; the page is kept verbatim.
  Text
}

/// A page and what was decoded out of it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportPage {
  /// The page itself.
  pub page: Page,
  /// The decoded content.
  pub content: PageContent
}

/// This is the output of the report parser.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Document {
  /// The name of the file this was parsed from, if any.
  pub filename: Option<String>,
  /// All pages, in report order.
  pub pages: Vec<ReportPage>
}

impl Document {
  /// Instantiates a new document with nothing inside.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Returns the number of pages.
  pub fn page_count(&self) -> usize {
    return self.pages.len();
  }

  /// Counts the pages of each kind.
  pub fn kind_counts(&self) -> BTreeMap<PageKind, usize> {
    let mut counts: BTreeMap<PageKind, usize> = BTreeMap::new();
    for rp in self.pages.iter() {
      *counts.entry(rp.page.kind).or_default() += 1;
    }
    return counts;
  }

  /// Returns the solver, as told by the first page header naming a known one.
  pub fn solver(&self) -> Option<Solver> {
    return self.pages.iter()
      .filter_map(|rp| rp.page.header.as_ref())
      .find_map(|h| h.solver);
  }

  /// Returns the decoded flutter summaries, in page order.
  pub fn flutter_pages(&self) -> Vec<FlutterPageRecord> {
    return self.pages.iter()
      .filter_map(|rp| match &rp.content {
        PageContent::Flutter(rec) => Some(rec.clone()),
        _ => None
      })
      .collect();
  }

  /// Returns the decoded real eigenvalue tables, in page order.
  pub fn real_eigenvalues(&self) -> Vec<RealEigenvalueTable> {
    return self.pages.iter()
      .filter_map(|rp| match &rp.content {
        PageContent::RealEigenvalues(t) => Some(t.clone()),
        _ => None
      })
      .collect();
  }

  /// Returns the decoded mass fraction tables, in page order, with
  /// continuation pages joined into the tables they continue.
  pub fn mass_fractions(&self) -> Vec<MassFractionTable> {
    let tables = self.pages.iter()
      .filter_map(|rp| match &rp.content {
        PageContent::ModalMassFraction(t) => Some(t.clone()),
        _ => None
      })
      .collect();
    return join_mass_fractions(tables);
  }
}

/// Returns the decoded flutter summaries of a document, in page order.
pub fn flutter_pages(doc: &Document) -> Vec<FlutterPageRecord> {
  return doc.flutter_pages();
}
