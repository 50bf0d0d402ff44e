//! This module implements the processing of several reports at once, like the
//! outputs of a parametric study (one report per ply angle, temperature...).
//!
//! Reports are independent, so they're parsed in parallel. Results keep the
//! order of the input files.

use std::fmt::Display;
use std::path::Path;

use log::debug;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::document::Document;
use crate::error::ParseError;
use crate::flutter::join_continuations;
use crate::parser::read_report;
use crate::roots::{critical_roots, CriticalRoot, RootSearch};
use crate::table::{to_table, NormalizedTable};

/// What was found in a report. Tells "no flutter" apart from "nothing read".
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileReport {
  /// The file name, if known.
  pub filename: Option<String>,
  /// The number of pages.
  pub pages: usize,
  /// The number of flutter summary pages.
  pub flutter_pages: usize,
  /// The number of sweeps after joining continuation pages.
  pub joined_sweeps: usize,
  /// The number of rows in the normalized table.
  pub rows: usize,
  /// The number of critical roots.
  pub critical_roots: usize
}

impl Display for FileReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(
      f,
      "{}: {} pages, {} flutter pages, {} joined sweeps, {} rows, {} critical \
      roots",
      self.filename.as_deref().unwrap_or("<unnamed>"),
      self.pages,
      self.flutter_pages,
      self.joined_sweeps,
      self.rows,
      self.critical_roots
    );
  }
}

/// Everything extracted from one report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileAnalysis {
  /// The counts.
  pub report: FileReport,
  /// The normalized table.
  pub table: NormalizedTable,
  /// The critical roots.
  pub roots: Vec<CriticalRoot>
}

impl FileAnalysis {
  /// Joins and tabulates the flutter summaries of a parsed document, without
  /// looking for roots yet.
  pub fn tabulate(doc: &Document) -> Self {
    let records = doc.flutter_pages();
    let flutter_pages = records.len();
    let joined = join_continuations(records);
    let table = to_table(&joined);
    let report = FileReport {
      filename: doc.filename.clone(),
      pages: doc.page_count(),
      flutter_pages,
      joined_sweeps: joined.len(),
      rows: table.len(),
      critical_roots: 0
    };
    return Self { report, table, roots: Vec::new() };
  }

  /// Searches the table for critical roots, replacing any found before.
  pub fn search_roots(mut self, search: &RootSearch) -> Self {
    self.roots = critical_roots(&self.table, search);
    self.report.critical_roots = self.roots.len();
    debug!("{}", self.report);
    return self;
  }

  /// Runs the whole pipeline on a parsed document.
  pub fn of_document(doc: &Document, search: &RootSearch) -> Self {
    return Self::tabulate(doc).search_roots(search);
  }
}

/// Reads a report and runs the whole pipeline on it.
pub fn analyze_file<P: AsRef<Path>>(
  path: P,
  search: &RootSearch
) -> Result<FileAnalysis, ParseError> {
  let doc = read_report(path)?;
  return Ok(FileAnalysis::of_document(&doc, search));
}

/// Reads several reports in parallel and runs the whole pipeline on each. A
/// failure in one file doesn't affect the others.
pub fn analyze_files<P: AsRef<Path> + Sync>(
  paths: &[P],
  search: &RootSearch
) -> Vec<Result<FileAnalysis, ParseError>> {
  return paths.par_iter()
    .map(|p| analyze_file(p, search))
    .collect();
}

/// Reads and tabulates several reports in parallel, without looking for
/// roots. Used when the tables are to be labelled and searched together.
pub fn tabulate_files<P: AsRef<Path> + Sync>(
  paths: &[P]
) -> Vec<Result<FileAnalysis, ParseError>> {
  return paths.par_iter()
    .map(|p| read_report(p).map(|doc| FileAnalysis::tabulate(&doc)))
    .collect();
}

/// Reads the normalized table of a report.
pub fn read_table<P: AsRef<Path>>(
  path: P
) -> Result<NormalizedTable, ParseError> {
  let doc = read_report(path)?;
  return Ok(to_table(&join_continuations(doc.flutter_pages())));
}

/// Reads several reports in parallel, labels each one's table with its own
/// value, and concatenates them in input order.
pub fn read_labelled<P: AsRef<Path> + Sync>(
  paths: &[P],
  label_name: &str,
  labels: &[f64]
) -> Result<NormalizedTable, ParseError> {
  if paths.len() != labels.len() {
    return Err(ParseError::LabelCount {
      files: paths.len(),
      labels: labels.len()
    });
  }
  let tables = paths.par_iter()
    .zip(labels.par_iter())
    .map(|(p, label)| {
      return read_table(p).map(|t| t.labelled(label_name, *label));
    })
    .collect::<Result<Vec<_>, ParseError>>()?;
  return NormalizedTable::concat(tables);
}
