//! This module implements the report parser: it takes lines, splits them in
//! pages, classifies the pages and decodes the ones we know.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use serde::{Serialize, Deserialize};

use crate::document::*;
use crate::error::ParseError;
use crate::flutter::parse_flutter_page;
use crate::modal::{parse_mass_fraction_page, parse_real_eigenvalue_page};
use crate::pages::*;

/// The parser might respond this when consuming a line.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParserResponse {
  /// The line was stored in the current page.
  Buffered,
  /// The line started a new page, so the previous one was decoded.
  PageDone(PageKind)
}

/// This is the report parser -- it doesn't care how lines are fed into it.
/// It's one-pass and single-thread: the only state carried between pages is
/// the classifier's memory of the previous page's kind.
pub struct ReportParser {
  /// The document being built.
  doc: Document,
  /// Splits lines into pages.
  segmenter: PageSegmenter,
  /// Classifies the pages.
  classifier: PageClassifier,
  /// The total number of consumed lines.
  total_lines: usize
}

impl Default for ReportParser {
  fn default() -> Self {
    return Self::new();
  }
}

impl ReportParser {
  /// Instantiates a new parser.
  pub fn new() -> Self {
    return Self {
      doc: Document::new(),
      segmenter: PageSegmenter::new(),
      classifier: PageClassifier::new(),
      total_lines: 0
    };
  }

  /// Classifies a page's lines, decodes it and stores it.
  fn flush_page(&mut self, lines: Vec<String>) -> Result<PageKind, ParseError> {
    let page = self.classifier.make_page(lines);
    let content = match page.kind {
      PageKind::FlutterSummary => {
        PageContent::Flutter(parse_flutter_page(&page)?)
      },
      PageKind::RealEigenvalues => {
        PageContent::RealEigenvalues(parse_real_eigenvalue_page(&page))
      },
      PageKind::ModalMassFraction => {
        PageContent::ModalMassFraction(parse_mass_fraction_page(&page))
      },
      PageKind::Text => PageContent::Text
    };
    let kind = page.kind;
    debug!(
      "Page {} ({} lines, ending on line {}) is a {} page.",
      page.ordinal,
      page.lines.len(),
      self.total_lines,
      kind
    );
    self.doc.pages.push(ReportPage { page, content });
    return Ok(kind);
  }

  /// Consumes a line into the parser. Fails if the line completes a
  /// malformed flutter summary page.
  pub fn consume<S: Into<String>>(
    &mut self,
    line: S
  ) -> Result<ParserResponse, ParseError> {
    self.total_lines += 1;
    if let Some(done) = self.segmenter.consume(line.into()) {
      return Ok(ParserResponse::PageDone(self.flush_page(done)?));
    }
    return Ok(ParserResponse::Buffered);
  }

  /// Finishes up (decoding the trailing page) and returns the document.
  pub fn finish(mut self) -> Result<Document, ParseError> {
    let segmenter = std::mem::take(&mut self.segmenter);
    if let Some(last) = segmenter.finish() {
      self.flush_page(last)?;
    }
    return Ok(self.doc);
  }

  /// Parses lines already in memory.
  pub fn parse_lines<I>(lines: I) -> Result<Document, ParseError>
    where I: IntoIterator, I::Item: Into<String> {
    let mut parser = Self::new();
    for line in lines {
      parser.consume(line)?;
    }
    return parser.finish();
  }

  /// Parses from a BufRead instance. Bytes that aren't valid UTF-8 are
  /// replaced, since reports are plain ASCII anyway.
  pub fn parse_bufread<R: BufRead>(
    mut reader: R
  ) -> Result<Document, ParseError> {
    let mut parser = Self::new();
    let mut buf: Vec<u8> = Vec::new();
    while reader.read_until(b'\n', &mut buf)? > 0 {
      let line = String::from_utf8_lossy(&buf);
      parser.consume(line.trim_end_matches(['\n', '\r']))?;
      buf.clear();
    }
    return parser.finish();
  }

  /// Utility method -- reads and parses a file.
  pub fn parse_file<S: AsRef<Path>>(p: S) -> Result<Document, ParseError> {
    let file = File::open(p.as_ref())?;
    let mut doc = Self::parse_bufread(BufReader::new(file))?;
    doc.filename = p.as_ref().file_name()
      .and_then(|s| s.to_str())
      .map(String::from);
    return Ok(doc);
  }
}

/// Reads and parses a report file.
pub fn read_report<S: AsRef<Path>>(path: S) -> Result<Document, ParseError> {
  return ReportParser::parse_file(path);
}
