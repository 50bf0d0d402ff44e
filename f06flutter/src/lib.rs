//! This library implements types and functions to extract flutter results from
//! the formatted text output (F06) of Nastran-like aeroelastic solvers.
//!
//! The pipeline is simple and one-pass: a report is split into pages, pages
//! are classified, flutter summary pages are decoded into records, records
//! that continue the same sweep across page breaks are joined, and the joined
//! records are flattened into a normalized table. From that table one can
//! locate the critical roots, i.e. the points where a mode's damping crosses
//! zero and it starts to flutter.
//!
//! Real eigenvalue and modal effective mass fraction pages are decoded too,
//! since they usually come in the same report.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::needless_return)]

pub mod batch;
pub mod document;
pub mod error;
pub mod flavour;
pub mod flutter;
pub mod metadata;
pub mod modal;
pub mod pages;
pub mod panel;
pub mod parser;
pub mod roots;
pub mod table;
pub mod util;

#[cfg(test)]
mod tests;

/// Imports the most relevant exports from the library.
pub mod prelude {
  pub use super::batch::*;
  pub use super::document::*;
  pub use super::error::*;
  pub use super::flavour::*;
  pub use super::flutter::*;
  pub use super::metadata::*;
  pub use super::modal::*;
  pub use super::pages::*;
  pub use super::panel::*;
  pub use super::parser::*;
  pub use super::roots::*;
  pub use super::table::*;
}
