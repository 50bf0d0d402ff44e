//! Reads one or more F06 files from flutter analyses and reports, per file,
//! how many flutter summaries were found and joined, and where the modes
//! start to flutter.

#![allow(clippy::needless_return)]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Parser};
use f06flutter::prelude::*;
use log::{LevelFilter, error, info, warn};

/// Reference values for panel flutter. If all are given, the non-dimensional
/// dynamic pressure is reported for every critical root.
#[derive(Copy, Clone, Debug, Args)]
struct PanelArgs {
  /// Reference velocity.
  #[arg(long = "vref")]
  vref: Option<f64>,
  /// Reference chord (panel length in the flow direction).
  #[arg(long = "chord")]
  chord: Option<f64>,
  /// Reference density.
  #[arg(long = "rho")]
  rho: Option<f64>,
  /// Panel bending stiffness (D11).
  #[arg(long = "stiffness")]
  stiffness: Option<f64>
}

impl PanelArgs {
  /// Returns the panel reference if all values were given.
  fn reference(&self) -> Option<PanelReference> {
    return Some(PanelReference {
      vref: self.vref?,
      chord: self.chord?,
      rho: self.rho?,
      stiffness: self.stiffness?
    });
  }
}

/// The arguments passed to the tool.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about)]
struct Cli {
  /// The critical root search settings.
  #[command(flatten)]
  search: RootSearch,
  /// Panel flutter reference values.
  #[command(flatten)]
  panel: PanelArgs,
  /// Name of the label distinguishing the files (like "THETA").
  #[arg(short = 'L', long = "label-name", default_value = "LABEL")]
  label_name: String,
  /// One label value per file, comma-separated. If present, files are
  /// labelled and their tables concatenated before the root search.
  #[arg(short = 'l', long = "labels", value_delimiter = ',')]
  labels: Vec<f64>,
  /// Only report the lowest-velocity root of every subcase and Mach number.
  #[arg(short = 'g', long = "governing")]
  governing: bool,
  /// Path to dump the critical roots to, as JSON (set to "-" for standard
  /// output).
  #[arg(short = 'j', long = "json")]
  json: Option<PathBuf>,
  /// Output extra/debug info while parsing.
  #[arg(short, long)]
  verbose: bool,
  /// The F06 files.
  #[arg(required = true)]
  files: Vec<PathBuf>
}

const INDENT: &str = "  ";

/// Formats an optional value for display.
fn fmt_opt(x: Option<f64>) -> String {
  return x.map_or("?".to_string(), |v| format!("{:.6e}", v));
}

fn main() -> io::Result<()> {
  // init cli stuff
  let args = Cli::parse();
  let log_level = if args.verbose {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };
  env_logger::builder().filter_level(log_level).init();
  if !args.labels.is_empty() && args.labels.len() != args.files.len() {
    error!(
      "Got {} files but {} labels!",
      args.files.len(),
      args.labels.len()
    );
    std::process::exit(1);
  }
  // parse the files; labelled ones are only searched once concatenated
  info!("Parsing {} file(s)...", args.files.len());
  let labelled = !args.labels.is_empty();
  let analyses = if labelled {
    tabulate_files(&args.files)
  } else {
    analyze_files(&args.files, &args.search)
  };
  let mut failures = 0;
  let mut reports: Vec<(FileReport, Option<f64>)> = Vec::new();
  let mut tables: Vec<NormalizedTable> = Vec::new();
  let mut roots: Vec<CriticalRoot> = Vec::new();
  for (i, (path, res)) in args.files.iter().zip(analyses).enumerate() {
    match res {
      Ok(analysis) => {
        if analysis.report.flutter_pages == 0 {
          warn!("No flutter summaries in {}.", path.display());
        }
        let label = args.labels.get(i).copied();
        if let Some(value) = label {
          tables.push(analysis.table.labelled(&args.label_name, value));
        } else {
          roots.extend(analysis.roots);
        }
        reports.push((analysis.report, label));
      },
      Err(e) => {
        error!("Could not read {}: {}", path.display(), e);
        failures += 1;
      }
    }
  }
  // labelled tables are searched together
  if !tables.is_empty() {
    match NormalizedTable::concat(tables) {
      Ok(table) => roots = critical_roots(&table, &args.search),
      Err(e) => {
        error!("{}", e);
        std::process::exit(1);
      }
    }
  }
  for (mut report, label) in reports {
    if label.is_some() {
      report.critical_roots = roots.iter()
        .filter(|r| r.key.label == label)
        .count();
    }
    info!("{}", report);
  }
  if args.governing {
    roots = governing_roots(&roots);
  }
  // print the roots
  let panel = args.panel.reference();
  if roots.is_empty() {
    info!("No critical roots found.");
  } else {
    info!("Critical roots:");
    for root in roots.iter() {
      let lambda = panel
        .and_then(|p| p.critical_dynamic_pressure(root))
        .map(|l| format!(", lambda = {}", fmt_opt(Some(l))))
        .unwrap_or_default();
      let tag = match root.onset {
        Onset::Interpolated => "",
        Onset::FirstSample => " (unstable from the first sample)",
      };
      info!(
        "{}- {}: velocity = {}, frequency = {}{}{}",
        INDENT,
        root.key,
        fmt_opt(root.velocity()),
        fmt_opt(root.frequency()),
        lambda,
        tag
      );
    }
  }
  // dump them
  if let Some(ref jp) = args.json {
    let output: BufWriter<Box<dyn Write>> = BufWriter::new(
      if jp.as_os_str().eq_ignore_ascii_case("-") {
        Box::new(io::stdout())
      } else {
        Box::new(File::create(jp)?)
      }
    );
    serde_json::to_writer_pretty(output, &roots)?;
  }
  if failures > 0 {
    error!("{} file(s) could not be read.", failures);
    std::process::exit(1);
  }
  info!("All done.");
  return Ok(());
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cli_labels() {
    let before = Cli::try_parse_from(
      ["flutinfo", "-l", "0,45", "a.f06", "b.f06"]
    ).unwrap();
    assert_eq!(before.labels, vec![0.0, 45.0]);
    assert_eq!(
      before.files,
      vec![PathBuf::from("a.f06"), PathBuf::from("b.f06")]
    );
    let after = Cli::try_parse_from(
      ["flutinfo", "a.f06", "b.f06", "--labels", "0,45", "-L", "THETA"]
    ).unwrap();
    assert_eq!(after.labels, before.labels);
    assert_eq!(after.files, before.files);
    assert_eq!(after.label_name, "THETA");
    let plain = Cli::try_parse_from(["flutinfo", "a.f06"]).unwrap();
    assert!(plain.labels.is_empty());
    assert_eq!(plain.search, RootSearch::default());
    assert!(plain.panel.reference().is_none());
    assert!(Cli::try_parse_from(["flutinfo", "-l", "0,45"]).is_err());
  }

  #[test]
  fn test_cli_panel() {
    let cli = Cli::try_parse_from([
      "flutinfo", "--vref", "1000", "--chord", "0.5", "--rho", "1.2",
      "--stiffness", "50", "-e", "0", "-g", "a.f06"
    ]).unwrap();
    let panel = cli.panel.reference().unwrap();
    assert_eq!(panel.vref, 1000.0);
    assert_eq!(panel.stiffness, 50.0);
    assert_eq!(cli.search.epsilon, 0.0);
    assert!(cli.governing);
  }
}
