use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;

use crate::prelude::*;
use crate::util::*;

/// The settings of a synthetic flutter sweep.
struct Sweep {
  label: &'static str,
  subcase: usize,
  mach: f64,
  point: usize,
  method: &'static str
}

impl Sweep {
  fn new(subcase: usize, mach: f64, point: usize) -> Self {
    return Self { label: "PANEL FLUTTER", subcase, mach, point, method: "PK" };
  }
}

fn page_header(page: usize) -> String {
  return format!(
    "1    AEROELASTIC TEST          MARCH  10, 2020  MSC.NASTRAN  7/13/17   \
    PAGE {:>6}",
    page
  );
}

fn label_line(label: &str, subcase: usize) -> String {
  return format!("0     {:<60}SUBCASE {}", label, subcase);
}

fn row_line(values: &[f64]) -> String {
  return values.iter().map(|x| format!("{:>14.6}", x)).collect();
}

/// A full flutter row out of a velocity and a damping. Frequency is linear in
/// velocity so interpolated values are easy to check.
fn sample(velocity: f64, damping: f64) -> [f64; FLUTTER_WIDTH] {
  return [
    0.1, 10.0, velocity, damping, 5.0 + velocity / 10.0, damping * 3.0, 30.0
  ];
}

fn flutter_page(
  page: usize,
  sweep: &Sweep,
  samples: &[(f64, f64)]
) -> Vec<String> {
  let mut lines = vec![
    page_header(page),
    String::new(),
    label_line(sweep.label, sweep.subcase),
    format!("{:>50}", FLUTTER_BANNER),
    "     CONFIGURATION = AEROSG2D     XY-SYMMETRY = ASYMMETRIC     \
    XZ-SYMMETRY = ASYMMETRIC".to_string(),
    format!(
      "     POINT = {:>3}     MACH NUMBER = {:.4}     DENSITY RATIO = \
      1.0000E+00     METHOD = {}",
      sweep.point,
      sweep.mach,
      sweep.method
    ),
    String::new(),
    String::new(),
    "        KFREQ       1./KFREQ      VELOCITY       DAMPING     FREQUENCY   \
    COMPLEX   EIGENVALUE".to_string()
  ];
  lines.extend(samples.iter().map(|(v, d)| row_line(&sample(*v, *d))));
  lines.push(String::new());
  return lines;
}

fn text_page(page: usize) -> Vec<String> {
  return vec![
    page_header(page),
    String::new(),
    "     S Y S T E M   D I A G N O S T I C   M E S S A G E S".to_string(),
    String::new(),
    "     NOTHING TO SEE HERE".to_string()
  ];
}

/// A real eigenvalue page, with one mode per (frequency in Hz, generalized
/// mass).
fn eigen_page(
  page: usize,
  subcase: usize,
  augmented: bool,
  modes: &[(f64, f64)]
) -> Vec<String> {
  let mut lines = vec![
    page_header(page),
    String::new(),
    label_line("MODES", subcase),
    format!("{:>60}", EIGENVALUE_BANNER),
    String::new()
  ];
  if augmented {
    lines.push("   (BEFORE AUGMENTATION OF RESIDUAL VECTORS)".to_string());
  }
  lines.push(
    "   MODE    EXTRACTION      EIGENVALUE            RADIANS             \
    CYCLES            GENERALIZED         GENERALIZED".to_string()
  );
  lines.push(
    "    NO.       ORDER                                                   \
    MASS              STIFFNESS".to_string()
  );
  for (i, (hz, mass)) in modes.iter().enumerate() {
    let omega = 2.0 * std::f64::consts::PI * hz;
    let n = (i + 1) as f64;
    lines.push(row_line(&[n, n, omega * omega, omega, *hz, *mass, 0.0]));
  }
  lines.push(String::new());
  return lines;
}

fn mass_fraction_page(
  page: usize,
  subcase: usize,
  translational: bool,
  continuation: bool,
  rows: &[[f64; MASS_FRACTION_WIDTH]]
) -> Vec<String> {
  let dofs = if translational { "T" } else { "R" };
  let columns = format!(
    "   MODE   FREQUENCY   {d}1   {d}1   {d}2   {d}2   {d}3   {d}3",
    d = dofs
  );
  let mut lines = vec![
    page_header(page),
    String::new(),
    label_line("MODES", subcase),
    String::new()
  ];
  if continuation {
    lines.push(columns);
    lines.push("    NO.            FRACTION   SUM   FRACTION   SUM".to_string());
    lines.push(String::new());
  } else {
    lines.push(format!("   {}", MASS_FRACTION_BANNER));
    lines.push(if translational {
      format!("   ({})", MASS_FRACTION_TRANSLATION_NOTICE)
    } else {
      "   (FOR ROTATIONAL DEGREES OF FREEDOM)".to_string()
    });
    lines.push(String::new());
    lines.push(columns);
    lines.push("    NO.            FRACTION   SUM   FRACTION   SUM".to_string());
    lines.push(String::new());
  }
  lines.extend(rows.iter().map(|r| row_line(r)));
  lines.push(String::new());
  return lines;
}

fn report(pages: Vec<Vec<String>>) -> Vec<String> {
  return pages.into_iter().flatten().collect();
}

fn write_report(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
  let path = dir.join(name);
  let mut file = File::create(&path).unwrap();
  for line in lines {
    write!(file, "{}\r\n", line).unwrap();
  }
  return path;
}

/// The normalized table of a single-sweep report.
fn sweep_table(samples: &[(f64, f64)]) -> NormalizedTable {
  let lines = flutter_page(1, &Sweep::new(1, 2.0, 1), samples);
  let doc = ReportParser::parse_lines(lines).unwrap();
  return to_table(&join_continuations(doc.flutter_pages()));
}

fn assert_near(a: Option<f64>, b: f64) {
  let a = a.unwrap();
  assert!(
    (a - b).abs() <= 1e-9 * b.abs().max(1.0),
    "{} is not close to {}",
    a,
    b
  );
}

/// The damping samples of the canonical two-page sweep.
const FIRST_PAGE: &[(f64, f64)] = &[
  (10.0, -0.5),
  (20.0, -0.1),
  (30.0, 0.2),
  (40.0, 0.8)
];

/// The continuation of the canonical sweep.
const SECOND_PAGE: &[(f64, f64)] = &[(50.0, 0.9), (60.0, 1.0)];

#[test]
fn test_decode_nasfloat() {
  let near = |s: &str, f: f64| assert_near(decode_nasfloat(s), f);
  near("7", 7.0);
  near("-7", -7.0);
  near(".5E1", 5.0);
  near("1.5-3", 1.5e-3);
  near("-2.25+2", -225.0);
  near("1.0D+03", 1000.0);
  near("3.1415e0", 3.1415);
  for bad in ["", "+", "-", "e", "E", ".", "..", "e.", ".e", "1e", "1.0-", "abc"] {
    assert_eq!(decode_nasfloat(bad), None, "decoded {:?}", bad);
  }
}

#[test]
fn test_fields() {
  assert_eq!(parse_field("1.5E-3"), Some(1.5e-3));
  assert_near(parse_field("1.5-3"), 1.5e-3);
  assert_eq!(parse_field("ASYMMETRIC"), None);
  let fields = split_fields::<4>("  1.0   abc   2  ");
  assert_eq!(fields, [Some(1.0), None, Some(2.0), None]);
  let row = FlutterRow::parse("  0.1  10.0  ");
  assert_eq!(row.get(FlutterColumn::Kfreq), Some(0.1));
  assert_eq!(row.get(FlutterColumn::InvKfreq), Some(10.0));
  assert_eq!(row.velocity(), None);
}

#[test]
fn test_tabular_range() {
  let lines = ["a", "b", "1.0 2.0", "3.0 4.0", "", "5.0"]
    .iter()
    .map(|s| s.to_string())
    .collect::<Vec<_>>();
  assert_eq!(tabular_range(&lines, 2), (2, 4));
  assert_eq!(tabular_range(&lines, 5), (5, 6));
  assert_eq!(tabular_range(&lines, 9), (6, 6));
  let banner = vec![
    "  1.0 2.0".to_string(),
    " *** USER INFORMATION MESSAGE 9999".to_string(),
    "  3.0 4.0".to_string()
  ];
  assert_eq!(tabular_range(&banner, 0), (0, 1));
  let broken = vec!["  1.0".to_string(), "1  NEXT PAGE".to_string()];
  assert_eq!(tabular_range(&broken, 0), (0, 1));
}

#[test]
fn test_metadata_parsing() {
  assert_eq!(
    parse_label_subcase("0     MY SUBCASE LABEL       SUBCASE 12"),
    Some(("MY SUBCASE LABEL".to_string(), 12))
  );
  assert_eq!(parse_label_subcase("0     NO IDENTIFIER HERE"), None);
  assert_eq!(parse_label_subcase("0     SUBCASE X"), None);
  let line = "XMACH NUMBER = 3.0   MACH NUMBER = 2.0   SETPOINT = 4  POINT = 2";
  assert_eq!(find_key_value(line, MetaKey::MachNumber), Some("2.0"));
  assert_eq!(find_key_value(line, MetaKey::Point), Some("2"));
  assert_eq!(find_key_value(line, MetaKey::Method), None);
  assert_eq!(MetaValue::parse("3"), MetaValue::Integer(3));
  assert_eq!(MetaValue::parse("2.0000"), MetaValue::Real(2.0));
  assert_eq!(MetaValue::parse("PK"), MetaValue::from("PK".to_string()));
  assert_eq!(MetaValue::Real(2.0).as_integer(), Some(2));
  assert_eq!(MetaValue::Real(2.5).as_integer(), None);
  assert_eq!(MetaValue::from(3_i64).as_real(), Some(3.0));
  let sweep = Sweep::new(7, 1.2, 3);
  let page = flutter_page(1, &sweep, &[]);
  let meta = parse_metadata(
    page[2].as_str(),
    (page[4].as_str(), page[5].as_str())
  ).unwrap();
  assert_eq!(meta.label, "PANEL FLUTTER");
  assert_eq!(meta.get(MetaKey::Subcase), MetaValue::Integer(7));
  assert_eq!(meta.method, MetaValue::Text("PK".to_string()));
  assert_eq!(meta.xz_symmetry, MetaValue::Text("ASYMMETRIC".to_string()));
  assert_eq!(meta.density_ratio, MetaValue::Real(1.0));
  let key = meta.sweep_key().unwrap();
  assert_eq!(key, SweepKey { subcase: 7, mach_number: 1.2, point: 3 });
  let mut bad = meta.clone();
  bad.point = MetaValue::Text("ONE".to_string());
  assert_eq!(bad.sweep_key(), Err(MissingItem::Key(MetaKey::Point)));
}

#[test]
fn test_page_header() {
  let header = PageHeader::parse(&page_header(12)).unwrap();
  assert_eq!(header.number, Some(12));
  assert_eq!(header.run_date, NaiveDate::from_ymd_opt(2020, 3, 10));
  assert_eq!(header.version_name.as_deref(), Some("MSC.NASTRAN"));
  assert_eq!(header.version_date, NaiveDate::from_ymd_opt(2017, 7, 13));
  assert_eq!(header.solver, Some(Solver::Msc));
  let simcenter = PageHeader::parse(
    "1    FLUTTER RUN    JANUARY   5, 2023  SIMCENTER NASTRAN 2212   3/31/22   \
    PAGE     1"
  ).unwrap();
  assert_eq!(simcenter.number, Some(1));
  assert_eq!(simcenter.run_date, NaiveDate::from_ymd_opt(2023, 1, 5));
  assert_eq!(simcenter.solver, Some(Solver::Simcenter));
  assert_eq!(simcenter.version_date, NaiveDate::from_ymd_opt(2022, 3, 31));
  assert_eq!(PageHeader::parse("1"), Some(PageHeader::default()));
  assert_eq!(PageHeader::parse("0    NOT A NEW PAGE"), None);
  assert_eq!(Solver::detect("MYSTRAN"), Some(Solver::Mystran));
  assert_eq!(Solver::detect("SOMETHING ELSE"), None);
}

#[test]
fn test_segmentation() {
  let lines = ["preamble", "1 first", "a", "b", "1 second", "1 third", "c"];
  let groups = segment_lines(lines);
  assert_eq!(groups.len(), 4);
  assert_eq!(groups[0], vec!["preamble"]);
  assert_eq!(groups[1], vec!["1 first", "a", "b"]);
  assert_eq!(groups[2], vec!["1 second"]);
  assert_eq!(groups[3], vec!["1 third", "c"]);
  // every line lands in exactly one page, in order
  let flat = groups.into_iter().flatten().collect::<Vec<_>>();
  assert_eq!(flat, lines.to_vec());
  assert!(segment_lines(Vec::<String>::new()).is_empty());
  // the trailing page is only emitted when finishing
  let mut segmenter = PageSegmenter::new();
  assert_eq!(segmenter.consume("1 only".to_string()), None);
  assert_eq!(segmenter.consume("x".to_string()), None);
  assert_eq!(segmenter.finish(), Some(vec!["1 only".into(), "x".into()]));
}

#[test]
fn test_classification() {
  let translational = [[1.0, 10.0, 0.5, 0.5, 0.1, 0.1, 0.0, 0.0]];
  let mut eigen_on_four = eigen_page(3, 1, false, &[(10.0, 1.0)]);
  eigen_on_four.insert(3, String::new());
  // "FRACTION" on line 5 only means something after a mass fraction page
  let mut fake_continuation = text_page(8);
  fake_continuation.push("   FRACTION".to_string());
  let lines = report(vec![
    text_page(1),
    flutter_page(2, &Sweep::new(1, 2.0, 1), FIRST_PAGE),
    eigen_on_four,
    eigen_page(4, 1, true, &[(10.0, 1.0)]),
    mass_fraction_page(5, 1, true, false, &translational),
    mass_fraction_page(6, 1, true, true, &translational),
    text_page(7),
    fake_continuation
  ]);
  let pages = paginate(lines);
  let kinds = pages.iter().map(|p| p.kind).collect::<Vec<_>>();
  assert_eq!(kinds, vec![
    PageKind::Text,
    PageKind::FlutterSummary,
    PageKind::RealEigenvalues,
    PageKind::RealEigenvalues,
    PageKind::ModalMassFraction,
    PageKind::ModalMassFraction,
    PageKind::Text,
    PageKind::Text
  ]);
  let continuations = pages.iter().map(|p| p.continuation).collect::<Vec<_>>();
  assert_eq!(
    continuations,
    vec![false, false, false, false, false, true, false, false]
  );
  let ordinals = pages.iter().map(|p| p.ordinal).collect::<Vec<_>>();
  assert_eq!(ordinals, (0..8).collect::<Vec<_>>());
  assert_eq!(pages[1].header.as_ref().and_then(|h| h.number), Some(2));
  assert_eq!(PageKind::FlutterSummary.to_string(), "flutter summary");
  assert_eq!(
    PageKind::ModalMassFraction.snake_case_name(),
    "modal_mass_fraction"
  );
}

#[test]
fn test_malformed_flutter_page() {
  let sweep = Sweep::new(1, 2.0, 1);
  // no Mach number
  let mut page = flutter_page(2, &sweep, FIRST_PAGE);
  page[5] = "     POINT =   1     DENSITY RATIO = 1.0000E+00     METHOD = PK"
    .to_string();
  match ReportParser::parse_lines(report(vec![text_page(1), page])) {
    Err(ParseError::MalformedPage { page, missing }) => {
      assert_eq!(page, 1);
      assert_eq!(missing, MissingItem::Key(MetaKey::MachNumber));
    },
    other => panic!("unexpected result: {:?}", other)
  }
  // truncated right after the banner
  let truncated = flutter_page(1, &sweep, FIRST_PAGE)[..4].to_vec();
  match ReportParser::parse_lines(truncated) {
    Err(ParseError::MalformedPage { page, missing }) => {
      assert_eq!(page, 0);
      assert_eq!(missing, MissingItem::Key(MetaKey::Point));
    },
    other => panic!("unexpected result: {:?}", other)
  }
  // no label line
  let mut unlabelled = flutter_page(1, &sweep, FIRST_PAGE);
  unlabelled[2] = "0".to_string();
  match ReportParser::parse_lines(unlabelled) {
    Err(ParseError::MalformedPage { missing, .. }) => {
      assert_eq!(missing, MissingItem::LabelLine);
    },
    other => panic!("unexpected result: {:?}", other)
  }
  // column headers missing where the rows are expected
  let mut headless = flutter_page(1, &sweep, FIRST_PAGE);
  headless.remove(7);
  match ReportParser::parse_lines(headless) {
    Err(ParseError::MalformedPage { missing, .. }) => {
      assert_eq!(missing, MissingItem::HeaderLine);
    },
    other => panic!("unexpected result: {:?}", other)
  }
  // and a well-formed one is fine
  let ok = ReportParser::parse_lines(flutter_page(1, &sweep, FIRST_PAGE));
  assert!(ok.is_ok());
}

#[test]
fn test_end_to_end() {
  let sweep = Sweep::new(1, 2.0, 1);
  let lines = report(vec![
    text_page(1),
    flutter_page(2, &sweep, FIRST_PAGE),
    flutter_page(3, &sweep, SECOND_PAGE)
  ]);
  let doc = ReportParser::parse_lines(lines).unwrap();
  assert_eq!(doc.page_count(), 3);
  assert_eq!(doc.solver(), Some(Solver::Msc));
  assert_eq!(doc.kind_counts().get(&PageKind::FlutterSummary), Some(&2));
  let records = flutter_pages(&doc);
  assert_eq!(records.len(), 2);
  assert_eq!(records[0].rows.len(), 4);
  assert_eq!(records[1].rows.len(), 2);
  let joined = join_continuations(records);
  assert_eq!(joined.len(), 1);
  assert_eq!(joined[0].pages, vec![1, 2]);
  assert_eq!(joined[0].key, SweepKey { subcase: 1, mach_number: 2.0, point: 1 });
  let table = to_table(&joined);
  assert_eq!(table.len(), 6);
  assert!(table.is_dense());
  let indices = table.rows.iter().map(|r| r.key.index).collect::<Vec<_>>();
  assert_eq!(indices, (0..6).collect::<Vec<_>>());
  let velocities = table.column(FlutterColumn::Velocity);
  assert_eq!(velocities[5], Some(60.0));
  let roots = critical_roots(&table, &RootSearch::default());
  assert_eq!(roots.len(), 1);
  let root = roots[0];
  assert_eq!(root.onset, Onset::Interpolated);
  assert_eq!(root.upper_index, 2);
  assert_eq!(root.key.label, None);
  assert_eq!(root.key.sweep, joined[0].key);
  assert_near(root.velocity(), 20.0 + 10.0 / 3.0);
  assert_near(root.frequency(), 5.0 + (20.0 + 10.0 / 3.0) / 10.0);
  assert_eq!(root.values.damping(), Some(0.0));
}

#[test]
fn test_join_continuations() {
  let a = Sweep::new(1, 2.0, 1);
  let b = Sweep::new(1, 2.0, 2);
  let lines = report(vec![
    flutter_page(1, &a, FIRST_PAGE),
    flutter_page(2, &a, SECOND_PAGE),
    flutter_page(3, &b, FIRST_PAGE),
    flutter_page(4, &a, SECOND_PAGE)
  ]);
  let records = ReportParser::parse_lines(lines).unwrap().flutter_pages();
  let joined = join_continuations(records.clone());
  // only adjacent pages are joined
  assert_eq!(joined.len(), 3);
  assert_eq!(joined[0].rows.len(), 6);
  assert_eq!(joined[2].pages, vec![3]);
  // joining is idempotent
  assert_eq!(join_continuations(joined.clone()), joined);
  // and keeps every row
  let before = records.iter().map(|r| r.rows.len()).sum::<usize>();
  let after = joined.iter().map(|r| r.rows.len()).sum::<usize>();
  assert_eq!(before, after);
  let table = to_table(&joined);
  assert!(table.is_dense());
  assert_eq!(table.groups().count(), 3);
}

#[test]
fn test_continuation_across_other_pages() {
  let sweep = Sweep::new(1, 2.0, 1);
  let lines = report(vec![
    flutter_page(1, &sweep, FIRST_PAGE),
    text_page(2),
    eigen_page(3, 1, false, &[(10.0, 1.0)]),
    flutter_page(4, &sweep, SECOND_PAGE)
  ]);
  let doc = ReportParser::parse_lines(lines).unwrap();
  assert_eq!(doc.page_count(), 4);
  let joined = join_continuations(doc.flutter_pages());
  assert_eq!(joined.len(), 1);
  assert_eq!(joined[0].pages, vec![0, 3]);
  let table = to_table(&joined);
  let indices = table.rows.iter().map(|r| r.key.index).collect::<Vec<_>>();
  assert_eq!(indices, (0..6).collect::<Vec<_>>());
  assert_eq!(critical_roots(&table, &RootSearch::default()).len(), 1);
}

#[test]
fn test_ambiguous_continuation() {
  let pk = Sweep::new(1, 2.0, 1);
  let pknl = Sweep { method: "PKNL", ..Sweep::new(1, 2.0, 1) };
  let lines = report(vec![
    flutter_page(1, &pk, FIRST_PAGE),
    flutter_page(2, &pknl, FIRST_PAGE)
  ]);
  let records = ReportParser::parse_lines(lines).unwrap().flutter_pages();
  assert!(!records[0].continued_by(&records[1]));
  let joined = join_continuations(records);
  assert_eq!(joined.len(), 2);
  let table = to_table(&joined);
  let indices = table.rows.iter().map(|r| r.key.index).collect::<Vec<_>>();
  assert_eq!(indices, vec![0, 1, 2, 3, 0, 1, 2, 3]);
  assert!(table.is_dense());
  assert_eq!(table.groups().count(), 2);
  assert_eq!(critical_roots(&table, &RootSearch::default()).len(), 2);
}

#[test]
fn test_interpolation() {
  let lower = FlutterRow::from(sample(100.0, -1.0));
  let upper = FlutterRow::from(sample(200.0, 1.0));
  let root = interpolate_to_zero_damping(&lower, &upper).unwrap();
  assert_eq!(root.velocity(), Some(150.0));
  assert_eq!(root.damping(), Some(0.0));
  assert_eq!(root.frequency(), Some(20.0));
  assert_eq!(interpolate_to_zero_damping(&lower, &lower), None);
  let mut gappy = upper;
  gappy.0[FlutterColumn::Frequency.position()] = None;
  let partial = interpolate_to_zero_damping(&lower, &gappy).unwrap();
  assert_eq!(partial.frequency(), None);
  assert_eq!(partial.velocity(), Some(150.0));
  gappy.0[FlutterColumn::Damping.position()] = None;
  assert_eq!(interpolate_to_zero_damping(&lower, &gappy), None);
  // and through the table, with a zero tolerance
  let table = sweep_table(&[(100.0, -1.0), (200.0, 1.0)]);
  let roots = critical_roots(&table, &RootSearch::with_epsilon(0.0));
  assert_eq!(roots.len(), 1);
  assert_eq!(roots[0].velocity(), Some(150.0));
}

#[test]
fn test_no_false_positives() {
  let table = sweep_table(&[(10.0, -0.5), (20.0, -0.3), (30.0, -0.01)]);
  assert!(critical_roots(&table, &RootSearch::default()).is_empty());
  assert!(critical_roots(&NormalizedTable::default(), &RootSearch::default())
    .is_empty());
  // a text-only report has no flutter, and that's not an error
  let doc = ReportParser::parse_lines(text_page(1)).unwrap();
  let analysis = FileAnalysis::of_document(&doc, &RootSearch::default());
  assert_eq!(analysis.report.pages, 1);
  assert_eq!(analysis.report.flutter_pages, 0);
  assert!(analysis.table.is_empty());
  assert!(analysis.roots.is_empty());
}

#[test]
fn test_comparison() {
  let table = sweep_table(&[(100.0, -1.0), (200.0, 0.0), (300.0, 1.0)]);
  let at_least = RootSearch::with_epsilon(0.0);
  let above = RootSearch { comparison: Comparison::Above, ..at_least };
  let a = critical_roots(&table, &at_least);
  let b = critical_roots(&table, &above);
  assert_eq!(a[0].upper_index, 1);
  assert_eq!(b[0].upper_index, 2);
  assert_eq!(a[0].velocity(), Some(200.0));
  assert_eq!(b[0].velocity(), Some(200.0));
  let search = RootSearch::default();
  assert!(search.unstable(-1e-10));
  assert!(!search.unstable(-1e-8));
  assert_eq!("AT-LEAST".parse::<Comparison>(), Ok(Comparison::AtLeast));
  assert_eq!("nope".parse::<Comparison>(), Err(()));
}

#[test]
fn test_first_sample_policy() {
  let table = sweep_table(&[(10.0, 0.1), (20.0, 0.2)]);
  let skip = RootSearch::default();
  assert!(critical_roots(&table, &skip).is_empty());
  let reporting = RootSearch {
    first_sample: FirstSamplePolicy::Report,
    ..RootSearch::default()
  };
  let roots = critical_roots(&table, &reporting);
  assert_eq!(roots.len(), 1);
  assert_eq!(roots[0].onset, Onset::FirstSample);
  assert_eq!(roots[0].upper_index, 0);
  assert_eq!(roots[0].velocity(), Some(10.0));
  assert_eq!(roots[0].values.damping(), Some(0.1));
  assert_eq!(
    "report".parse::<FirstSamplePolicy>(),
    Ok(FirstSamplePolicy::Report)
  );
}

#[test]
fn test_search_arguments() {
  #[derive(Parser)]
  struct Cli {
    #[command(flatten)]
    search: RootSearch
  }
  let defaults = Cli::try_parse_from(["flut"]).unwrap();
  assert_eq!(defaults.search, RootSearch::default());
  let custom = Cli::try_parse_from(
    ["flut", "-e", "0.001", "-c", "above", "--first-sample", "report"]
  ).unwrap();
  assert_eq!(custom.search, RootSearch {
    epsilon: 0.001,
    comparison: Comparison::Above,
    first_sample: FirstSamplePolicy::Report
  });
  assert!(Cli::try_parse_from(["flut", "-c", "below"]).is_err());
}

#[test]
fn test_governing_roots() {
  let lower_point = [(10.0, -0.3), (20.0, -0.2), (30.0, -0.1), (40.0, 0.1)];
  let lines = report(vec![
    flutter_page(1, &Sweep::new(1, 2.0, 1), FIRST_PAGE),
    flutter_page(2, &Sweep::new(1, 2.0, 2), &lower_point),
    flutter_page(3, &Sweep::new(1, 3.0, 2), &lower_point),
    flutter_page(4, &Sweep::new(1, 3.0, 1), FIRST_PAGE)
  ]);
  let doc = ReportParser::parse_lines(lines).unwrap();
  let table = to_table(&join_continuations(doc.flutter_pages()));
  let roots = critical_roots(&table, &RootSearch::default());
  assert_eq!(roots.len(), 4);
  let governing = governing_roots(&roots);
  assert_eq!(governing.len(), 2);
  assert_eq!(governing[0].key.sweep.mach_number, 2.0);
  assert_eq!(governing[0].key.sweep.point, 1);
  assert_eq!(governing[1].key.sweep.mach_number, 3.0);
  assert_eq!(governing[1].key.sweep.point, 1);
  assert_near(governing[1].velocity(), 20.0 + 10.0 / 3.0);
  assert_near(roots[1].velocity(), 35.0);
}

#[test]
fn test_real_eigenvalues() {
  let mut unlabelled = eigen_page(4, 9, false, &[(1.0, 1.0)]);
  unlabelled[2] = String::new();
  let lines = report(vec![
    eigen_page(1, 1, false, &[(10.0, 1.0), (20.0, 2.0)]),
    eigen_page(2, 1, false, &[(11.0, 1.0), (21.0, 1.0), (31.0, 1.0)]),
    eigen_page(3, 2, true, &[(5.0, 0.5)]),
    unlabelled
  ]);
  let doc = ReportParser::parse_lines(lines).unwrap();
  let tables = doc.real_eigenvalues();
  assert_eq!(tables.len(), 4);
  assert_eq!(tables[0].subcase, Some(1));
  assert_eq!(tables[0].label.as_deref(), Some("MODES"));
  assert_eq!(tables[0].rows.len(), 2);
  assert_eq!(tables[2].rows.len(), 1);
  assert_eq!(tables[2].column(EigenColumn::GeneralizedMass), vec![Some(0.5)]);
  assert_eq!(tables[3].subcase, None);
  let cycles = summarize_real_eigenvalues(&tables, EigenColumn::Cycles);
  assert_eq!(cycles.len(), 2);
  assert_eq!(cycles[&1], vec![Some(11.0), Some(21.0), Some(31.0)]);
  assert_eq!(cycles[&2], vec![Some(5.0)]);
  let modes = summarize_real_eigenvalues(&tables, EigenColumn::Mode);
  assert_eq!(modes[&1], vec![Some(1.0), Some(2.0), Some(3.0)]);
}

#[test]
fn test_mass_fractions() {
  let t = [
    [1.0, 10.0, 0.5, 0.5, 0.1, 0.1, 0.0, 0.0],
    [2.0, 20.0, 0.2, 0.7, 0.3, 0.4, 0.0, 0.0]
  ];
  let more = [[3.0, 30.0, 0.1, 0.8, 0.2, 0.6, 0.1, 0.1]];
  let r = [[1.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.9]];
  let lines = report(vec![
    mass_fraction_page(1, 1, true, false, &t),
    mass_fraction_page(2, 1, true, true, &more),
    mass_fraction_page(3, 1, false, false, &r)
  ]);
  let doc = ReportParser::parse_lines(lines).unwrap();
  let tables = doc.mass_fractions();
  assert_eq!(tables.len(), 2);
  assert_eq!(tables[0].dofs, MassFractionDofs::Translational);
  assert_eq!(tables[0].rows.len(), 3);
  assert_eq!(tables[0].pages, vec![0, 1]);
  assert_eq!(tables[0].rows[2][3], Some(0.8));
  assert_eq!(tables[1].dofs, MassFractionDofs::Rotational);
  assert_eq!(tables[1].subcase, Some(1));
  assert_eq!(tables[1].rows[0][6], Some(0.9));
  assert_eq!(MassFractionDofs::Rotational.columns()[2], "R1FRAC");
}

#[test]
fn test_dynamic_pressure() {
  let panel = PanelReference { vref: 2.0, chord: 0.5, rho: 1.2, stiffness: 10.0 };
  let expected = 1.2 * 6.0 * 6.0 * 0.125 / (3.0_f64.sqrt() * 10.0);
  assert_near(panel.dynamic_pressure(3.0, 2.0), expected);
  assert_eq!(panel.dynamic_pressure(3.0, 1.0), None);
  assert_eq!(panel.dynamic_pressure(3.0, 0.8), None);
  let rigid = PanelReference { stiffness: 0.0, ..panel };
  assert_eq!(rigid.dynamic_pressure(3.0, 2.0), None);
  let table = sweep_table(&[(100.0, -1.0), (200.0, 1.0)]);
  let roots = critical_roots(&table, &RootSearch::default());
  let at_root = panel.critical_dynamic_pressure(&roots[0]);
  assert_near(at_root, panel.dynamic_pressure(150.0, 2.0).unwrap());
}

#[test]
fn test_labelled_files() {
  let dir = tempfile::tempdir().unwrap();
  let sweep = Sweep::new(1, 2.0, 1);
  let shifted = [(10.0, -0.4), (20.0, 0.4), (30.0, 0.9)];
  let first = write_report(dir.path(), "theta0.f06", &report(vec![
    text_page(1),
    flutter_page(2, &sweep, FIRST_PAGE),
    flutter_page(3, &sweep, SECOND_PAGE)
  ]));
  let second = write_report(
    dir.path(),
    "theta45.f06",
    &flutter_page(1, &sweep, &shifted)
  );
  let paths = [first.clone(), second.clone()];
  let table = read_labelled(&paths, "THETA", &[0.0, 45.0]).unwrap();
  assert_eq!(table.label_name.as_deref(), Some("THETA"));
  assert_eq!(table.len(), 9);
  assert_eq!(table.rows[0].key.group.label, Some(0.0));
  assert_eq!(table.rows[6].key.group.label, Some(45.0));
  assert_eq!(table.rows[6].key.index, 0);
  assert!(table.is_dense());
  let roots = critical_roots(&table, &RootSearch::default());
  assert_eq!(roots.len(), 2);
  assert_near(roots[0].velocity(), 20.0 + 10.0 / 3.0);
  assert_near(roots[1].velocity(), 15.0);
  assert_eq!(governing_roots(&roots).len(), 2);
  // one label per file
  match read_labelled(&paths, "THETA", &[0.0]) {
    Err(ParseError::LabelCount { files, labels }) => {
      assert_eq!((files, labels), (2, 1));
    },
    other => panic!("unexpected result: {:?}", other)
  }
  // tables labelled differently can't be mixed
  let plain = read_table(&second).unwrap();
  let mixed = NormalizedTable::concat([table.clone(), plain]);
  assert!(matches!(mixed, Err(ParseError::LabelMismatch { .. })));
  // tabulating alone doesn't search
  let tabulated = tabulate_files(&paths);
  let first_table = tabulated[0].as_ref().unwrap();
  assert_eq!(first_table.report.rows, 6);
  assert_eq!(first_table.report.critical_roots, 0);
  assert!(first_table.roots.is_empty());
  let searched = first_table.clone().search_roots(&RootSearch::default());
  assert_eq!(searched.report.critical_roots, 1);
  // per-file analysis, in input order, failures kept apart
  let missing = dir.path().join("missing.f06");
  let search = RootSearch::default();
  let analyses = analyze_files(&[first, missing, second], &search);
  assert_eq!(analyses.len(), 3);
  let report0 = &analyses[0].as_ref().unwrap().report;
  assert_eq!(report0.filename.as_deref(), Some("theta0.f06"));
  assert_eq!(report0.pages, 3);
  assert_eq!(report0.flutter_pages, 2);
  assert_eq!(report0.joined_sweeps, 1);
  assert_eq!(report0.rows, 6);
  assert_eq!(report0.critical_roots, 1);
  assert!(matches!(analyses[1], Err(ParseError::Io(_))));
  assert!(analyses[2].is_ok());
}

#[test]
fn test_lossy_input() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("binary.f06");
  let mut file = File::create(&path).unwrap();
  for line in flutter_page(1, &Sweep::new(1, 2.0, 1), FIRST_PAGE) {
    file.write_all(line.as_bytes()).unwrap();
    file.write_all(b"\n").unwrap();
  }
  file.write_all(b"1  \xff\xfe GARBAGE PAGE\n").unwrap();
  drop(file);
  let doc = read_report(&path).unwrap();
  assert_eq!(doc.page_count(), 2);
  assert_eq!(doc.pages[1].page.kind, PageKind::Text);
  assert_eq!(doc.flutter_pages()[0].rows.len(), 4);
}
