//! This module implements utility functions without much need for defining
//! context or not enough of it to warrant them having their own modules.

/// The character that, in the first column, signals a new page.
pub const PAGE_BREAK_MARKER: char = '1';

/// Lines containing any of these end a table.
pub const SKIP_BANNERS: &[&str] = &[
  "*** USER INFORMATION MESSAGE",
  "A ZERO FREQUENCY"
];

/// Returns true if the line starts a new page.
pub fn is_page_break(line: &str) -> bool {
  return line.starts_with(PAGE_BREAK_MARKER);
}

/// Returns true if the line contains a banner that ends a table.
pub fn is_skip_line(line: &str) -> bool {
  return SKIP_BANNERS.iter().any(|b| line.contains(b));
}

/// Returns true if the byte position is preceded by a non-word character (or
/// by nothing at all), like a regex `\b` before a word.
pub(crate) fn word_boundary_before(line: &str, pos: usize) -> bool {
  return match line[..pos].chars().next_back() {
    None => true,
    Some(c) => !(c.is_alphanumeric() || c == '_'),
  };
}

/// Finds the end of a table that starts at `start`: the first line that is
/// blank, starts a new page, or contains a skip banner. Returns the range of
/// table lines, which is empty if `start` is past the page.
pub fn tabular_range(lines: &[String], start: usize) -> (usize, usize) {
  if start >= lines.len() {
    return (lines.len(), lines.len());
  }
  let end = lines[start..].iter()
    .position(|l| l.trim().is_empty() || is_page_break(l) || is_skip_line(l))
    .map_or(lines.len(), |p| start + p);
  return (start, end);
}

/// Decodes a Nastran-format floating point number, which may lack the `E` in
/// the exponent (like `1.5-3`). Hyper-lenient; returns None on garbage.
pub(crate) fn decode_nasfloat(s: &str) -> Option<f64> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  // the exponent starts at an E/D or at a sign that isn't the first char
  let exp_start = s.char_indices()
    .skip(1)
    .find(|(_, c)| matches!(c, 'e' | 'E' | 'd' | 'D' | '+' | '-'))
    .map(|(i, _)| i);
  let (mantissa, exponent) = match exp_start {
    Some(i) => (&s[..i], Some(&s[i..])),
    None => (s, None)
  };
  if !mantissa.chars().any(|c| c.is_ascii_digit()) {
    return None;
  }
  let m = mantissa.parse::<f64>().ok()?;
  return match exponent {
    None => Some(m),
    Some(e) => {
      let digits = e.trim_start_matches(['e', 'E', 'd', 'D']);
      Some(m * 10.0_f64.powi(digits.parse::<i32>().ok()?))
    }
  };
}

/// Decodes a table field. Plain real first, then the Nastran format. Anything
/// else is a missing value.
pub fn parse_field(token: &str) -> Option<f64> {
  if let Ok(x) = token.parse::<f64>() {
    return Some(x);
  }
  return decode_nasfloat(token);
}

/// Splits a table line into a fixed number of fields. Fields that fail to
/// decode, and fields past the end of the line, are missing values.
pub fn split_fields<const W: usize>(line: &str) -> [Option<f64>; W] {
  let mut fields = [None; W];
  for (slot, token) in fields.iter_mut().zip(line.split_whitespace()) {
    *slot = parse_field(token);
  }
  return fields;
}
