//! Measurement text parsing and formatting.
//!
//! Tool geometry is stored as unit-suffixed text (`"0.2500 in"`,
//! `"12.7mm"`, `"1/2\""`). This module owns the conversion between that
//! text form and numeric values: parsing with fraction support, inverse
//! formatting with optional fractional-inch notation, and the numeric
//! extraction path used for persistence and tool-table output.

use crate::config::{Precision, CONV_MM_INCH, MAX_FRACTION_DENOMINATOR};

/// Unit detected on a measurement string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeasureUnit {
    #[default]
    Inches,
    Millimeters,
}

impl MeasureUnit {
    /// Parse a unit token. Empty and `"` mean inches.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "" | "\"" => Some(MeasureUnit::Inches),
            t if t.eq_ignore_ascii_case("in") => Some(MeasureUnit::Inches),
            t if t.eq_ignore_ascii_case("mm") => Some(MeasureUnit::Millimeters),
            _ => None,
        }
    }

    /// Suffix used when rendering without quote notation.
    pub fn suffix(&self) -> &'static str {
        match self {
            MeasureUnit::Inches => "in",
            MeasureUnit::Millimeters => "mm",
        }
    }
}

impl std::fmt::Display for MeasureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// A parsed measurement: numeric value plus detected unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: MeasureUnit,
}

/// Field categories that drive numeric extraction and display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Length/diameter values, normalized to inches on extraction.
    Dimension,
    /// Spindle speeds, kept as-is.
    Rpm,
    /// Angles in degrees, kept as-is.
    Angle,
    /// Plain counts (tool number, flutes).
    Number,
}

/// Parse a measurement string into a numeric value and unit.
///
/// Accepts decimals (`"0.25 in"`), simple fractions (`"1/2"`), and mixed
/// numbers with `-` or space as the whole/fraction separator (`"1-1/2\""`,
/// `"1 1/2 in"`). A missing unit defaults to inches. Returns `None` when
/// the text has no parseable numeric portion or an unknown unit; callers
/// must treat that as "unparseable", not as zero.
pub fn parse_measurement(text: &str) -> Option<Measurement> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    // The unit token starts at the first alphabetic or quote character.
    let unit_start = s
        .find(|c: char| c.is_ascii_alphabetic() || c == '"' || c == '\'')
        .unwrap_or(s.len());
    let (num_part, unit_part) = s.split_at(unit_start);

    let unit = MeasureUnit::from_token(unit_part)?;
    let value = parse_numeric_part(num_part.trim())?;
    Some(Measurement { value, unit })
}

/// Parse the numeric portion: decimal, simple fraction, or mixed number.
fn parse_numeric_part(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }

    if let Some((lhs, den_str)) = s.split_once('/') {
        let den = parse_plain_number(den_str.trim())?;
        if den <= 0.0 {
            return None;
        }
        let lhs = lhs.trim();
        if let Some(sep) = lhs.find(['-', ' ']) {
            // Mixed number: whole part, separator, numerator.
            let whole = parse_plain_number(lhs[..sep].trim())?;
            let num = parse_plain_number(lhs[sep + 1..].trim())?;
            Some(whole + num / den)
        } else {
            let num = parse_plain_number(lhs)?;
            Some(num / den)
        }
    } else {
        parse_plain_number(s)
    }
}

/// Parse an unsigned decimal made of digits and at most one dot.
fn parse_plain_number(s: &str) -> Option<f64> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    s.parse().ok()
}

/// Format a stored measurement string for display.
///
/// Fail-soft: empty input renders as `"N/A"`, unparseable input is
/// returned unchanged. Inch values render as the nearest fraction with
/// denominator <= 64 when `convert_to_fraction` is set, otherwise as a
/// fixed-point decimal at the configured precision. `add_quotes` uses
/// `"` notation for inches instead of the ` in` suffix.
pub fn format_measurement(
    text: &str,
    precision: Precision,
    convert_to_fraction: bool,
    add_quotes: bool,
) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "N/A".to_string();
    }

    match parse_measurement(trimmed) {
        Some(m) => render_value(m.value, m.unit, precision, convert_to_fraction, add_quotes),
        None => text.to_string(),
    }
}

/// Render a numeric value in the given unit.
pub fn render_value(
    value: f64,
    unit: MeasureUnit,
    precision: Precision,
    convert_to_fraction: bool,
    add_quotes: bool,
) -> String {
    match unit {
        MeasureUnit::Inches => {
            let body = if convert_to_fraction {
                format_inch_fraction(value)
            } else {
                format!("{:.*}", precision.imperial, value)
            };
            if add_quotes {
                format!("{body}\"")
            } else {
                format!("{body} in")
            }
        }
        MeasureUnit::Millimeters => {
            format!("{:.*} mm", precision.metric, value)
        }
    }
}

/// Render an inch value as a whole number, proper fraction, or mixed
/// number, limited to denominators <= 64.
fn format_inch_fraction(value: f64) -> String {
    // Whole values stay bare integers ("1", not "1/1").
    if (value - value.round()).abs() < 1e-9 {
        return format!("{}", value.round() as i64);
    }

    let (num, den) = nearest_fraction(value, MAX_FRACTION_DENOMINATOR);
    if den == 1 {
        return num.to_string();
    }
    if num > den {
        let whole = num / den;
        let rem = num % den;
        if rem == 0 {
            whole.to_string()
        } else {
            format!("{whole}-{rem}/{den}")
        }
    } else {
        format!("{num}/{den}")
    }
}

/// Nearest fraction to `value` with denominator <= `max_den`, reduced.
///
/// Denominators are tried in ascending order so ties resolve to the
/// smaller one, matching `Fraction.limit_denominator` for the 1/64 grid.
fn nearest_fraction(value: f64, max_den: u64) -> (u64, u64) {
    let mut best = (value.round() as u64, 1u64);
    let mut best_err = (value - value.round()).abs();

    for den in 2..=max_den {
        let num = (value * den as f64).round() as u64;
        let err = (value - num as f64 / den as f64).abs();
        if err < best_err {
            best = (num, den);
            best_err = err;
        }
    }

    let g = gcd(best.0.max(1), best.1);
    (best.0 / g, best.1 / g)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Extract the first numeric substring from free text, with unit
/// normalization for dimension fields.
///
/// Thousands separators are stripped, a leading sign is honored, and
/// `Dimension` values carrying a `mm` marker are converted to inches.
/// Returns `None` when the text has no numeric portion.
pub fn extract_numeric(text: &str, field_type: FieldType) -> Option<f64> {
    if text.trim().is_empty() {
        return None;
    }

    let cleaned = text.replace(',', "");
    let number = first_numeric_substring(&cleaned)?;

    if field_type == FieldType::Dimension && cleaned.to_lowercase().contains("mm") {
        Some(number / CONV_MM_INCH)
    } else {
        Some(number)
    }
}

/// Find and parse the first `-?[0-9.]+` run in the text.
fn first_numeric_substring(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut start = None;

    for (i, b) in bytes.iter().enumerate() {
        let is_numeric = b.is_ascii_digit() || *b == b'.';
        let is_sign = *b == b'-'
            && bytes
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_digit() || *n == b'.');
        if is_numeric || is_sign {
            start = Some(i);
            break;
        }
    }

    let start = start?;
    let mut end = start + 1;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }

    s[start..end].parse().ok()
}

/// Format an integer with thousands separators (`18000` -> `"18,000"`).
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead % 3) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
