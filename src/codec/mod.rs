// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tabular codec for the persisted test document.
//!
//! Each test is one row `name,price,parameters` where `parameters` is the JSON
//! encoding of the parameter list carried as a single field. Decoding is
//! lossy on purpose: a corrupted row is dropped and counted so the rest of the
//! document stays loadable.

pub mod export;
pub mod scanner;

pub use export::{export_csv, EXPORT_HEADER};
pub use scanner::{quotes_balanced, split_fields};

use crate::records::{LabTest, Parameter};
use std::borrow::Cow;
use tracing::warn;

/// Header line written at the top of every persisted document.
pub const HEADER: &str = "name,price,parameters";

/// Result of decoding a persisted document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub tests: Vec<LabTest>,
    /// Rows that were present but could not be turned into a record.
    pub skipped: usize,
}

/// Quotes a field when it contains a quote, comma or line break.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Default decimal text form of a price: `50`, `12.5`, `NaN`.
pub fn format_price(price: f64) -> String {
    if price == 0.0 {
        // avoids "-0"
        return "0".to_string();
    }
    price.to_string()
}

/// Parses a persisted price. Unparsable text yields NaN instead of an error.
pub fn parse_price(raw: &str) -> f64 {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .unwrap_or_else(|_| leading_number(trimmed).unwrap_or(f64::NAN))
}

// Longest numeric prefix, so "50 INR" still reads as 50.
fn leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &text[digits_start..end] == "." {
        return None;
    }
    let mantissa_end = end;
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    text[..end]
        .parse()
        .ok()
        .or_else(|| text[..mantissa_end].parse().ok())
}

/// Encodes one test as a row, without the trailing newline.
pub fn encode_row(test: &LabTest) -> serde_json::Result<String> {
    let parameters = serde_json::to_string(&test.parameters)?;
    Ok([
        escape_field(&test.name),
        Cow::Owned(format_price(test.price)),
        escape_field(&parameters),
    ]
    .join(","))
}

/// Encodes a full document: header followed by one row per test.
pub fn encode(tests: &[LabTest]) -> serde_json::Result<String> {
    let mut out = String::with_capacity(HEADER.len() + 1 + tests.len() * 64);
    out.push_str(HEADER);
    out.push('\n');
    for test in tests {
        out.push_str(&encode_row(test)?);
        out.push('\n');
    }
    Ok(out)
}

/// Decodes a document. The first physical line is the header and is
/// discarded whatever it contains.
///
/// A quoted field may run onto later lines. When such a span does not close
/// into a valid row, only its first line is dropped and decoding resumes on
/// the next one, so a stray quote costs a single row.
pub fn decode(content: &str) -> Decoded {
    let mut decoded = Decoded::default();
    let lines: Vec<&str> = content.trim_start().split('\n').skip(1).collect();

    let mut idx = 0;
    while idx < lines.len() {
        if lines[idx].trim().is_empty() {
            idx += 1;
            continue;
        }
        match read_row(&lines, idx) {
            Some((test, used)) => {
                decoded.tests.push(test);
                idx += used;
            }
            None => {
                warn!("Skipping malformed row on line {} of test document", idx + 2);
                decoded.skipped += 1;
                idx += 1;
            }
        }
    }

    decoded
}

// Decodes the row starting at `lines[start]`. Returns the record and the
// number of physical lines it spans.
fn read_row(lines: &[&str], start: usize) -> Option<(LabTest, usize)> {
    let first = lines[start];
    if quotes_balanced(first) {
        return decode_row(first).map(|test| (test, 1));
    }

    let mut span = first.to_string();
    for (offset, line) in lines[start + 1..].iter().enumerate() {
        let closes = !quotes_balanced(line);
        // A complete row on its own line is never quoted content
        if !closes && decode_row(line).is_some() {
            return None;
        }
        span.push('\n');
        span.push_str(line);
        if closes {
            return decode_row(&span).map(|test| (test, offset + 2));
        }
    }
    None
}

fn decode_row(row: &str) -> Option<LabTest> {
    let mut fields = split_fields(row.trim()).into_iter();
    let name = fields.next()?;
    let price = fields.next()?;
    let parameters = fields.next()?;

    let parameters: Vec<Parameter> = serde_json::from_str(&parameters).ok()?;

    Some(LabTest {
        name,
        price: parse_price(&price),
        parameters,
    })
}
