// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Character-level scanning of the delimited-text format.

/// True when `text` leaves no quoted section open.
///
/// Every `"` toggles quote-mode, and an escaped `""` toggles twice, so an
/// even count means the text ends outside quotes.
pub fn quotes_balanced(text: &str) -> bool {
    text.bytes().filter(|&b| b == b'"').count() % 2 == 0
}

/// Splits one row into its fields.
///
/// Outside quotes a comma ends the field and a quote enters quote-mode.
/// Inside quotes `""` is a literal quote, a lone quote leaves quote-mode and
/// everything else (commas and newlines included) is content.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => current.push(ch),
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            }
        }
    }
    fields.push(current);

    fields
}
