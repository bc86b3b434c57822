// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Denormalized spreadsheet export: one row per (test, parameter) pair.
//!
//! This shape is for download only and is never read back by [`super::decode`].

use super::format_price;
use crate::records::LabTest;

pub const EXPORT_HEADER: &str = "Test Name,Price,Parameter,Unit,Normal Range";

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Renders the export document. Tests without parameters produce no rows.
pub fn export_csv(tests: &[LabTest]) -> String {
    let mut csv = String::from(EXPORT_HEADER);
    csv.push('\n');

    for test in tests {
        let name = quoted(&test.name);
        let price = format_price(test.price);
        for param in &test.parameters {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                name,
                price,
                quoted(&param.name),
                quoted(&param.unit),
                quoted(&param.normal_range)
            ));
        }
    }

    csv
}
