// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lab test record types shared by the codec, the store and the HTTP API.

use serde::{Deserialize, Deserializer, Serialize};

/// A measurable attribute of a lab test.
///
/// `normal_range` is free-form text such as `13.8-17.2` and is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, rename = "normalRange", alias = "normal_range")]
    pub normal_range: String,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        normal_range: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            normal_range: normal_range.into(),
        }
    }
}

/// A named, priced lab test with its ordered parameters.
///
/// `price` may be NaN when a persisted row carried an unparsable price; such a
/// value is display-only and serializes to JSON `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabTest {
    pub name: String,
    #[serde(deserialize_with = "price_or_nan")]
    pub price: f64,
    pub parameters: Vec<Parameter>,
}

fn price_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl LabTest {
    pub fn new(name: impl Into<String>, price: f64, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            price,
            parameters,
        }
    }

    /// True when the price decoded to a usable number.
    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite()
    }
}

// NaN prices compare equal so decoded sequences can be checked for identity.
impl PartialEq for LabTest {
    fn eq(&self, other: &Self) -> bool {
        let same_price = self.price == other.price || (self.price.is_nan() && other.price.is_nan());
        self.name == other.name && same_price && self.parameters == other.parameters
    }
}
