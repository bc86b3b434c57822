// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Validation and coercion of incoming test payloads.
//!
//! Payloads arrive as loose JSON. Every field is optional at the type level so
//! a missing field is reported as a validation failure naming that field
//! rather than as a deserialization error.

use crate::records::{LabTest, Parameter};
use crate::storage::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Candidate test as submitted by a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestPayload {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub parameters: Option<Value>,
}

impl TestPayload {
    /// Validates the payload and coerces it into a record.
    ///
    /// The first violated constraint is reported; nothing is mutated.
    pub fn validate(&self) -> Result<LabTest, StoreError> {
        let name = coerce_name(self.name.as_ref())?;
        let price = coerce_price(self.price.as_ref())?;
        let parameters = coerce_parameters(self.parameters.as_ref())?;
        Ok(LabTest {
            name,
            price,
            parameters,
        })
    }
}

impl From<&LabTest> for TestPayload {
    fn from(test: &LabTest) -> Self {
        Self {
            name: Some(Value::String(test.name.clone())),
            price: serde_json::Number::from_f64(test.price).map(Value::Number),
            parameters: serde_json::to_value(&test.parameters).ok(),
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> StoreError {
    StoreError::InvalidInput {
        field: field.into(),
        message: message.into(),
    }
}

fn coerce_name(value: Option<&Value>) -> Result<String, StoreError> {
    let name = match value {
        None | Some(Value::Null) => return Err(invalid("name", "Test name is required")),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(invalid("name", "Test name must be text")),
    };
    if name.is_empty() {
        return Err(invalid("name", "Test name cannot be empty"));
    }
    Ok(name)
}

fn coerce_price(value: Option<&Value>) -> Result<f64, StoreError> {
    let price = match value {
        None | Some(Value::Null) => return Err(invalid("price", "Price is required")),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid("price", "Price must be a number"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid("price", format!("Price '{}' is not a number", s)))?,
        Some(_) => return Err(invalid("price", "Price must be a number")),
    };
    if !price.is_finite() {
        return Err(invalid("price", "Price must be a finite number"));
    }
    if price < 0.0 {
        return Err(invalid("price", "Price cannot be negative"));
    }
    Ok(price)
}

fn coerce_parameters(value: Option<&Value>) -> Result<Vec<Parameter>, StoreError> {
    let items = match value {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => {
            return Err(invalid("parameters", "At least one parameter is required"))
        }
        Some(_) => return Err(invalid("parameters", "Parameters must be a list")),
    };
    if items.is_empty() {
        return Err(invalid("parameters", "At least one parameter is required"));
    }

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let fields = item.as_object().ok_or_else(|| {
                invalid(
                    format!("parameters[{}]", idx),
                    "Each parameter must be an object",
                )
            })?;
            let text = |key: &str| {
                let alias = if key == "normalRange" { fields.get("normal_range") } else { None };
                coerce_text(fields.get(key).or(alias))
                    .ok_or_else(|| invalid(format!("parameters[{}].{}", idx, key), "Must be text"))
            };
            Ok(Parameter {
                name: text("name")?,
                unit: text("unit")?,
                normal_range: text("normalRange")?,
            })
        })
        .collect()
}

// Missing and null become empty text; structured values are rejected.
fn coerce_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(_) => None,
    }
}
