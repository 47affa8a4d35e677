//! Raw schema checks.
//!
//! A schema is the `raw_schema` list of the project config: one
//! `{name, type}` entry per expected column, with types `int`, `float`,
//! `string` or `datetime`.

use crate::error::{DataError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Any signed or unsigned integer width
    Int,
    /// `Float32` or `Float64`
    Float,
    /// UTF-8 strings
    String,
    /// Datetime of any unit and time zone
    Datetime,
}

impl FieldType {
    /// Whether a polars dtype satisfies this declared type.
    pub fn matches(self, dtype: &DataType) -> bool {
        match self {
            Self::Int => dtype.is_integer(),
            Self::Float => dtype.is_float(),
            Self::String => matches!(dtype, DataType::String),
            Self::Datetime => matches!(dtype, DataType::Datetime(_, _)),
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "string" => Ok(Self::String),
            "datetime" => Ok(Self::Datetime),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Datetime => "datetime",
        };
        f.write_str(name)
    }
}

/// One declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Column name
    pub name: String,
    /// Declared type name
    #[serde(rename = "type")]
    pub field_type: String,
}

impl SchemaField {
    /// Create a field declaration.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
        }
    }
}

/// Check `df` against `schema`.
///
/// Failures are reported in a fixed order: unsupported declared type,
/// missing columns, extra columns, then the first dtype mismatch.
pub fn validate_schema(df: &DataFrame, schema: &[SchemaField]) -> Result<()> {
    let mut declared = Vec::with_capacity(schema.len());
    for field in schema {
        let field_type =
            FieldType::from_str(&field.field_type).map_err(|t| DataError::UnsupportedType {
                field_type: t,
                column: field.name.clone(),
            })?;
        declared.push((field.name.as_str(), field_type));
    }

    let actual = df.schema();

    let missing: Vec<String> = declared
        .iter()
        .filter(|(name, _)| actual.get(name).is_none())
        .map(|(name, _)| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataError::MissingColumns(missing));
    }

    let extra: Vec<String> = actual
        .iter_names()
        .filter(|name| !declared.iter().any(|(d, _)| *d == name.as_str()))
        .map(|name| name.to_string())
        .collect();
    if !extra.is_empty() {
        return Err(DataError::ExtraColumns(extra));
    }

    for (name, field_type) in declared {
        if let Some(dtype) = actual.get(name)
            && !field_type.matches(dtype)
        {
            return Err(DataError::TypeMismatch {
                column: name.to_string(),
                expected: field_type.to_string(),
                actual: dtype.to_string(),
            });
        }
    }

    Ok(())
}
