//! Column storage types and read-time type inference.
//!
//! A [`Dtype`] is the store-side label of a column. Its [`Dtype::tag`] text is
//! what the SQL generator maps onto SQL column types, so the spellings follow
//! the familiar dataframe conventions (`int64`, `float64`, `datetime64[ns]`).

use std::{fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::data::{Value, is_na_token, parse_bool_literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    Object,
    String,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    DateTime,
    Category,
}

impl Dtype {
    pub fn tag(&self) -> &'static str {
        match self {
            Dtype::Object => "object",
            Dtype::String => "string",
            Dtype::Int32 => "int32",
            Dtype::Int64 => "int64",
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
            Dtype::Bool => "bool",
            Dtype::DateTime => "datetime64[ns]",
            Dtype::Category => "category",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Dtype {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "object" => Ok(Dtype::Object),
            "string" | "str" => Ok(Dtype::String),
            "int32" => Ok(Dtype::Int32),
            "int64" | "int" => Ok(Dtype::Int64),
            "float32" => Ok(Dtype::Float32),
            "float64" | "float" => Ok(Dtype::Float64),
            "bool" | "boolean" => Ok(Dtype::Bool),
            "datetime64[ns]" | "datetime" | "timestamp" => Ok(Dtype::DateTime),
            "category" => Ok(Dtype::Category),
            _ => Err(anyhow!(
                "Unsupported data type '{value}' (expected one of string, int32, int64, bool, float64, float32, float, object, datetime, category)"
            )),
        }
    }
}

/// Running evidence about which types a column's raw text can still be.
#[derive(Debug, Clone)]
pub(crate) struct TypeCandidate {
    non_null: usize,
    nulls: usize,
    possible_boolean: bool,
    possible_integer: bool,
    possible_float: bool,
}

impl TypeCandidate {
    pub(crate) fn new() -> Self {
        Self {
            non_null: 0,
            nulls: 0,
            possible_boolean: true,
            possible_integer: true,
            possible_float: true,
        }
    }

    pub(crate) fn update(&mut self, raw: &str) {
        if is_na_token(raw) {
            self.nulls += 1;
            return;
        }
        self.non_null += 1;
        let trimmed = raw.trim();
        if self.possible_boolean && parse_bool_literal(trimmed).is_none() {
            self.possible_boolean = false;
        }
        if self.possible_integer && trimmed.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && trimmed.parse::<f64>().is_err() {
            self.possible_float = false;
        }
    }

    /// Integer columns with gaps widen to float and boolean columns with gaps
    /// fall back to object, since neither storage can hold a null. A column
    /// of nothing but nulls reads as float; a column with no rows as object.
    pub(crate) fn decide(&self) -> Dtype {
        if self.non_null == 0 {
            return if self.nulls > 0 { Dtype::Float64 } else { Dtype::Object };
        }
        let has_nulls = self.nulls > 0;
        if self.possible_boolean {
            if has_nulls { Dtype::Object } else { Dtype::Bool }
        } else if self.possible_integer && !has_nulls {
            Dtype::Int64
        } else if self.possible_integer || self.possible_float {
            Dtype::Float64
        } else {
            Dtype::Object
        }
    }
}

/// Converts one raw field into a cell of the inferred column type.
pub(crate) fn parse_raw(raw: &str, dtype: Dtype) -> Value {
    if is_na_token(raw) {
        return Value::Null;
    }
    let trimmed = raw.trim();
    match dtype {
        Dtype::Bool => parse_bool_literal(trimmed)
            .map(Value::Boolean)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Dtype::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        Dtype::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}
