//! In-memory columnar table loaded from CSV.
//!
//! [`DataFrame`] is the tabular store the SQL generator reads from. Cells are
//! typed [`Value`]s; each column carries a [`Dtype`] whose tag drives schema
//! mapping. Besides loading, the store answers null-count queries, drops
//! incomplete rows, casts columns and materializes rows in file order.

use std::{io::Read, path::Path};

use encoding_rs::Encoding;
use log::{debug, info};
use serde::Serialize;

use crate::{
    data::{Value, parse_bool_flexible, parse_bool_literal, parse_timestamp},
    dtype::{Dtype, TypeCandidate, parse_raw},
    error::ExportError,
    io_utils,
    sql::ColumnDescriptor,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: Dtype,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: Dtype, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_missing()).count()
    }
}

/// One line of [`DataFrame::summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub position: usize,
    pub name: String,
    pub non_null: usize,
    pub nulls: usize,
    pub dtype: String,
}

/// A dtype change applied by [`DataFrame::auto_convert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtypeChange {
    pub column: String,
    pub from: Dtype,
    pub to: Dtype,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Builds a frame from prepared columns, which must all have the same
    /// length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, ExportError> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(ragged) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(ExportError::conversion(
                &ragged.name,
                format!(
                    "column holds {} value(s) but the table has {row_count} row(s)",
                    ragged.values.len()
                ),
            ));
        }
        Ok(Self { columns, row_count })
    }

    pub fn from_csv_path(
        path: &Path,
        delimiter: u8,
        encoding: &'static Encoding,
    ) -> Result<Self, ExportError> {
        let file = io_utils::open_input_file(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                ExportError::ingest(path, "file not found")
            } else {
                ExportError::ingest(path, err)
            }
        })?;
        let frame = Self::from_reader(file, delimiter, encoding, path)?;
        info!(
            "Read {} row(s) across {} column(s) from {:?}",
            frame.row_count,
            frame.columns.len(),
            path
        );
        Ok(frame)
    }

    /// Reads headed CSV from `reader`; `source` only labels errors.
    pub fn from_reader<R: Read>(
        reader: R,
        delimiter: u8,
        encoding: &'static Encoding,
        source: &Path,
    ) -> Result<Self, ExportError> {
        let mut reader = io_utils::open_csv_reader(reader, delimiter);
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .map_err(|err| ExportError::ingest(source, format!("reading headers: {err}")))?;
        let headers = dedupe_headers(headers);

        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for (idx, record) in reader.byte_records().enumerate() {
            let record = record
                .map_err(|err| ExportError::ingest(source, format!("row {}: {err}", idx + 2)))?;
            let decoded = io_utils::decode_record(&record, encoding)
                .map_err(|err| ExportError::ingest(source, format!("row {}: {err}", idx + 2)))?;
            for (column, value) in raw_columns.iter_mut().zip(decoded) {
                column.push(value);
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw_columns)
            .map(|(name, raw)| {
                let mut candidate = TypeCandidate::new();
                for value in &raw {
                    candidate.update(value);
                }
                let dtype = candidate.decide();
                debug!("Column '{name}' read as {dtype}");
                let values = raw.iter().map(|value| parse_raw(value, dtype)).collect();
                Column::new(name, dtype, values)
            })
            .collect();
        Self::from_columns(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn dtypes(&self) -> Vec<(String, Dtype)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.dtype))
            .collect()
    }

    /// Name and dtype tag of every column, in table order.
    pub fn descriptors(&self) -> Vec<ColumnDescriptor> {
        self.columns
            .iter()
            .map(|c| ColumnDescriptor::new(&c.name, c.dtype.tag()))
            .collect()
    }

    pub fn null_counts(&self) -> Vec<(String, usize)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.null_count()))
            .collect()
    }

    /// Number of columns holding at least one null.
    pub fn null_column_count(&self) -> usize {
        self.columns.iter().filter(|c| c.null_count() > 0).count()
    }

    pub fn columns_with_nulls(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Removes every row that has a null (or infinite float) in any column and
    /// returns how many rows were removed.
    pub fn drop_null_rows(&mut self) -> usize {
        let keep: Vec<bool> = (0..self.row_count)
            .map(|row| self.columns.iter().all(|c| !c.values[row].is_missing()))
            .collect();
        let removed = keep.iter().filter(|kept| !**kept).count();
        if removed == 0 {
            return 0;
        }
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column
                .values
                .retain(|_| flags.next().copied().unwrap_or(false));
        }
        self.row_count -= removed;
        info!("Dropped {removed} row(s) containing na/null values");
        removed
    }

    /// Converts a column to `target`. On failure the frame is left unchanged.
    pub fn cast_column(&mut self, name: &str, target: Dtype) -> Result<(), ExportError> {
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| ExportError::conversion(name, "column not in table"))?;
        let converted = column
            .values
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                cast_value(value, target).map_err(|reason| {
                    ExportError::conversion(name, format!("row {}: {reason}", idx + 1))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Column '{name}' converted from {} to {target}", column.dtype);
        column.values = converted;
        column.dtype = target;
        Ok(())
    }

    /// Narrows every column to the most specific dtype its values allow.
    /// Unlike pandas `convert_dtypes`, text is parsed into bool, int64,
    /// float64 or datetime64[ns] and booleans land on the mapped `bool` tag.
    /// Refuses tables that still contain nulls.
    pub fn auto_convert(&mut self) -> Result<Vec<DtypeChange>, ExportError> {
        let unclean = self.columns_with_nulls();
        if !unclean.is_empty() {
            return Err(ExportError::UncleanData { columns: unclean });
        }
        let mut changes = Vec::new();
        for column in &mut self.columns {
            let Some(target) = preferred_dtype(column) else {
                continue;
            };
            if target == column.dtype {
                continue;
            }
            let converted = column
                .values
                .iter()
                .map(|value| cast_value(value, target))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| ExportError::conversion(&column.name, reason))?;
            changes.push(DtypeChange {
                column: column.name.clone(),
                from: column.dtype,
                to: target,
            });
            column.values = converted;
            column.dtype = target;
        }
        Ok(changes)
    }

    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        (index < self.row_count).then(|| {
            self.columns
                .iter()
                .map(|c| c.values[index].clone())
                .collect()
        })
    }

    /// Rows in file order, one value per column.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.row_count).filter_map(move |idx| self.row(idx))
    }

    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, c)| {
                let nulls = c.null_count();
                ColumnSummary {
                    position: idx,
                    name: c.name.clone(),
                    non_null: self.row_count - nulls,
                    nulls,
                    dtype: c.dtype.tag().to_string(),
                }
            })
            .collect()
    }
}

/// Repeated header names get a `.N` suffix so every column stays addressable.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut candidate = header.clone();
        let mut counter = 1;
        while seen.contains(&candidate) {
            candidate = format!("{header}.{counter}");
            counter += 1;
        }
        seen.push(candidate);
    }
    seen
}

fn preferred_dtype(column: &Column) -> Option<Dtype> {
    match column.dtype {
        Dtype::Object | Dtype::String => {
            let texts = column
                .values
                .iter()
                .map(|value| match value {
                    Value::String(s) => Some(s.trim()),
                    _ => None,
                })
                .collect::<Option<Vec<&str>>>()?;
            let target = if texts.is_empty() {
                Dtype::String
            } else if texts.iter().all(|t| parse_bool_literal(t).is_some()) {
                Dtype::Bool
            } else if texts.iter().all(|t| t.parse::<i64>().is_ok()) {
                Dtype::Int64
            } else if texts.iter().all(|t| t.parse::<f64>().is_ok()) {
                Dtype::Float64
            } else if texts.iter().all(|t| parse_timestamp(t).is_some()) {
                Dtype::DateTime
            } else {
                Dtype::String
            };
            Some(target)
        }
        Dtype::Float32 | Dtype::Float64 => {
            let integral = column.values.iter().all(|value| match value {
                Value::Float(f) => f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64,
                _ => false,
            });
            integral.then_some(Dtype::Int64)
        }
        _ => None,
    }
}

fn cast_value(value: &Value, target: Dtype) -> Result<Value, String> {
    let describe = || format!("cannot convert {} to {target}", describe_value(value));
    match target {
        Dtype::Object => Ok(value.clone()),
        Dtype::String | Dtype::Category => Ok(match value {
            Value::Null => Value::Null,
            other => Value::String(other.as_display()),
        }),
        Dtype::Int32 | Dtype::Int64 => {
            let parsed = match value {
                Value::Null => return Err(format!("cannot convert null to {target}")),
                Value::Integer(i) => *i,
                Value::Boolean(b) => i64::from(*b),
                Value::Float(f) => float_to_integer(*f).ok_or_else(describe)?,
                Value::String(s) => {
                    let trimmed = s.trim();
                    match trimmed.parse::<i64>() {
                        Ok(parsed) => parsed,
                        Err(_) => trimmed
                            .parse::<f64>()
                            .ok()
                            .and_then(float_to_integer)
                            .ok_or_else(describe)?,
                    }
                }
                Value::Timestamp(_) => return Err(describe()),
            };
            if target == Dtype::Int32 && i32::try_from(parsed).is_err() {
                return Err(format!("{parsed} is out of range for int32"));
            }
            Ok(Value::Integer(parsed))
        }
        Dtype::Float32 | Dtype::Float64 => match value {
            Value::Null => Ok(Value::Null),
            Value::Float(f) => Ok(Value::Float(*f)),
            Value::Integer(i) => Ok(Value::Float(*i as f64)),
            Value::Boolean(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
            Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| describe()),
            Value::Timestamp(_) => Err(describe()),
        },
        Dtype::Bool => match value {
            Value::Null => Ok(Value::Null),
            Value::Boolean(b) => Ok(Value::Boolean(*b)),
            Value::Integer(i) => Ok(Value::Boolean(*i != 0)),
            Value::Float(f) => Ok(Value::Boolean(*f != 0.0)),
            Value::String(s) => parse_bool_flexible(s)
                .map(Value::Boolean)
                .ok_or_else(describe),
            Value::Timestamp(_) => Err(describe()),
        },
        Dtype::DateTime => match value {
            Value::Null => Ok(Value::Null),
            Value::Timestamp(ts) => Ok(Value::Timestamp(*ts)),
            Value::String(s) => parse_timestamp(s).map(Value::Timestamp).ok_or_else(describe),
            _ => Err(describe()),
        },
    }
}

fn float_to_integer(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64)
        .then_some(value as i64)
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => format!("'{s}'"),
        other => other.as_display(),
    }
}
