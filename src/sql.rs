//! Schema inference and MySQL script generation.
//!
//! Column dtype tags are mapped onto SQL column types through a fixed,
//! ordered table ([`TYPE_MAPPINGS`]). A table can only be exported when every
//! column maps; otherwise [`derive_schema`] reports a
//! [`ExportError::SchemaMismatch`] with the columns that fell through.
//!
//! ## Script layout
//!
//! ```text
//! CREATE TABLE <name> (
//! <col> <TYPE>,
//! <col> <TYPE>
//! );
//!
//! INSERT INTO <name> VALUES
//! (<v1>, <v2>),
//! (<v1>, <v2>);
//! ```
//!
//! The `INSERT INTO` header keeps a trailing space before its newline. Row
//! values are rendered as SQL literals (see [`Value::to_sql_literal`]), and
//! the insert statement is omitted entirely for tables without rows.

use std::{
    fmt::Write as _,
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    data::Value,
    error::{ExportError, IoStep},
    frame::DataFrame,
    io_utils,
};

pub const DEFAULT_TABLE_NAME: &str = "tableXyz";
pub const DEFAULT_OUTPUT_BASE: &str = "Output";

/// Source dtype tag to SQL type. Lookup is exact on the lowercased tag and
/// the first match wins.
pub const TYPE_MAPPINGS: &[(&str, &str)] = &[
    ("string", "VARCHAR(255)"),
    ("int64", "BIGINT"),
    ("float64", "FLOAT"),
    ("double", "DOUBLE"),
    ("bool", "BOOL"),
    ("object", "VARCHAR(255)"),
    ("datetime64[ns]", "TIMESTAMP"),
    ("blob", "BLOB"),
];

/// A column as seen by the generator: its raw name and dtype tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub dtype: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, dtype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: dtype.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlColumn {
    pub name: String,
    pub sql_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum OutputMode {
    /// `(column, SQL type)` pairs only
    #[value(name = "columns", alias = "1")]
    Columns,
    /// Full CREATE TABLE + INSERT INTO script
    #[default]
    #[value(name = "script", alias = "2")]
    Script,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlOutput {
    Columns(Vec<SqlColumn>),
    Script(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub table_name: String,
    pub mode: OutputMode,
    /// Base path; the `.txt` suffix is always appended.
    pub output_base: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            mode: OutputMode::Script,
            output_base: PathBuf::from(DEFAULT_OUTPUT_BASE),
        }
    }
}

/// Spaces become underscores and the name is lowercased.
pub fn normalize_column_name(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

pub fn sql_type_for(dtype: &str) -> Option<&'static str> {
    let lowered = dtype.to_lowercase();
    TYPE_MAPPINGS
        .iter()
        .find(|(tag, _)| *tag == lowered)
        .map(|(_, sql_type)| *sql_type)
}

/// Maps every column whose dtype is known, silently skipping the rest.
pub fn map_columns(columns: &[ColumnDescriptor]) -> Vec<SqlColumn> {
    columns
        .iter()
        .filter_map(|column| {
            sql_type_for(&column.dtype).map(|sql_type| SqlColumn {
                name: normalize_column_name(&column.name),
                sql_type: sql_type.to_string(),
            })
        })
        .collect()
}

pub fn derive_schema(columns: &[ColumnDescriptor]) -> Result<Vec<SqlColumn>, ExportError> {
    let mapped = map_columns(columns);
    if mapped.len() != columns.len() {
        let unmapped = columns
            .iter()
            .filter(|column| sql_type_for(&column.dtype).is_none())
            .map(|column| format!("{} ({})", column.name, column.dtype))
            .collect::<Vec<_>>();
        warn!("No SQL type for column(s): {}", unmapped.join(", "));
        return Err(ExportError::SchemaMismatch {
            processed: columns.len(),
            fetched: mapped.len(),
            unmapped,
        });
    }
    debug!(
        "Processed columns: {}, fetched columns: {}",
        columns.len(),
        mapped.len()
    );
    Ok(mapped)
}

pub fn render_create_table(table_name: &str, schema: &[SqlColumn]) -> String {
    let mut sql = format!("CREATE TABLE {table_name} (\n");
    for (idx, column) in schema.iter().enumerate() {
        let separator = if idx + 1 < schema.len() { "," } else { "" };
        let _ = writeln!(sql, "{} {}{separator}", column.name, column.sql_type);
    }
    sql.push_str(");\n");
    sql
}

fn insert_header(table_name: &str) -> String {
    format!("INSERT INTO {table_name} VALUES \n")
}

fn render_row(row: &[Value]) -> String {
    format!("({})", row.iter().map(Value::to_sql_literal).join(", "))
}

fn row_terminator(is_last: bool) -> &'static str {
    if is_last { ";" } else { ",\n" }
}

pub fn render_insert_statements(table_name: &str, rows: &[Vec<Value>]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    let mut sql = insert_header(table_name);
    for (idx, row) in rows.iter().enumerate() {
        sql.push_str(&render_row(row));
        sql.push_str(row_terminator(idx + 1 == rows.len()));
    }
    sql
}

/// Streams the insert statement row by row. Returns the number of rows
/// written; nothing is written when `rows` is empty.
pub fn write_insert_statements<W, I>(
    writer: &mut W,
    table_name: &str,
    rows: I,
) -> Result<usize, (IoStep, io::Error)>
where
    W: Write,
    I: IntoIterator<Item = Vec<Value>>,
{
    let mut rows = rows.into_iter().peekable();
    if rows.peek().is_none() {
        return Ok(0);
    }
    writer
        .write_all(insert_header(table_name).as_bytes())
        .map_err(|err| (IoStep::WriteInsertHeader, err))?;
    let mut written = 0usize;
    while let Some(row) = rows.next() {
        written += 1;
        let mut line = render_row(&row);
        line.push_str(row_terminator(rows.peek().is_none()));
        writer
            .write_all(line.as_bytes())
            .map_err(|err| (IoStep::WriteRow(written), err))?;
    }
    Ok(written)
}

/// Full script for a frame: create block, blank line, insert statement.
pub fn render_script(frame: &DataFrame, table_name: &str) -> Result<String, ExportError> {
    let schema = derive_schema(&frame.descriptors())?;
    let rows: Vec<Vec<Value>> = frame.rows().collect();
    let mut script = render_create_table(table_name, &schema);
    script.push('\n');
    script.push_str(&render_insert_statements(table_name, &rows));
    Ok(script)
}

pub fn generate(
    frame: &DataFrame,
    table_name: &str,
    mode: OutputMode,
) -> Result<SqlOutput, ExportError> {
    let schema = ensure_exportable(frame)?;
    match mode {
        OutputMode::Columns => Ok(SqlOutput::Columns(schema)),
        OutputMode::Script => render_script(frame, table_name).map(SqlOutput::Script),
    }
}

/// Checks run before any script is produced: no nulls, every dtype mapped,
/// at least one column.
pub fn ensure_exportable(frame: &DataFrame) -> Result<Vec<SqlColumn>, ExportError> {
    if frame.null_column_count() > 0 {
        return Err(ExportError::UncleanData {
            columns: frame.columns_with_nulls(),
        });
    }
    let schema = derive_schema(&frame.descriptors())?;
    if schema.is_empty() {
        return Err(ExportError::EmptySchema);
    }
    Ok(schema)
}

/// Writes the script for `frame` to `<output_base>.txt` and returns that
/// path. Every check runs before the file is created.
pub fn export_as_sql(
    frame: &DataFrame,
    table_name: &str,
    output_base: &Path,
) -> Result<PathBuf, ExportError> {
    let schema = ensure_exportable(frame)?;
    let path = io_utils::script_path(output_base);
    let io_error = |step: IoStep, source: io::Error| ExportError::Io {
        step,
        path: path.clone(),
        source,
    };

    let mut writer =
        io_utils::create_output_file(&path).map_err(|err| io_error(IoStep::CreateFile, err))?;
    let mut create_block = render_create_table(table_name, &schema);
    create_block.push('\n');
    writer
        .write_all(create_block.as_bytes())
        .map_err(|err| io_error(IoStep::WriteSchema, err))?;
    let rows = write_insert_statements(&mut writer, table_name, frame.rows())
        .map_err(|(step, err)| io_error(step, err))?;
    writer.flush().map_err(|err| io_error(IoStep::Flush, err))?;

    info!(
        "Exported {} column(s) and {} row(s) of table '{}' to {:?}",
        schema.len(),
        rows,
        table_name,
        path
    );
    Ok(path)
}

/// Writes the `(column, SQL type)` pairs, one per line, to
/// `<output_base>.txt`.
pub fn export_columns(
    frame: &DataFrame,
    output_base: &Path,
) -> Result<(PathBuf, Vec<SqlColumn>), ExportError> {
    let schema = ensure_exportable(frame)?;
    let path = io_utils::script_path(output_base);
    let io_error = |step: IoStep, source: io::Error| ExportError::Io {
        step,
        path: path.clone(),
        source,
    };
    let mut writer =
        io_utils::create_output_file(&path).map_err(|err| io_error(IoStep::CreateFile, err))?;
    for column in &schema {
        writeln!(writer, "{} {}", column.name, column.sql_type)
            .map_err(|err| io_error(IoStep::WriteSchema, err))?;
    }
    writer.flush().map_err(|err| io_error(IoStep::Flush, err))?;
    info!("Wrote {} column definition(s) to {:?}", schema.len(), path);
    Ok((path, schema))
}

/// Dispatches on [`ExportOptions::mode`].
pub fn export(frame: &DataFrame, options: &ExportOptions) -> Result<PathBuf, ExportError> {
    match options.mode {
        OutputMode::Script => export_as_sql(frame, &options.table_name, &options.output_base),
        OutputMode::Columns => export_columns(frame, &options.output_base).map(|(path, _)| path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dtype::Dtype, frame::Column};

    fn songs() -> DataFrame {
        DataFrame::from_columns(vec![
            Column::new(
                "Track Name",
                Dtype::String,
                vec![Value::String("A".into()), Value::String("B".into())],
            ),
            Column::new(
                "Streams",
                Dtype::Int64,
                vec![Value::Integer(100), Value::Integer(200)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn every_supported_tag_maps_to_its_sql_type() {
        for (tag, expected) in TYPE_MAPPINGS {
            let schema = derive_schema(&[ColumnDescriptor::new("col", *tag)]).unwrap();
            assert_eq!(schema.len(), 1);
            assert_eq!(schema[0].sql_type, *expected);
        }
    }

    #[test]
    fn tag_lookup_ignores_case() {
        assert_eq!(sql_type_for("DOUBLE"), Some("DOUBLE"));
        assert_eq!(sql_type_for("Int64"), Some("BIGINT"));
        assert_eq!(sql_type_for("int32"), None);
    }

    #[test]
    fn unmapped_dtype_is_dropped_then_rejected() {
        let columns = vec![
            ColumnDescriptor::new("Artist", "object"),
            ColumnDescriptor::new("Genre", "category"),
        ];
        assert_eq!(map_columns(&columns).len(), 1);
        match derive_schema(&columns) {
            Err(ExportError::SchemaMismatch {
                processed,
                fetched,
                unmapped,
            }) => {
                assert_eq!(processed, 2);
                assert_eq!(fetched, 1);
                assert_eq!(unmapped, vec!["Genre (category)".to_string()]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn names_are_normalized_for_sql() {
        assert_eq!(normalize_column_name("Track Name"), "track_name");
        assert_eq!(normalize_column_name("artist(s)_name"), "artist(s)_name");
        assert_eq!(normalize_column_name("In Spotify Playlists"), "in_spotify_playlists");
    }

    #[test]
    fn create_table_renders_comma_separated_definitions() {
        let schema = derive_schema(&songs().descriptors()).unwrap();
        assert_eq!(
            render_create_table("songs", &schema),
            "CREATE TABLE songs (\ntrack_name VARCHAR(255),\nstreams BIGINT\n);\n"
        );
    }

    #[test]
    fn create_table_without_columns_is_degenerate() {
        assert_eq!(render_create_table("t", &[]), "CREATE TABLE t (\n);\n");
    }

    #[test]
    fn insert_statement_terminates_last_row_with_semicolon() {
        let rows = vec![
            vec![Value::String("A".into()), Value::Integer(100)],
            vec![Value::String("B".into()), Value::Integer(200)],
        ];
        assert_eq!(
            render_insert_statements("songs", &rows),
            "INSERT INTO songs VALUES \n('A', 100),\n('B', 200);"
        );
        assert_eq!(render_insert_statements("songs", &[]), "");
    }

    #[test]
    fn script_matches_expected_layout() {
        let script = render_script(&songs(), "songs").unwrap();
        assert_eq!(
            script,
            "CREATE TABLE songs (\ntrack_name VARCHAR(255),\nstreams BIGINT\n);\n\nINSERT INTO songs VALUES \n('A', 100),\n('B', 200);"
        );
    }

    #[test]
    fn streaming_writer_matches_rendered_statement() {
        let frame = songs();
        let rows: Vec<Vec<Value>> = frame.rows().collect();
        let mut buffer = Vec::new();
        let written = write_insert_statements(&mut buffer, "songs", frame.rows()).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            render_insert_statements("songs", &rows)
        );
    }

    #[test]
    fn generate_honours_output_mode() {
        let frame = songs();
        match generate(&frame, "songs", OutputMode::Columns).unwrap() {
            SqlOutput::Columns(columns) => {
                assert_eq!(columns[0].name, "track_name");
                assert_eq!(columns[1].sql_type, "BIGINT");
            }
            other => panic!("expected columns, got {other:?}"),
        }
        assert!(matches!(
            generate(&frame, "songs", OutputMode::Script).unwrap(),
            SqlOutput::Script(_)
        ));
    }

    #[test]
    fn generate_applies_export_checks_in_both_modes() {
        let empty = DataFrame::from_columns(Vec::new()).unwrap();
        for mode in [OutputMode::Script, OutputMode::Columns] {
            assert!(matches!(
                generate(&empty, "t", mode),
                Err(ExportError::EmptySchema)
            ));
        }

        let gaps = DataFrame::from_columns(vec![Column::new(
            "score",
            Dtype::Float64,
            vec![Value::Float(1.5), Value::Null],
        )])
        .unwrap();
        assert!(matches!(
            generate(&gaps, "t", OutputMode::Script),
            Err(ExportError::UncleanData { .. })
        ));
    }

    #[test]
    fn export_options_default_to_placeholder_names() {
        let options = ExportOptions::default();
        assert_eq!(options.table_name, "tableXyz");
        assert_eq!(options.mode, OutputMode::Script);
        assert_eq!(options.output_base, PathBuf::from("Output"));
    }
}
