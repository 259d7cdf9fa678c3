use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::sql::{DEFAULT_OUTPUT_BASE, DEFAULT_TABLE_NAME, OutputMode};

#[derive(Debug, Parser)]
#[command(author, version, about = "Convert CSV files into MySQL table scripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize columns, dtypes and null counts of a CSV file
    Info(InfoArgs),
    /// Print the SQL column types inferred for a CSV file
    Schema(SchemaArgs),
    /// Write a CREATE TABLE + INSERT INTO script for a CSV file
    Export(ExportArgs),
}

/// Options shared by every command that loads a CSV file.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Input CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8, e.g. latin-1)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Drop every row containing na/null values before other steps
    #[arg(long)]
    pub clean: bool,
    /// Narrow column dtypes automatically (requires a table without nulls)
    #[arg(long = "auto-convert")]
    pub auto_convert: bool,
    /// Cast a column using `column:dtype` (string, int32, int64, bool, float64, float32, float, object, datetime, category)
    #[arg(long = "cast", action = clap::ArgAction::Append)]
    pub casts: Vec<String>,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Emit the column/type pairs as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Name of the generated table
    #[arg(short = 't', long = "table", default_value = DEFAULT_TABLE_NAME)]
    pub table: String,
    /// Output path without extension; `.txt` is appended
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT_BASE)]
    pub output: PathBuf,
    /// What to write: column/type pairs or the full script
    #[arg(long = "mode", value_enum, default_value_t = OutputMode::Script)]
    pub mode: OutputMode,
    /// Print the script to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

/// Splits a `column:dtype` directive at its last colon so column names may
/// contain colons themselves.
pub fn parse_cast(value: &str) -> Result<(String, String), String> {
    let (column, dtype) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("Cast '{value}' must use the form column:dtype"))?;
    let column = column.trim();
    let dtype = dtype.trim();
    if column.is_empty() || dtype.is_empty() {
        return Err(format!("Cast '{value}' must use the form column:dtype"));
    }
    Ok((column.to_string(), dtype.to_string()))
}
