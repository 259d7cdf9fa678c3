pub mod cli;
pub mod data;
pub mod dtype;
pub mod error;
pub mod export;
pub mod frame;
pub mod info;
pub mod io_utils;
pub mod schema_cmd;
pub mod sql;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, SourceArgs},
    dtype::Dtype,
    frame::DataFrame,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_sqlgen", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Info(args) => info::execute(&args),
        Commands::Schema(args) => schema_cmd::execute(&args),
        Commands::Export(args) => export::execute(&args),
    }
}

/// Reads the input and applies `--clean`, `--cast` and `--auto-convert`, in
/// that order.
pub(crate) fn load_source(args: &SourceArgs) -> Result<DataFrame> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Loading '{}' with delimiter '{}' ({})",
        args.input.display(),
        io_utils::printable_delimiter(delimiter),
        encoding.name()
    );
    let mut frame = DataFrame::from_csv_path(&args.input, delimiter, encoding)
        .with_context(|| format!("Loading {:?}", args.input))?;

    if args.clean {
        let removed = frame.drop_null_rows();
        if removed == 0 {
            info!("Dataset is clear of any na/null values");
        }
    }

    for directive in &args.casts {
        let (column, dtype) = cli::parse_cast(directive).map_err(anyhow::Error::msg)?;
        let target: Dtype = dtype
            .parse()
            .with_context(|| format!("Parsing --cast '{directive}'"))?;
        frame
            .cast_column(&column, target)
            .with_context(|| format!("Applying --cast '{directive}'"))?;
        info!("Column '{column}' converted to {target}");
    }

    if args.auto_convert {
        let changes = frame
            .auto_convert()
            .context("Converting column dtypes automatically")?;
        for change in &changes {
            debug!(
                "Column '{}' converted from {} to {}",
                change.column, change.from, change.to
            );
        }
        info!("Datatype conversion changed {} column(s)", changes.len());
    }

    Ok(frame)
}
