//! Output mode 1: the inferred `(column, SQL type)` pairs without any rows.

use anyhow::{Context, Result};
use log::info;

use crate::{cli::SchemaArgs, load_source, sql, table};

pub fn execute(args: &SchemaArgs) -> Result<()> {
    let frame = load_source(&args.source)?;
    let columns = sql::derive_schema(&frame.descriptors())
        .with_context(|| format!("Inferring SQL types for {:?}", args.source.input))?;

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&columns).context("Serializing column types")?;
        println!("{rendered}");
    } else {
        print!("{}", table::render_sql_columns(&columns));
    }
    info!("Mapped {} column(s) to SQL types", columns.len());
    Ok(())
}
