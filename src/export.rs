//! Output mode 2: write the CREATE TABLE + INSERT INTO script.

use anyhow::{Context, Result, bail};
use log::info;

use crate::{
    cli::ExportArgs,
    error::Outcome,
    load_source,
    sql::{self, ExportOptions, OutputMode, SqlOutput},
};

pub fn execute(args: &ExportArgs) -> Result<()> {
    let frame = load_source(&args.source)?;

    if args.stdout {
        match sql::generate(&frame, &args.table, args.mode).context("Rendering script")? {
            SqlOutput::Script(script) => println!("{script}"),
            SqlOutput::Columns(columns) => {
                for column in columns {
                    println!("{} {}", column.name, column.sql_type);
                }
            }
        }
        return Ok(());
    }

    let options = ExportOptions {
        table_name: args.table.clone(),
        mode: args.mode,
        output_base: args.output.clone(),
    };
    let outcome = Outcome::from_result(sql::export(&frame, &options), |path| {
        let what = match options.mode {
            OutputMode::Script => "SQL script",
            OutputMode::Columns => "column list",
        };
        format!("File has been created successfully! ({what} at {})", path.display())
    });
    if !outcome.ok {
        bail!("{}", outcome.message);
    }
    info!("{}", outcome.message);
    Ok(())
}
