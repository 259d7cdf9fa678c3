use anyhow::Result;
use log::{info, warn};

use crate::{cli::InfoArgs, load_source, table};

pub fn execute(args: &InfoArgs) -> Result<()> {
    let frame = load_source(&args.source)?;
    print!(
        "{}",
        table::render_summary(&frame.summary(), frame.row_count())
    );

    let unclean = frame.null_column_count();
    if unclean > 0 {
        warn!(
            "{} column(s) contain na/null values and must be cleaned before export",
            unclean
        );
    }
    info!(
        "Summarized {} column(s) from {:?}",
        frame.column_count(),
        args.source.input
    );
    Ok(())
}
