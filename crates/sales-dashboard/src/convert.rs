mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use sales_core::settings::ConvertArgs;
use sales_data::convert::convert_workbook;

fn main() -> Result<()> {
    let args = ConvertArgs::parse();
    logging::setup_logging(args.effective_log_level(), None)?;

    tracing::info!(
        input = %args.input.display(),
        sheet = %args.sheet,
        output = %args.output.display(),
        "converting workbook"
    );

    let summary = convert_workbook(&args.input, &args.sheet, &args.output)
        .with_context(|| format!("failed to convert {}", args.input.display()))?;

    println!(
        "Wrote {} rows to {}",
        summary.rows_written,
        summary.output.display()
    );
    if summary.dropped_rows > 0 {
        println!(
            "Dropped {} rows with months outside Apr-Oct",
            summary.dropped_rows
        );
    }
    if !summary.ignored_columns.is_empty() {
        println!("Ignored columns: {}", summary.ignored_columns.join(", "));
    }

    Ok(())
}
