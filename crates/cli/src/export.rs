//! `lrecon export`: re-render a saved reconciliation result.
//!
//! Reads the JSON written by `lrecon run --output` and writes it as JSON,
//! CSV or XLSX. The format comes from `--to`, else the destination extension.

use std::path::PathBuf;

use loan_recon::export::{export, from_json, ExportFormat};

use crate::exit_codes::EXIT_INPUT;
use crate::CliError;

pub fn cmd_export(result: PathBuf, output: PathBuf, to: Option<String>) -> Result<(), CliError> {
    let format = match to {
        Some(ref name) => name.parse::<ExportFormat>().map_err(CliError::args)?,
        None => ExportFormat::from_path(&output).ok_or_else(|| {
            CliError::args(format!("cannot infer export format from {}", output.display()))
                .with_hint("pass --to json|csv|xlsx")
        })?,
    };

    let text = std::fs::read_to_string(&result)
        .map_err(|e| CliError::new(EXIT_INPUT, format!("cannot read {}: {e}", result.display())))?;
    let outcome = from_json(&text)?;

    tracing::debug!("exporting {} results as {:?}", outcome.results.len(), format);
    export(&outcome, format, &output)?;

    eprintln!(
        "exported {} result(s) from '{}' to {}",
        outcome.results.len(),
        outcome.meta.config_name,
        output.display()
    );
    Ok(())
}
