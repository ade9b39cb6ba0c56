//! Result serializers for operators and downstream tooling.
//!
//! Every format carries the full result: status, client name, notes, and
//! one entry per mismatched field with its raw platform and bank values.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::ReconError;
use crate::model::{RawValue, ReconOutcome, ReconciliationResult};

const CSV_HEADERS: [&str; 7] = [
    "loan_id",
    "client_name",
    "status",
    "field",
    "platform_value",
    "bank_value",
    "notes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Infer from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            other => Err(format!(
                "unsupported export format '{other}' (expected json, csv or xlsx)"
            )),
        }
    }
}

/// Write `outcome` to `path` in the given format.
///
/// Write failures are export errors, never input errors.
pub fn export(outcome: &ReconOutcome, format: ExportFormat, path: &Path) -> Result<(), ReconError> {
    let write_err =
        |e: std::io::Error| ReconError::Export(format!("cannot write {}: {e}", path.display()));
    match format {
        ExportFormat::Json => std::fs::write(path, to_json(outcome)?).map_err(write_err)?,
        ExportFormat::Csv => {
            let file = std::fs::File::create(path).map_err(write_err)?;
            write_csv(outcome, file)?;
        }
        ExportFormat::Xlsx => {
            let mut workbook = build_workbook(outcome)?;
            workbook
                .save(path)
                .map_err(|e| ReconError::Export(format!("cannot save XLSX: {e}")))?;
        }
    }
    log::info!("exported {} results to {}", outcome.results.len(), path.display());
    Ok(())
}

pub fn to_json(outcome: &ReconOutcome) -> Result<String, ReconError> {
    serde_json::to_string_pretty(outcome).map_err(|e| ReconError::Export(e.to_string()))
}

pub fn from_json(input: &str) -> Result<ReconOutcome, ReconError> {
    serde_json::from_str(input).map_err(|e| ReconError::InputParse {
        source: "reconciliation result".into(),
        message: e.to_string(),
    })
}

/// Flatten results into rows: one per discrepancy, or a single row with empty
/// field columns for results without discrepancies.
pub fn flat_rows(results: &[ReconciliationResult]) -> Vec<[String; 7]> {
    let mut rows = Vec::new();
    for r in results {
        let client = r.client_name.clone().unwrap_or_default();
        let notes = r.notes.clone().unwrap_or_default();
        if r.discrepancies.is_empty() {
            rows.push([
                r.loan_id.clone(),
                client,
                r.status.to_string(),
                String::new(),
                String::new(),
                String::new(),
                notes,
            ]);
            continue;
        }
        for d in &r.discrepancies {
            rows.push([
                r.loan_id.clone(),
                client.clone(),
                r.status.to_string(),
                d.field.clone(),
                display_raw(d.platform_value.as_ref()),
                display_raw(d.bank_value.as_ref()),
                notes.clone(),
            ]);
        }
    }
    rows
}

fn display_raw(value: Option<&RawValue>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

pub fn write_csv<W: Write>(outcome: &ReconOutcome, writer: W) -> Result<(), ReconError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let csv_err = |e: csv::Error| ReconError::Export(format!("CSV write error: {e}"));

    wtr.write_record(CSV_HEADERS).map_err(csv_err)?;
    for row in flat_rows(&outcome.results) {
        wtr.write_record(&row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| ReconError::Export(format!("CSV write error: {e}")))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// XLSX
// ---------------------------------------------------------------------------

fn xlsx_err(e: rust_xlsxwriter::XlsxError) -> ReconError {
    ReconError::Export(format!("XLSX write error: {e}"))
}

/// Two sheets: "Summary" (counts + run metadata) and "Results" (flat rows).
pub fn build_workbook(outcome: &ReconOutcome) -> Result<Workbook, ReconError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let summary = workbook.add_worksheet();
    summary.set_name("Summary").map_err(xlsx_err)?;
    write_summary_sheet(summary, outcome, &bold)?;

    let results = workbook.add_worksheet();
    results.set_name("Results").map_err(xlsx_err)?;
    write_results_sheet(results, outcome, &bold)?;

    Ok(workbook)
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    outcome: &ReconOutcome,
    bold: &Format,
) -> Result<(), ReconError> {
    let s = &outcome.summary;
    let counts: [(&str, usize); 7] = [
        ("Bank records", outcome.meta.bank_records),
        ("Platform loans", outcome.meta.platform_loans),
        ("Total loans", s.total),
        ("Matched", s.matched),
        ("Discrepancies", s.discrepancies),
        ("Missing in platform", s.missing_platform),
        ("Missing in bank", s.missing_bank),
    ];

    sheet
        .write_string_with_format(0, 0, "Reconciliation", bold)
        .map_err(xlsx_err)?;
    sheet
        .write_string(0, 1, outcome.meta.config_name.as_str())
        .map_err(xlsx_err)?;

    for (i, (label, count)) in counts.iter().enumerate() {
        let row = i as u32 + 2;
        sheet.write_string(row, 0, *label).map_err(xlsx_err)?;
        sheet.write_number(row, 1, *count as f64).map_err(xlsx_err)?;
    }
    sheet.set_column_width(0, 22).map_err(xlsx_err)?;
    Ok(())
}

fn write_results_sheet(
    sheet: &mut Worksheet,
    outcome: &ReconOutcome,
    bold: &Format,
) -> Result<(), ReconError> {
    for (col, header) in CSV_HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, bold)
            .map_err(xlsx_err)?;
    }
    for (i, row) in flat_rows(&outcome.results).iter().enumerate() {
        let r = i as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet
                    .write_string(r, col as u16, value.as_str())
                    .map_err(xlsx_err)?;
            }
        }
    }
    sheet.set_freeze_panes(1, 0).map_err(xlsx_err)?;
    Ok(())
}
