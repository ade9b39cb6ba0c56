use crate::error::ReconError;
use crate::model::{ReconInput, ReconMeta, ReconOutcome};
use crate::reconcile::{duplicate_ids, reconcile};
use crate::registry::FieldSnapshot;
use crate::summary::compute_summary;

/// Validate the field snapshot, reconcile, and summarize.
///
/// The outcome carries no timestamps, so identical inputs and configuration
/// always serialize to identical output.
pub fn run(
    config_name: &str,
    fields: &FieldSnapshot,
    input: &ReconInput,
) -> Result<ReconOutcome, ReconError> {
    fields.validate()?;

    let results = reconcile(&input.bank_records, &input.platform_loans, fields);
    let summary = compute_summary(&results);

    let meta = ReconMeta {
        config_name: config_name.to_string(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        bank_records: input.bank_records.len(),
        platform_loans: input.platform_loans.len(),
        enabled_fields: fields.enabled().map(|f| f.id.clone()).collect(),
        duplicate_bank_ids: duplicate_ids(input.bank_records.iter().map(|b| b.loan_id.as_str())),
        duplicate_platform_ids: duplicate_ids(input.platform_loans.iter().map(|l| l.id.as_str())),
    };

    log::debug!(
        "reconciled {} bank records against {} platform loans: {} matched, \
         {} discrepancies, {} missing-platform, {} missing-bank",
        meta.bank_records,
        meta.platform_loans,
        summary.matched,
        summary.discrepancies,
        summary.missing_platform,
        summary.missing_bank,
    );

    Ok(ReconOutcome {
        meta,
        summary,
        results,
    })
}
