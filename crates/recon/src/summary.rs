use crate::model::{ReconStatus, ReconSummary, ReconciliationResult};

/// Tally results per status.
pub fn compute_summary(results: &[ReconciliationResult]) -> ReconSummary {
    let mut summary = ReconSummary {
        total: results.len(),
        ..ReconSummary::default()
    };

    for r in results {
        match r.status {
            ReconStatus::Matched => summary.matched += 1,
            ReconStatus::Discrepancy => summary.discrepancies += 1,
            ReconStatus::MissingPlatform => summary.missing_platform += 1,
            ReconStatus::MissingBank => summary.missing_bank += 1,
        }
    }

    summary
}
