use std::collections::{HashMap, HashSet};

use crate::model::{
    BankRecord, Discrepancy, PlatformLoanRecord, ReconStatus, ReconciliationField,
    ReconciliationResult,
};
use crate::normalize::Normalizer;
use crate::registry::FieldSnapshot;

/// Join bank records to platform loans by loan identifier and classify every
/// identifier seen on either side.
///
/// Output order: bank records in input order, then platform loans absent from
/// the bank side in input order. A loan identifier appears once; repeated
/// bank rows or platform loans with an already-seen id are skipped.
pub fn reconcile(
    bank_records: &[BankRecord],
    platform_loans: &[PlatformLoanRecord],
    fields: &FieldSnapshot,
) -> Vec<ReconciliationResult> {
    let mut platform_by_id: HashMap<&str, &PlatformLoanRecord> =
        HashMap::with_capacity(platform_loans.len());
    for loan in platform_loans {
        platform_by_id.entry(loan.id.as_str()).or_insert(loan);
    }

    let enabled: Vec<&ReconciliationField> = fields.enabled().collect();
    let normalizer = fields.normalizer();

    let mut seen: HashSet<&str> = HashSet::with_capacity(bank_records.len());
    let mut results = Vec::with_capacity(bank_records.len() + platform_loans.len());

    for bank in bank_records {
        if !seen.insert(bank.loan_id.as_str()) {
            log::warn!("skipping repeated bank record for loan '{}'", bank.loan_id);
            continue;
        }

        let Some(loan) = platform_by_id.get(bank.loan_id.as_str()) else {
            results.push(ReconciliationResult::new(
                bank.loan_id.clone(),
                ReconStatus::MissingPlatform,
            ));
            continue;
        };

        let discrepancies = compare_fields(loan, bank, &enabled, normalizer);
        let status = if discrepancies.is_empty() {
            ReconStatus::Matched
        } else {
            ReconStatus::Discrepancy
        };

        results.push(ReconciliationResult {
            loan_id: bank.loan_id.clone(),
            client_name: loan.client_name.clone(),
            status,
            discrepancies,
            notes: None,
        });
    }

    for loan in platform_loans {
        if seen.insert(loan.id.as_str()) {
            let mut result = ReconciliationResult::new(loan.id.clone(), ReconStatus::MissingBank);
            result.client_name = loan.client_name.clone();
            results.push(result);
        }
    }

    results
}

/// Every field whose normalized platform and bank values differ, in field
/// order, carrying the raw values.
pub fn compare_fields(
    loan: &PlatformLoanRecord,
    bank: &BankRecord,
    fields: &[&ReconciliationField],
    normalizer: &Normalizer,
) -> Vec<Discrepancy> {
    fields
        .iter()
        .filter_map(|field| {
            let platform_value = loan.attribute(&field.platform_key);
            let bank_value = bank.attribute(&field.bank_key);

            let left = normalizer.normalize(platform_value.as_ref(), field.field_type);
            let right = normalizer.normalize(bank_value.as_ref(), field.field_type);

            (left != right).then(|| Discrepancy {
                field: field.label.clone(),
                field_id: field.id.clone(),
                platform_value,
                bank_value,
            })
        })
        .collect()
}

/// Identifiers occurring more than once, each reported once in first-repeat order.
pub fn duplicate_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut dups = Vec::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            dups.push(id.to_string());
        }
    }
    dups
}
