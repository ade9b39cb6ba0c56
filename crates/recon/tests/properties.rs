// Property-based tests for the reconciler.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeSet, HashMap, HashSet};

use loan_recon::model::{
    BankRecord, Discrepancy, FieldType, PlatformLoanRecord, RawValue, ReconStatus,
};
use loan_recon::normalize::normalize;
use loan_recon::reconcile;
use loan_recon::registry::{FieldRegistry, FieldSnapshot};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small id space so bank and platform sides overlap and repeat.
fn arb_id() -> impl Strategy<Value = String> {
    (0u8..12).prop_map(|n| format!("L{n}"))
}

/// An amount as either side might carry it: number, formatted text, null,
/// junk, or absent.
fn arb_amount() -> impl Strategy<Value = Option<RawValue>> {
    prop_oneof![
        4 => (0i64..5).prop_map(|n| Some(RawValue::Number((n * 1000) as f64))),
        2 => (0i64..5).prop_map(|n| Some(RawValue::Text(format!("{},000.00", n)))),
        1 => Just(Some(RawValue::Null)),
        1 => Just(Some(RawValue::from("n/a"))),
        1 => Just(None),
    ]
}

fn arb_status() -> impl Strategy<Value = Option<RawValue>> {
    prop_oneof![
        4 => prop::sample::select(vec!["active", " Active", "ACTIVE ", "closed"])
            .prop_map(|s| Some(RawValue::from(s))),
        1 => Just(None),
    ]
}

fn arb_bank() -> impl Strategy<Value = BankRecord> {
    (arb_id(), arb_amount(), arb_status()).prop_map(|(id, principal, status)| {
        let mut rec = BankRecord::new(id);
        if let Some(v) = principal {
            rec.attributes.insert("principalAmount".into(), v);
        }
        if let Some(v) = status {
            rec.attributes.insert("status".into(), v);
        }
        rec
    })
}

fn arb_loan() -> impl Strategy<Value = PlatformLoanRecord> {
    (arb_id(), arb_amount(), arb_status()).prop_map(|(id, principal, status)| {
        let mut loan = PlatformLoanRecord::new(id, "C1");
        loan.principal_amount = principal;
        loan.status = status;
        loan
    })
}

fn registry() -> (FieldRegistry, String) {
    let mut reg = FieldRegistry::from_fields(vec![]);
    let principal = reg.add_field(
        "Principal Amount",
        "principalAmount",
        "principalAmount",
        FieldType::Currency,
    );
    reg.add_field("Status", "status", "status", FieldType::Text);
    (reg, principal.id)
}

/// Field-by-field expectation for one joined pair, built straight from the
/// normalizer rather than from the reconciler.
fn expected_discrepancies(
    loan: &PlatformLoanRecord,
    bank: &BankRecord,
    snapshot: &FieldSnapshot,
) -> Vec<Discrepancy> {
    let mut out = Vec::new();
    for field in snapshot.enabled() {
        let platform_value = loan.attribute(&field.platform_key);
        let bank_value = bank.attribute(&field.bank_key);
        if normalize(platform_value.as_ref(), field.field_type)
            != normalize(bank_value.as_ref(), field.field_type)
        {
            out.push(Discrepancy {
                field: field.label.clone(),
                field_id: field.id.clone(),
                platform_value,
                bank_value,
            });
        }
    }
    out
}

fn plain_text(value: Option<RawValue>) -> Option<String> {
    match value {
        Some(RawValue::Text(s)) => Some(s.trim().to_lowercase()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn one_result_per_distinct_loan_id(
        bank in prop::collection::vec(arb_bank(), 0..20),
        loans in prop::collection::vec(arb_loan(), 0..20),
    ) {
        let (reg, _) = registry();
        let results = reconcile(&bank, &loans, &reg.snapshot());

        let expected: BTreeSet<&str> = bank
            .iter()
            .map(|b| b.loan_id.as_str())
            .chain(loans.iter().map(|l| l.id.as_str()))
            .collect();
        let produced: Vec<&str> = results.iter().map(|r| r.loan_id.as_str()).collect();
        let unique: BTreeSet<&str> = produced.iter().copied().collect();

        prop_assert_eq!(produced.len(), unique.len(), "duplicate loan ids in output");
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn statuses_agree_with_sides(
        bank in prop::collection::vec(arb_bank(), 0..20),
        loans in prop::collection::vec(arb_loan(), 0..20),
    ) {
        let (reg, _) = registry();
        let results = reconcile(&bank, &loans, &reg.snapshot());

        let bank_ids: HashSet<&str> = bank.iter().map(|b| b.loan_id.as_str()).collect();
        let loan_ids: HashSet<&str> = loans.iter().map(|l| l.id.as_str()).collect();

        for r in &results {
            let in_bank = bank_ids.contains(r.loan_id.as_str());
            let in_platform = loan_ids.contains(r.loan_id.as_str());
            match r.status {
                ReconStatus::MissingPlatform => {
                    prop_assert!(in_bank && !in_platform);
                    prop_assert!(r.discrepancies.is_empty());
                }
                ReconStatus::MissingBank => {
                    prop_assert!(!in_bank && in_platform);
                    prop_assert!(r.discrepancies.is_empty());
                }
                ReconStatus::Matched => {
                    prop_assert!(in_bank && in_platform);
                    prop_assert!(r.discrepancies.is_empty());
                }
                ReconStatus::Discrepancy => {
                    prop_assert!(in_bank && in_platform);
                    prop_assert!(!r.discrepancies.is_empty());
                }
            }
        }
    }

    #[test]
    fn discrepancies_are_exactly_the_differing_fields(
        bank in prop::collection::vec(arb_bank(), 0..20),
        loans in prop::collection::vec(arb_loan(), 0..20),
    ) {
        let (reg, _) = registry();
        let snap = reg.snapshot();
        let results = reconcile(&bank, &loans, &snap);

        // First occurrence wins on both sides.
        let mut first_bank: HashMap<&str, &BankRecord> = HashMap::new();
        for b in &bank {
            first_bank.entry(b.loan_id.as_str()).or_insert(b);
        }
        let mut first_loan: HashMap<&str, &PlatformLoanRecord> = HashMap::new();
        for l in &loans {
            first_loan.entry(l.id.as_str()).or_insert(l);
        }

        for r in &results {
            let (Some(b), Some(l)) =
                (first_bank.get(r.loan_id.as_str()), first_loan.get(r.loan_id.as_str()))
            else {
                continue;
            };
            let expected = expected_discrepancies(l, b, &snap);
            let expected_status = if expected.is_empty() {
                ReconStatus::Matched
            } else {
                ReconStatus::Discrepancy
            };
            prop_assert_eq!(r.status, expected_status);
            prop_assert_eq!(&r.discrepancies, &expected);

            // Status text differing only in case or padding never mismatches.
            let bank_status = plain_text(b.attribute("status"));
            if bank_status.is_some() && bank_status == plain_text(l.attribute("status")) {
                prop_assert!(r.discrepancies.iter().all(|d| d.field != "Status"));
            }
        }
    }

    #[test]
    fn rerun_is_identical(
        bank in prop::collection::vec(arb_bank(), 0..20),
        loans in prop::collection::vec(arb_loan(), 0..20),
    ) {
        let (reg, _) = registry();
        let snap = reg.snapshot();
        let first = serde_json::to_string(&reconcile(&bank, &loans, &snap)).unwrap();
        let second = serde_json::to_string(&reconcile(&bank, &loans, &snap)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn disabling_a_field_only_affects_pairs_it_drove(
        bank in prop::collection::vec(arb_bank(), 0..20),
        loans in prop::collection::vec(arb_loan(), 0..20),
    ) {
        let (mut reg, principal_id) = registry();
        let before = reconcile(&bank, &loans, &reg.snapshot());
        reg.toggle_enabled(&principal_id);
        let after = reconcile(&bank, &loans, &reg.snapshot());

        prop_assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            prop_assert_eq!(&b.loan_id, &a.loan_id);
            let only_principal = b.status == ReconStatus::Discrepancy
                && b.discrepancies.iter().all(|d| d.field == "Principal Amount");
            if only_principal {
                prop_assert_eq!(a.status, ReconStatus::Matched);
            } else {
                prop_assert_eq!(a.status, b.status);
            }
            prop_assert!(a.discrepancies.iter().all(|d| d.field != "Principal Amount"));
        }
    }
}
