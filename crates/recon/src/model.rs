use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field definitions
// ---------------------------------------------------------------------------

/// Comparison type of a reconciliation field. Governs normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Currency,
    Date,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.pad("text"),
            Self::Number => f.pad("number"),
            Self::Currency => f.pad("currency"),
            Self::Date => f.pad("date"),
        }
    }
}

/// One comparable attribute: how the platform side and the bank side expose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationField {
    pub id: String,
    pub label: String,
    pub platform_key: String,
    pub bank_key: String,
    pub enabled: bool,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

// ---------------------------------------------------------------------------
// Raw values
// ---------------------------------------------------------------------------

/// An unnormalized attribute value as supplied by either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            // Integral amounts print without a trailing ".0"
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// Attribute name under which a bank record exposes its join key.
pub const BANK_LOAN_ID_KEY: &str = "loanId";

/// One row from the external bank source.
///
/// Only `loan_id` is structural; every other attribute lives in `attributes`
/// and is resolved through a field's `bank_key` at comparison time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRecord {
    pub loan_id: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, RawValue>,
}

impl BankRecord {
    pub fn new(loan_id: impl Into<String>) -> Self {
        Self {
            loan_id: loan_id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Resolve an attribute by its bank-side key. Null reads as absent.
    pub fn attribute(&self, key: &str) -> Option<RawValue> {
        if key == BANK_LOAN_ID_KEY {
            return Some(RawValue::Text(self.loan_id.clone()));
        }
        present(self.attributes.get(key))
    }
}

/// One internal loan, already joined to its client for display.
///
/// Only `id` and `client_id` are structural. The loan attributes may be
/// absent or null (an undisbursed loan has no disbursement date) and are kept
/// as supplied; normalization happens at comparison time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformLoanRecord {
    pub id: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_amount: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disbursement_date: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outstanding_balance: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RawValue>,
    /// Custom attributes reachable through a field's `platform_key`.
    #[serde(flatten)]
    pub extra: BTreeMap<String, RawValue>,
}

impl PlatformLoanRecord {
    pub fn new(id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client_id: client_id.into(),
            client_name: None,
            principal_amount: None,
            disbursement_date: None,
            outstanding_balance: None,
            status: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a loan attribute by its platform-side key. Unknown keys become
    /// custom attributes.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        let key = key.into();
        let slot = match key.as_str() {
            "principalAmount" => &mut self.principal_amount,
            "disbursementDate" => &mut self.disbursement_date,
            "outstandingBalance" => &mut self.outstanding_balance,
            "status" => &mut self.status,
            _ => {
                self.extra.insert(key, value.into());
                return;
            }
        };
        *slot = Some(value.into());
    }

    /// Resolve an attribute by its platform-side key. Typed attributes take
    /// precedence over custom ones of the same name; null reads as absent.
    pub fn attribute(&self, key: &str) -> Option<RawValue> {
        match key {
            "id" => Some(RawValue::Text(self.id.clone())),
            "clientId" => Some(RawValue::Text(self.client_id.clone())),
            "clientName" => self.client_name.clone().map(RawValue::Text),
            "principalAmount" => present(self.principal_amount.as_ref()),
            "disbursementDate" => present(self.disbursement_date.as_ref()),
            "outstandingBalance" => present(self.outstanding_balance.as_ref()),
            "status" => present(self.status.as_ref()),
            other => present(self.extra.get(other)),
        }
    }
}

fn present(value: Option<&RawValue>) -> Option<RawValue> {
    value.filter(|v| **v != RawValue::Null).cloned()
}

/// Pre-loaded records for one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub bank_records: Vec<BankRecord>,
    pub platform_loans: Vec<PlatformLoanRecord>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconStatus {
    Matched,
    Discrepancy,
    MissingPlatform,
    MissingBank,
}

impl ReconStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matched => "matched",
            Self::Discrepancy => "discrepancy",
            Self::MissingPlatform => "missing-platform",
            Self::MissingBank => "missing-bank",
        }
    }
}

impl fmt::Display for ReconStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ReconStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matched" => Ok(Self::Matched),
            "discrepancy" => Ok(Self::Discrepancy),
            "missing-platform" => Ok(Self::MissingPlatform),
            "missing-bank" => Ok(Self::MissingBank),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// A field whose normalized values differ. Values are kept raw for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub field: String,
    pub field_id: String,
    pub platform_value: Option<RawValue>,
    pub bank_value: Option<RawValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub loan_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub status: ReconStatus,
    pub discrepancies: Vec<Discrepancy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ReconciliationResult {
    pub fn new(loan_id: impl Into<String>, status: ReconStatus) -> Self {
        Self {
            loan_id: loan_id.into(),
            client_name: None,
            status,
            discrepancies: Vec::new(),
            notes: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconSummary {
    pub total: usize,
    pub matched: usize,
    pub discrepancies: usize,
    pub missing_platform: usize,
    pub missing_bank: usize,
}

impl ReconSummary {
    /// True when any loan did not reconcile cleanly.
    pub fn has_exceptions(&self) -> bool {
        self.discrepancies + self.missing_platform + self.missing_bank > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub bank_records: usize,
    pub platform_loans: usize,
    pub enabled_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_bank_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub duplicate_platform_ids: Vec<String>,
}

/// Everything one run produces. Owned by the caller; nothing is global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconOutcome {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub results: Vec<ReconciliationResult>,
}

impl ReconOutcome {
    pub fn get(&self, loan_id: &str) -> Option<&ReconciliationResult> {
        self.results.iter().find(|r| r.loan_id == loan_id)
    }

    pub fn by_status(&self, status: ReconStatus) -> impl Iterator<Item = &ReconciliationResult> {
        self.results.iter().filter(move |r| r.status == status)
    }

    /// Case-insensitive substring search on loan identifiers.
    pub fn search<'a>(&'a self, fragment: &str) -> impl Iterator<Item = &'a ReconciliationResult> {
        let needle = fragment.trim().to_lowercase();
        self.results
            .iter()
            .filter(move |r| r.loan_id.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_value_display() {
        assert_eq!(RawValue::Number(50000.0).to_string(), "50000");
        assert_eq!(RawValue::Number(12.5).to_string(), "12.5");
        assert_eq!(RawValue::Null.to_string(), "null");
        assert_eq!(RawValue::from("Active").to_string(), "Active");
    }

    #[test]
    fn bank_record_from_json_keeps_open_attributes() {
        let rec: BankRecord = serde_json::from_str(
            r#"{"loanId":"L1","principalAmount":50000,"status":"active","memo":null}"#,
        )
        .unwrap();
        assert_eq!(rec.loan_id, "L1");
        assert_eq!(rec.attribute("principalAmount"), Some(RawValue::Number(50000.0)));
        assert_eq!(rec.attributes.get("memo"), Some(&RawValue::Null));
        assert_eq!(rec.attribute("memo"), None);
        assert_eq!(rec.attribute("loanId"), Some(RawValue::from("L1")));
        assert_eq!(rec.attribute("nope"), None);
    }

    #[test]
    fn platform_attribute_resolves_typed_then_custom() {
        let loan = PlatformLoanRecord::new("L1", "C1")
            .with("branch", "North")
            .with("principalAmount", 1000.0);
        assert_eq!(loan.principal_amount, Some(RawValue::Number(1000.0)));
        assert_eq!(loan.attribute("principalAmount"), Some(RawValue::Number(1000.0)));
        assert_eq!(loan.attribute("branch"), Some(RawValue::from("North")));
        assert_eq!(loan.attribute("clientName"), None);
    }

    #[test]
    fn platform_loan_tolerates_null_and_text_attributes() {
        let loan: PlatformLoanRecord = serde_json::from_str(
            r#"{
                "id": "L7",
                "clientId": "C1",
                "principalAmount": "1000.00",
                "disbursementDate": null,
                "status": "pending"
            }"#,
        )
        .unwrap();
        assert_eq!(loan.attribute("principalAmount"), Some(RawValue::from("1000.00")));
        assert_eq!(loan.attribute("disbursementDate"), None);
        assert_eq!(loan.attribute("outstandingBalance"), None);
        assert_eq!(loan.attribute("status"), Some(RawValue::from("pending")));
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&ReconStatus::MissingPlatform).unwrap();
        assert_eq!(json, "\"missing-platform\"");
        assert_eq!("missing-bank".parse::<ReconStatus>().unwrap(), ReconStatus::MissingBank);
    }

    #[test]
    fn search_is_case_insensitive() {
        let outcome = ReconOutcome {
            meta: ReconMeta {
                config_name: "t".into(),
                engine_version: "0".into(),
                bank_records: 0,
                platform_loans: 0,
                enabled_fields: vec![],
                duplicate_bank_ids: vec![],
                duplicate_platform_ids: vec![],
            },
            summary: ReconSummary::default(),
            results: vec![
                ReconciliationResult::new("LN-100", ReconStatus::Matched),
                ReconciliationResult::new("LN-200", ReconStatus::MissingBank),
            ],
        };
        assert_eq!(outcome.search("ln-1").count(), 1);
        assert_eq!(outcome.by_status(ReconStatus::MissingBank).count(), 1);
        assert!(outcome.get("LN-200").is_some());
    }
}
