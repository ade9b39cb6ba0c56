//! Loading pre-parsed record collections.
//!
//! Records arrive as JSON arrays produced by whatever ingestion step sits in
//! front of the engine. No bank statement layout is interpreted here.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::{BankRecord, PlatformLoanRecord};

/// Minimal client view needed to label platform loans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
}

fn from_json_array<T: DeserializeOwned>(input: &str, source: &str) -> Result<Vec<T>, ReconError> {
    serde_json::from_str(input).map_err(|e| ReconError::InputParse {
        source: source.into(),
        message: e.to_string(),
    })
}

pub fn bank_records_from_json(input: &str) -> Result<Vec<BankRecord>, ReconError> {
    from_json_array(input, "bank")
}

pub fn platform_loans_from_json(input: &str) -> Result<Vec<PlatformLoanRecord>, ReconError> {
    from_json_array(input, "platform loan")
}

pub fn clients_from_json(input: &str) -> Result<Vec<ClientRecord>, ReconError> {
    from_json_array(input, "client")
}

/// Fill `client_name` from the client list. Names already present are kept;
/// loans whose client is unknown stay unnamed. Returns how many were filled.
pub fn attach_client_names(loans: &mut [PlatformLoanRecord], clients: &[ClientRecord]) -> usize {
    let names: HashMap<&str, &str> = clients
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut filled = 0;
    for loan in loans.iter_mut().filter(|l| l.client_name.is_none()) {
        if let Some(name) = names.get(loan.client_id.as_str()) {
            loan.client_name = Some((*name).to_string());
            filled += 1;
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawValue;

    #[test]
    fn parse_platform_loans() {
        let loans = platform_loans_from_json(
            r#"[{
                "id": "L1",
                "clientId": "C1",
                "principalAmount": 50000,
                "disbursementDate": "2024-01-15",
                "outstandingBalance": 42000.5,
                "status": "active",
                "branch": "North"
            }]"#,
        )
        .unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].principal_amount, Some(RawValue::Number(50000.0)));
        assert_eq!(loans[0].client_name, None);
        assert_eq!(loans[0].attribute("branch"), Some(RawValue::from("North")));
    }

    #[test]
    fn bank_parse_error_names_source() {
        let err = bank_records_from_json(r#"[{"principalAmount": 1}]"#).unwrap_err();
        assert!(err.to_string().starts_with("cannot parse bank records"));
    }

    #[test]
    fn attach_names_keeps_existing() {
        let mut loans = vec![
            PlatformLoanRecord::new("L1", "C1"),
            PlatformLoanRecord::new("L2", "C2"),
            PlatformLoanRecord::new("L3", "C9"),
        ];
        loans[1].client_name = Some("Already Set".into());
        let clients = clients_from_json(
            r#"[{"id":"C1","name":"Ada Obi"},{"id":"C2","name":"Other"}]"#,
        )
        .unwrap();

        assert_eq!(attach_client_names(&mut loans, &clients), 1);
        assert_eq!(loans[0].client_name.as_deref(), Some("Ada Obi"));
        assert_eq!(loans[1].client_name.as_deref(), Some("Already Set"));
        assert_eq!(loans[2].client_name, None);
    }
}
