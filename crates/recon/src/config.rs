use std::collections::HashSet;
use std::fmt::Write;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{FieldType, ReconciliationField};
use crate::normalize::Normalizer;
use crate::registry::{default_fields, FieldRegistry, LOAN_ID_FIELD};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default)]
    pub performed_by: Option<String>,
    /// Seed the registry with the standard field set before applying `fields`.
    #[serde(default = "default_true")]
    pub include_defaults: bool,
    #[serde(default)]
    pub dates: DateConfig,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Extra chrono layouts, tried after the built-in ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateConfig {
    #[serde(default)]
    pub formats: Vec<String>,
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A field definition. An `id` that matches a default field overrides it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub id: String,
    pub label: String,
    pub platform_key: String,
    pub bank_key: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl From<&FieldConfig> for ReconciliationField {
    fn from(f: &FieldConfig) -> Self {
        ReconciliationField {
            id: f.id.clone(),
            label: f.label.clone(),
            platform_key: f.platform_key.clone(),
            bank_key: f.bank_key.clone(),
            enabled: f.enabled,
            field_type: f.field_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        let mut ids = HashSet::new();
        for f in &self.fields {
            if f.id.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "field '{}': id must not be empty",
                    f.label
                )));
            }
            if !ids.insert(f.id.as_str()) {
                return Err(ReconError::DuplicateFieldId(f.id.clone()));
            }
            if f.id == LOAN_ID_FIELD && !f.enabled {
                return Err(ReconError::JoinKeyDisabled);
            }
        }

        // A layout that cannot produce a date would silently never match.
        if let Some(probe) = NaiveDate::from_ymd_opt(2000, 1, 31) {
            for fmt in &self.dates.formats {
                let mut rendered = String::new();
                let roundtrips = write!(rendered, "{}", probe.format(fmt)).is_ok()
                    && NaiveDate::parse_from_str(&rendered, fmt).ok() == Some(probe);
                if !roundtrips {
                    return Err(ReconError::ConfigValidation(format!(
                        "date format '{fmt}' does not describe a full calendar date"
                    )));
                }
            }
        }

        self.registry().snapshot().validate()
    }

    /// Build the Field Mapping Registry described by this config.
    pub fn registry(&self) -> FieldRegistry {
        let mut fields = if self.include_defaults {
            default_fields()
        } else {
            Vec::new()
        };

        for f in &self.fields {
            let field = ReconciliationField::from(f);
            match fields.iter_mut().find(|existing| existing.id == f.id) {
                Some(existing) => *existing = field,
                None => fields.push(field),
            }
        }

        FieldRegistry::from_fields(fields)
            .with_normalizer(Normalizer::with_date_formats(self.dates.formats.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Acme Lending monthly close"
performed_by = "ops@acme.test"

[dates]
formats = ["%d.%m.%Y"]

[[fields]]
id = "status"
label = "Loan Status"
platform_key = "status"
bank_key = "loan_state"
type = "text"

[[fields]]
id = "branch"
label = "Branch"
platform_key = "branch"
bank_key = "branch_code"
type = "text"
enabled = false
"#;

    #[test]
    fn parse_valid() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.performed_by.as_deref(), Some("ops@acme.test"));
        assert!(config.include_defaults);
        assert_eq!(config.fields.len(), 2);
        assert!(config.fields[0].enabled);
        assert!(!config.fields[1].enabled);
    }

    #[test]
    fn registry_overrides_defaults_and_appends_custom() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        let reg = config.registry();
        assert_eq!(reg.fields().len(), default_fields().len() + 1);
        let status = reg.get("status").unwrap();
        assert_eq!(status.label, "Loan Status");
        assert_eq!(status.bank_key, "loan_state");
        assert!(!reg.get("branch").unwrap().enabled);

        let snap = reg.snapshot();
        assert_eq!(snap.normalizer().date_formats().to_vec(), vec!["%d.%m.%Y".to_string()]);
    }

    #[test]
    fn without_defaults_keeps_join_key() {
        let input = r#"
name = "Minimal"
include_defaults = false

[[fields]]
id = "principal"
label = "Principal Amount"
platform_key = "principalAmount"
bank_key = "principal"
type = "currency"
"#;
        let reg = ReconConfig::from_toml(input).unwrap().registry();
        let ids: Vec<&str> = reg.fields().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["loanId", "principal"]);
    }

    #[test]
    fn reject_duplicate_ids() {
        let input = r#"
name = "Dup"

[[fields]]
id = "x"
label = "X"
platform_key = "a"
bank_key = "a"
type = "text"

[[fields]]
id = "x"
label = "X2"
platform_key = "b"
bank_key = "b"
type = "text"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate field id"));
    }

    #[test]
    fn reject_blank_keys() {
        let input = r#"
name = "Blank"

[[fields]]
id = "x"
label = "X"
platform_key = "a"
bank_key = ""
type = "number"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("bank key is blank"));
    }

    #[test]
    fn reject_disabled_join_key() {
        let input = r#"
name = "No join"

[[fields]]
id = "loanId"
label = "Loan ID"
platform_key = "id"
bank_key = "loanId"
type = "text"
enabled = false
"#;
        assert!(matches!(
            ReconConfig::from_toml(input),
            Err(ReconError::JoinKeyDisabled)
        ));
    }

    #[test]
    fn reject_unknown_type() {
        let input = r#"
name = "Bad type"

[[fields]]
id = "x"
label = "X"
platform_key = "a"
bank_key = "a"
type = "percent"
"#;
        assert!(matches!(
            ReconConfig::from_toml(input),
            Err(ReconError::ConfigParse(_))
        ));
    }

    #[test]
    fn reject_partial_date_format() {
        let input = r#"
name = "Bad dates"

[dates]
formats = ["%m/%Y"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("%m/%Y"));
    }
}
