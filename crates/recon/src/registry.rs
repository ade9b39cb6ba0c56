//! Field Mapping Registry: the set of comparable fields for an organization.
//!
//! The registry is edited in place by its owner. A run never sees those edits
//! directly: it receives a [`FieldSnapshot`], an immutable copy taken at the
//! moment the run starts.
//!
//! Edits are total. An unknown field id is a no-op, and the core fields
//! (loan identifier, client name, client identifier) cannot be removed.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::ReconError;
use crate::model::{FieldType, ReconciliationField};
use crate::normalize::Normalizer;

pub const LOAN_ID_FIELD: &str = "loanId";
pub const CLIENT_NAME_FIELD: &str = "clientName";
pub const CLIENT_ID_FIELD: &str = "clientId";

/// Fields that can be edited or disabled but never removed.
pub const CORE_FIELDS: [&str; 3] = [LOAN_ID_FIELD, CLIENT_NAME_FIELD, CLIENT_ID_FIELD];

pub fn is_core_field(id: &str) -> bool {
    CORE_FIELDS.contains(&id)
}

fn field(
    id: &str,
    label: &str,
    platform_key: &str,
    bank_key: &str,
    field_type: FieldType,
    enabled: bool,
) -> ReconciliationField {
    ReconciliationField {
        id: id.into(),
        label: label.into(),
        platform_key: platform_key.into(),
        bank_key: bank_key.into(),
        enabled,
        field_type,
    }
}

/// The standard field set a new organization starts with.
pub fn default_fields() -> Vec<ReconciliationField> {
    vec![
        field(LOAN_ID_FIELD, "Loan ID", "id", "loanId", FieldType::Text, true),
        field(CLIENT_NAME_FIELD, "Client Name", "clientName", "clientName", FieldType::Text, true),
        field(CLIENT_ID_FIELD, "Client ID", "clientId", "clientId", FieldType::Text, false),
        field(
            "principalAmount",
            "Principal Amount",
            "principalAmount",
            "principalAmount",
            FieldType::Currency,
            true,
        ),
        field(
            "disbursementDate",
            "Disbursement Date",
            "disbursementDate",
            "disbursementDate",
            FieldType::Date,
            true,
        ),
        field(
            "outstandingBalance",
            "Outstanding Balance",
            "outstandingBalance",
            "outstandingBalance",
            FieldType::Currency,
            true,
        ),
        field("status", "Status", "status", "status", FieldType::Text, true),
    ]
}

/// Partial edit applied by [`FieldRegistry::update_field`].
#[derive(Debug, Clone, Default)]
pub struct FieldUpdate {
    pub label: Option<String>,
    pub platform_key: Option<String>,
    pub bank_key: Option<String>,
    pub field_type: Option<FieldType>,
}

#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<ReconciliationField>,
    normalizer: Normalizer,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::from_fields(default_fields())
    }
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from explicit definitions. The loan identifier field
    /// is added (enabled) if the list does not carry one.
    pub fn from_fields(mut fields: Vec<ReconciliationField>) -> Self {
        if !fields.iter().any(|f| f.id == LOAN_ID_FIELD) {
            let mut loan_id = default_fields().swap_remove(0);
            loan_id.enabled = true;
            fields.insert(0, loan_id);
        }
        Self {
            fields,
            normalizer: Normalizer::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn fields(&self) -> &[ReconciliationField] {
        &self.fields
    }

    pub fn get(&self, id: &str) -> Option<&ReconciliationField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Create and enable a custom field with a fresh id.
    pub fn add_field(
        &mut self,
        label: impl Into<String>,
        platform_key: impl Into<String>,
        bank_key: impl Into<String>,
        field_type: FieldType,
    ) -> ReconciliationField {
        let field = ReconciliationField {
            id: format!("custom_{}", Uuid::new_v4().simple()),
            label: label.into(),
            platform_key: platform_key.into(),
            bank_key: bank_key.into(),
            enabled: true,
            field_type,
        };
        log::debug!("added field '{}' ({})", field.label, field.id);
        self.fields.push(field.clone());
        field
    }

    /// Flip participation. The loan identifier field stays enabled.
    pub fn toggle_enabled(&mut self, id: &str) {
        if id == LOAN_ID_FIELD {
            log::warn!("ignoring attempt to disable the loan identifier field");
            return;
        }
        if let Some(f) = self.fields.iter_mut().find(|f| f.id == id) {
            f.enabled = !f.enabled;
        }
    }

    pub fn update_field(&mut self, id: &str, update: FieldUpdate) {
        let Some(f) = self.fields.iter_mut().find(|f| f.id == id) else {
            return;
        };
        if let Some(label) = update.label {
            f.label = label;
        }
        if let Some(key) = update.platform_key {
            f.platform_key = key;
        }
        if let Some(key) = update.bank_key {
            f.bank_key = key;
        }
        if let Some(t) = update.field_type {
            f.field_type = t;
        }
    }

    /// Delete a field definition. Returns the removed field, if any.
    pub fn remove_field(&mut self, id: &str) -> Option<ReconciliationField> {
        if is_core_field(id) {
            log::warn!("field '{id}' is a core field and cannot be removed");
            return None;
        }
        let pos = self.fields.iter().position(|f| f.id == id)?;
        Some(self.fields.remove(pos))
    }

    /// Immutable copy of the current configuration for one run.
    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            fields: self.fields.clone().into(),
            normalizer: Arc::new(self.normalizer.clone()),
        }
    }
}

/// Read-only field configuration handed to the reconciler.
#[derive(Debug, Clone)]
pub struct FieldSnapshot {
    fields: Arc<[ReconciliationField]>,
    normalizer: Arc<Normalizer>,
}

impl FieldSnapshot {
    pub fn fields(&self) -> &[ReconciliationField] {
        &self.fields
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ReconciliationField> {
        self.fields.iter().filter(|f| f.enabled)
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Reject configurations that would silently compare absent values.
    pub fn validate(&self) -> Result<(), ReconError> {
        let mut seen = HashSet::new();
        for f in self.fields.iter() {
            if !seen.insert(f.id.as_str()) {
                return Err(ReconError::DuplicateFieldId(f.id.clone()));
            }
            if !f.enabled {
                continue;
            }
            if f.platform_key.trim().is_empty() {
                return Err(ReconError::BlankFieldKey {
                    field_id: f.id.clone(),
                    side: "platform",
                });
            }
            if f.bank_key.trim().is_empty() {
                return Err(ReconError::BlankFieldKey {
                    field_id: f.id.clone(),
                    side: "bank",
                });
            }
        }
        let join_key_enabled = self
            .fields
            .iter()
            .any(|f| f.id == LOAN_ID_FIELD && f.enabled);
        if !join_key_enabled {
            return Err(ReconError::JoinKeyDisabled);
        }
        Ok(())
    }
}
