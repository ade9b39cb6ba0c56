//! Session Recorder: historical record of completed reconciliation runs.
//!
//! A session starts `in-progress` and is finalized exactly once, either as
//! `completed` (counts copied from the run summary) or `failed`. History is
//! kept in memory, newest first; callers that want durability serialize it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReconError;
use crate::model::{ReconOutcome, ReconSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Completed,
    InProgress,
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => f.pad("completed"),
            Self::InProgress => f.pad("in-progress"),
            Self::Failed => f.pad("failed"),
        }
    }
}

/// One reconciliation run. State changes only through [`complete`] and
/// [`fail`]; the counts are read-only.
///
/// [`complete`]: ReconciliationSession::complete
/// [`fail`]: ReconciliationSession::fail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSession {
    id: Uuid,
    date: DateTime<Utc>,
    performed_by: String,
    records_processed: usize,
    matched: usize,
    discrepancies: usize,
    missing_in_platform: usize,
    missing_in_bank: usize,
    status: SessionStatus,
}

impl ReconciliationSession {
    pub fn begin(performed_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            performed_by: performed_by.into(),
            records_processed: 0,
            matched: 0,
            discrepancies: 0,
            missing_in_platform: 0,
            missing_in_bank: 0,
            status: SessionStatus::InProgress,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn performed_by(&self) -> &str {
        &self.performed_by
    }

    pub fn records_processed(&self) -> usize {
        self.records_processed
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn discrepancies(&self) -> usize {
        self.discrepancies
    }

    pub fn missing_in_platform(&self) -> usize {
        self.missing_in_platform
    }

    pub fn missing_in_bank(&self) -> usize {
        self.missing_in_bank
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finalized(&self) -> bool {
        self.status != SessionStatus::InProgress
    }

    /// `records_processed` is the number of bank records supplied to the run.
    pub fn complete(
        &mut self,
        records_processed: usize,
        summary: &ReconSummary,
    ) -> Result<(), ReconError> {
        self.ensure_open()?;
        self.records_processed = records_processed;
        self.matched = summary.matched;
        self.discrepancies = summary.discrepancies;
        self.missing_in_platform = summary.missing_platform;
        self.missing_in_bank = summary.missing_bank;
        self.status = SessionStatus::Completed;
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), ReconError> {
        self.ensure_open()?;
        self.status = SessionStatus::Failed;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), ReconError> {
        if self.is_finalized() {
            return Err(ReconError::SessionFinalized {
                session_id: self.id.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecorder {
    sessions: Vec<ReconciliationSession>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        serde_json::from_str(input).map_err(|e| ReconError::InputParse {
            source: "session history".into(),
            message: e.to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, ReconError> {
        serde_json::to_string_pretty(self).map_err(|e| ReconError::Export(e.to_string()))
    }

    /// Archive a finalized session. In-progress sessions are rejected.
    pub fn record(&mut self, session: ReconciliationSession) -> Result<(), ReconError> {
        if !session.is_finalized() {
            return Err(ReconError::SessionInProgress {
                session_id: session.id.to_string(),
            });
        }
        log::info!(
            "recorded session {} by {} ({})",
            session.id,
            session.performed_by,
            session.status
        );
        self.sessions.insert(0, session);
        Ok(())
    }

    /// Capture a finished run as a completed session.
    pub fn record_outcome(
        &mut self,
        performed_by: impl Into<String>,
        outcome: &ReconOutcome,
    ) -> Result<&ReconciliationSession, ReconError> {
        let mut session = ReconciliationSession::begin(performed_by);
        session.complete(outcome.meta.bank_records, &outcome.summary)?;
        self.record(session)?;
        Ok(&self.sessions[0])
    }

    /// Newest first.
    pub fn sessions(&self) -> &[ReconciliationSession] {
        &self.sessions
    }

    pub fn latest(&self) -> Option<&ReconciliationSession> {
        self.sessions.first()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
