//! `loan-recon`: Loan ledger vs bank record reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded records, returns classified results.
//! No CLI dependencies.

pub mod annotations;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod input;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod registry;
pub mod session;
pub mod summary;

pub use annotations::AnnotationStore;
pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{
    BankRecord, Discrepancy, FieldType, PlatformLoanRecord, RawValue, ReconInput, ReconOutcome,
    ReconStatus, ReconSummary, ReconciliationField, ReconciliationResult,
};
pub use reconcile::reconcile;
pub use registry::{FieldRegistry, FieldSnapshot};
pub use session::{ReconciliationSession, SessionRecorder, SessionStatus};
pub use summary::compute_summary;
