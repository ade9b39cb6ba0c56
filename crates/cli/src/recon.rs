//! `lrecon run | validate | fields | history`: config-driven loan reconciliation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Args;

use loan_recon::export::{export, to_json, ExportFormat};
use loan_recon::input::{
    attach_client_names, bank_records_from_json, clients_from_json, platform_loans_from_json,
};
use loan_recon::model::{ReconInput, ReconOutcome, ReconStatus};
use loan_recon::{ReconConfig, ReconError, ReconciliationSession, SessionRecorder};

use crate::exit_codes::{EXIT_EXCEPTIONS, EXIT_EXPORT, EXIT_INPUT, EXIT_INVALID_CONFIG};
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the .recon.toml config file
    pub config: PathBuf,

    /// Bank records (JSON array, one object per loan)
    #[arg(long)]
    pub bank: PathBuf,

    /// Platform loans (JSON array)
    #[arg(long)]
    pub loans: PathBuf,

    /// Clients used to fill in missing client names (JSON array of {id, name})
    #[arg(long)]
    pub clients: Option<PathBuf>,

    /// Operator notes keyed by loan id (JSON object)
    #[arg(long)]
    pub notes: Option<PathBuf>,

    /// Output JSON to stdout instead of human summary
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Also export results (format from extension: .json, .csv, .xlsx)
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Only list results with this status in the human summary
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ReconStatus>,

    /// Operator recorded on the session (defaults to config, then $USER)
    #[arg(long, env = "LRECON_PERFORMED_BY")]
    pub performed_by: Option<String>,

    /// Append this run to a session history file (created if absent)
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Exit non-zero when any loan is not matched
    #[arg(long)]
    pub fail_on_discrepancy: bool,
}

fn parse_status(s: &str) -> Result<ReconStatus, String> {
    s.parse()
}

fn read_file(path: &Path, code: u8) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::new(code, format!("cannot read {}: {e}", path.display())))
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = read_file(path, EXIT_INVALID_CONFIG)?;
    Ok(ReconConfig::from_toml(&config_str)?)
}

fn load_input(args: &RunArgs) -> Result<ReconInput, CliError> {
    let bank_records = bank_records_from_json(&read_file(&args.bank, EXIT_INPUT)?)?;
    let mut platform_loans = platform_loans_from_json(&read_file(&args.loans, EXIT_INPUT)?)?;

    if let Some(ref path) = args.clients {
        let clients = clients_from_json(&read_file(path, EXIT_INPUT)?)?;
        let filled = attach_client_names(&mut platform_loans, &clients);
        tracing::debug!("attached {filled} client names from {}", path.display());
    }

    tracing::info!(
        "loaded {} bank records and {} platform loans",
        bank_records.len(),
        platform_loans.len()
    );
    Ok(ReconInput {
        bank_records,
        platform_loans,
    })
}

fn apply_notes(outcome: &mut ReconOutcome, path: &Path) -> Result<(), CliError> {
    let text = read_file(path, EXIT_INPUT)?;
    let notes: BTreeMap<String, String> =
        serde_json::from_str(&text).map_err(|e| ReconError::InputParse {
            source: "notes".into(),
            message: e.to_string(),
        })?;
    let unknown = outcome.annotations().apply(notes);
    for loan_id in unknown {
        tracing::warn!("note for unknown loan '{loan_id}' ignored");
    }
    Ok(())
}

fn default_operator() -> String {
    std::env::var("USER").unwrap_or_else(|_| "unknown".into())
}

fn load_history(path: &Path) -> Result<SessionRecorder, CliError> {
    if !path.exists() {
        return Ok(SessionRecorder::new());
    }
    Ok(SessionRecorder::from_json(&read_file(path, EXIT_INPUT)?)?)
}

fn append_history(path: &Path, session: ReconciliationSession) -> Result<(), CliError> {
    let mut recorder = load_history(path)?;
    recorder.record(session)?;
    std::fs::write(path, recorder.to_json()?)
        .map_err(|e| CliError::new(EXIT_EXPORT, format!("cannot write {}: {e}", path.display())))
}

/// Session history is bookkeeping. Failing to update it is reported on
/// stderr but never discards the run's result or changes its exit code.
fn record_history(path: Option<&Path>, session: ReconciliationSession) {
    let Some(path) = path else {
        return;
    };
    if let Err(e) = append_history(path, session) {
        tracing::debug!("history update failed with code {}", e.code);
        eprintln!("warning: session not recorded in {}: {}", path.display(), e.message);
    }
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    if args.json && args.output.as_deref() == Some(Path::new("-")) {
        return Err(CliError::args("--json already writes to stdout; drop --output -"));
    }

    let config = load_config(&args.config)?;
    let performed_by = args
        .performed_by
        .clone()
        .or_else(|| config.performed_by.clone())
        .unwrap_or_else(default_operator);

    let mut session = ReconciliationSession::begin(&performed_by);
    let attempt = load_input(&args).and_then(|input| {
        let outcome = loan_recon::run(&config.name, &config.registry().snapshot(), &input)?;
        Ok(outcome)
    });

    let mut outcome = match attempt {
        Ok(outcome) => outcome,
        Err(err) => {
            session.fail()?;
            record_history(args.history.as_deref(), session);
            return Err(err);
        }
    };
    session.complete(outcome.meta.bank_records, &outcome.summary)?;

    if let Some(ref path) = args.notes {
        apply_notes(&mut outcome, path)?;
    }

    let emitted = emit(&args, &outcome);
    record_history(args.history.as_deref(), session);
    emitted?;

    if args.fail_on_discrepancy && outcome.summary.has_exceptions() {
        return Err(CliError::new(EXIT_EXCEPTIONS, "unreconciled loans found"));
    }
    Ok(())
}

/// Write `--output` and `--export` files, then the listing or JSON on stdout
/// and the summary on stderr.
fn emit(args: &RunArgs, outcome: &ReconOutcome) -> Result<(), CliError> {
    let json_str = to_json(outcome)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::new(EXIT_EXPORT, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref path) = args.export {
        let format = ExportFormat::from_path(path).ok_or_else(|| {
            CliError::args(format!("cannot infer export format from {}", path.display()))
                .with_hint("use a .json, .csv or .xlsx extension")
        })?;
        export(outcome, format, path)?;
        eprintln!("exported {}", path.display());
    }

    if args.json {
        println!("{json_str}");
    } else {
        print_listing(outcome, args.status);
    }

    // Human summary to stderr
    let s = &outcome.summary;
    eprintln!(
        "recon '{}': {} loans, {} matched, {} discrepancies, \
         {} missing in platform, {} missing in bank",
        outcome.meta.config_name,
        s.total,
        s.matched,
        s.discrepancies,
        s.missing_platform,
        s.missing_bank,
    );
    if !outcome.meta.duplicate_bank_ids.is_empty() {
        eprintln!(
            "warning: repeated bank loan ids skipped: {}",
            outcome.meta.duplicate_bank_ids.join(", ")
        );
    }
    Ok(())
}

/// Exceptions (or one status when filtered), one line per field mismatch.
fn print_listing(outcome: &ReconOutcome, status: Option<ReconStatus>) {
    let rows = outcome.results.iter().filter(|r| match status {
        Some(s) => r.status == s,
        None => r.status != ReconStatus::Matched,
    });

    for r in rows {
        let client = r.client_name.as_deref().unwrap_or("-");
        if r.discrepancies.is_empty() {
            println!("{:<16} {:<17} {}", r.loan_id, r.status, client);
        }
        for d in &r.discrepancies {
            let show = |v: &Option<loan_recon::RawValue>| {
                v.as_ref().map(ToString::to_string).unwrap_or_else(|| "(absent)".into())
            };
            println!(
                "{:<16} {:<17} {}: platform={} bank={}",
                r.loan_id,
                r.status,
                d.field,
                show(&d.platform_value),
                show(&d.bank_value),
            );
        }
        if let Some(ref note) = r.notes {
            println!("{:<16} note: {}", "", note);
        }
    }
}

// ============================================================================
// validate / fields
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let registry = config.registry();
    let enabled = registry.fields().iter().filter(|f| f.enabled).count();
    eprintln!(
        "valid: recon '{}' with {} field(s), {} enabled",
        config.name,
        registry.fields().len(),
        enabled,
    );
    Ok(())
}

pub fn cmd_fields(config_path: PathBuf, json: bool) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let registry = config.registry();

    if json {
        let out = serde_json::to_string_pretty(registry.fields())
            .map_err(|e| CliError::new(EXIT_EXPORT, format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "{:<20} {:<22} {:<9} {:<20} {:<20} {}",
        "ID", "LABEL", "TYPE", "PLATFORM KEY", "BANK KEY", "ENABLED"
    );
    for f in registry.fields() {
        println!(
            "{:<20} {:<22} {:<9} {:<20} {:<20} {}",
            f.id,
            f.label,
            f.field_type,
            f.platform_key,
            f.bank_key,
            if f.enabled { "yes" } else { "no" },
        );
    }
    Ok(())
}

// ============================================================================
// history
// ============================================================================

pub fn cmd_history(path: PathBuf, json: bool) -> Result<(), CliError> {
    if !path.exists() {
        return Err(CliError::general(format!("no history at {}", path.display()))
            .with_hint("record sessions with `lrecon run ... --history <file>`"));
    }
    let recorder = load_history(&path)?;

    if json {
        println!("{}", recorder.to_json()?);
        return Ok(());
    }

    for s in recorder.sessions() {
        println!(
            "{}  {}  {:<12} by {:<20} processed={} matched={} discrepancies={} \
             missing_platform={} missing_bank={}",
            s.date().format("%Y-%m-%d %H:%M"),
            s.id(),
            s.status(),
            s.performed_by(),
            s.records_processed(),
            s.matched(),
            s.discrepancies(),
            s.missing_in_platform(),
            s.missing_in_bank(),
        );
    }
    eprintln!("{} session(s)", recorder.len());
    Ok(())
}
