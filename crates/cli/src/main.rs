// lrecon - reconcile a loan ledger against bank records from the command line

mod exit_codes;
mod export;
mod recon;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exit_codes::{recon_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use loan_recon::ReconError;

#[derive(Parser)]
#[command(name = "lrecon")]
#[command(about = "Field-level reconciliation of loan ledgers against bank records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile bank records against platform loans
    #[command(after_help = "\
Examples:
  lrecon run monthly.recon.toml --bank bank.json --loans loans.json
  lrecon run monthly.recon.toml --bank bank.json --loans loans.json --clients clients.json --json
  lrecon run monthly.recon.toml --bank bank.json --loans loans.json --export march.xlsx
  lrecon run monthly.recon.toml --bank bank.json --loans loans.json --history sessions.json --fail-on-discrepancy")]
    Run(recon::RunArgs),

    /// Validate a reconciliation config without running
    #[command(after_help = "\
Examples:
  lrecon validate monthly.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// List the effective field mappings of a config
    #[command(after_help = "\
Examples:
  lrecon fields monthly.recon.toml
  lrecon fields monthly.recon.toml --json")]
    Fields {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Convert a saved JSON result into CSV, XLSX or JSON
    #[command(after_help = "\
Examples:
  lrecon export result.json -o result.xlsx
  lrecon export result.json -o result.txt --to csv")]
    Export {
        /// Result file written by `lrecon run --output`
        result: PathBuf,

        /// Destination file
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Output format (inferred from the destination extension when omitted)
        #[arg(long)]
        to: Option<String>,
    },

    /// Show recorded reconciliation sessions
    #[command(after_help = "\
Examples:
  lrecon history sessions.json
  lrecon history sessions.json --json")]
    History {
        /// Session history file maintained by `lrecon run --history`
        file: PathBuf,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::BlankFieldKey { .. } => {
                Some("disable the field or give it both a platform_key and a bank_key".to_string())
            }
            ReconError::JoinKeyDisabled => {
                Some("the loanId field joins the two sides and must stay enabled".to_string())
            }
            _ => None,
        };
        Self {
            code: recon_exit_code(&err),
            message: err.to_string(),
            hint,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lrecon=info,loan_recon=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => recon::cmd_run(args),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Fields { config, json } => recon::cmd_fields(config, json),
        Commands::Export { result, output, to } => export::cmd_export(result, output, to),
        Commands::History { file, json } => recon::cmd_history(file, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
