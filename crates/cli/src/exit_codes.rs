//! CLI Exit Code Registry
//!
//! Single source of truth for `lrecon` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad args, conflicting options)              |
//! | 3    | Invalid reconciliation config                            |
//! | 4    | Input error (unreadable or malformed record files)       |
//! | 5    | Export / output write error                              |
//! | 6    | Exceptions found and `--fail-on-discrepancy` was given   |

use loan_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Record or history file unreadable or malformed.
pub const EXIT_INPUT: u8 = 4;

/// Result could not be serialized or written.
pub const EXIT_EXPORT: u8 = 5;

/// Discrepancies or missing loans found (only with `--fail-on-discrepancy`).
pub const EXIT_EXCEPTIONS: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::BlankFieldKey { .. }
        | ReconError::DuplicateFieldId(_)
        | ReconError::JoinKeyDisabled => EXIT_INVALID_CONFIG,
        ReconError::InputParse { .. } | ReconError::Io(_) => EXIT_INPUT,
        ReconError::Export(_) => EXIT_EXPORT,
        ReconError::SessionFinalized { .. } | ReconError::SessionInProgress { .. } => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_invalid_config() {
        assert_eq!(recon_exit_code(&ReconError::JoinKeyDisabled), EXIT_INVALID_CONFIG);
        assert_eq!(
            recon_exit_code(&ReconError::BlankFieldKey {
                field_id: "x".into(),
                side: "bank",
            }),
            EXIT_INVALID_CONFIG
        );
    }

    #[test]
    fn input_and_export_errors() {
        let parse = ReconError::InputParse {
            source: "bank".into(),
            message: "eof".into(),
        };
        assert_eq!(recon_exit_code(&parse), EXIT_INPUT);
        assert_eq!(recon_exit_code(&ReconError::Export("disk".into())), EXIT_EXPORT);
    }

    #[test]
    fn session_state_errors_are_general() {
        let err = ReconError::SessionInProgress {
            session_id: "s1".into(),
        };
        assert_eq!(recon_exit_code(&err), EXIT_ERROR);
    }
}
