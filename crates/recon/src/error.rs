use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad date format, empty name, etc.).
    ConfigValidation(String),
    /// An enabled field has an empty platform or bank key.
    BlankFieldKey { field_id: String, side: &'static str },
    /// Two field definitions share an id.
    DuplicateFieldId(String),
    /// The loan-identifier field is missing or disabled.
    JoinKeyDisabled,
    /// Record collection could not be deserialized.
    InputParse { source: String, message: String },
    /// A completed or failed session cannot change state again.
    SessionFinalized { session_id: String },
    /// Only finalized sessions can be archived.
    SessionInProgress { session_id: String },
    /// Export serialization error.
    Export(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::BlankFieldKey { field_id, side } => {
                write!(f, "field '{field_id}': {side} key is blank")
            }
            Self::DuplicateFieldId(id) => write!(f, "duplicate field id: '{id}'"),
            Self::JoinKeyDisabled => {
                write!(f, "the loan identifier field must be present and enabled")
            }
            Self::InputParse { source, message } => {
                write!(f, "cannot parse {source} records: {message}")
            }
            Self::SessionFinalized { session_id } => {
                write!(f, "session {session_id} is already finalized")
            }
            Self::SessionInProgress { session_id } => {
                write!(f, "session {session_id} is still in progress")
            }
            Self::Export(msg) => write!(f, "export error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
