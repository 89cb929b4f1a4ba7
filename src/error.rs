use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    GeneralError = 1,
    ConfigurationError = 2,
    ApiFailure = 3,
    Timeout = 4,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API request timed out after {0:?}. Please check your network connection.")]
    Timeout(Duration),

    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request superseded by a newer request")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage file locked by another process")]
    StorageLocked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl WizardError {
    /// Convert error to appropriate exit status
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            WizardError::Configuration(_)
            | WizardError::TomlParse(_)
            | WizardError::TomlSerialize(_)
            | WizardError::InvalidApiKey(_) => ExitStatus::ConfigurationError,

            WizardError::Api { .. }
            | WizardError::MalformedResponse(_)
            | WizardError::Transport(_) => ExitStatus::ApiFailure,

            WizardError::Timeout(_) => ExitStatus::Timeout,

            WizardError::Cancelled
            | WizardError::InvalidInput(_)
            | WizardError::StorageLocked
            | WizardError::Io(_)
            | WizardError::Json(_)
            | WizardError::UserCancelled => ExitStatus::GeneralError,
        }
    }

    /// Whether this error only means a newer request replaced the one that failed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WizardError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, WizardError>;
