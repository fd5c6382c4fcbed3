// errors.rs
use std::path::PathBuf;
use thiserror::Error;

/// Bad or missing settings, detected before a stage starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail credentials incomplete: {0} not set")]
    MissingCredential(&'static str),
    #[error("no report recipient configured")]
    MissingRecipient,
    #[error("invalid mail address '{address}': {reason}")]
    Address { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("failed to read attachment {}: {source}", path.display())]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("SMTP send failed: {0}")]
    Send(String),
}

impl NotifyError {
    /// True when the message never left the process because settings were missing.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            NotifyError::MissingCredential(_) | NotifyError::MissingRecipient | NotifyError::Address { .. }
        )
    }
}
