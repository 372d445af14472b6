//! Host-layer error types.

use std::io;
use std::path::PathBuf;

use rbac_api::ApiError;
use rbac_form::{FormBuildError, SubmitRejected};
use thiserror::Error;

/// Settings that could not be read or written.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("Failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed settings: {message}")]
    Parse { message: String },

    #[error("Failed to serialize settings: {message}")]
    Serialize { message: String },

    #[error("Unknown log level '{level}'")]
    InvalidLogLevel { level: String },
}

impl SettingsError {
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Read { .. } => Some("Check that the settings file exists and is readable."),
            Self::Write { .. } => Some("Check that the settings directory is writable."),
            Self::Parse { .. } => Some("Fix the TOML syntax or delete the file to use defaults."),
            Self::InvalidLogLevel { .. } => {
                Some("Use one of: error, warn, info, debug, trace.")
            }
            Self::Serialize { .. } => None,
        }
    }
}

/// Logging could not be set up.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoggingError {
    #[error("Failed to open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// A resource page operation that failed.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Build(#[from] FormBuildError),

    #[error(transparent)]
    Rejected(#[from] SubmitRejected),

    #[error("No form is open")]
    NoForm,

    #[error("Record '{id}' is not a JSON object")]
    MalformedRecord { id: String },
}
