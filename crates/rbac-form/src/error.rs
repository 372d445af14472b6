//! Form error types.

use thiserror::Error;

/// A field list that cannot produce a working form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormBuildError {
    #[error("Duplicate field key '{key}'")]
    DuplicateKey { key: String },

    #[error("Field '{field}' depends on unknown field '{depends_on}'")]
    UnknownDependency { field: String, depends_on: String },

    #[error("Field '{field}' spans {cols} columns (expected 1 to 12)")]
    InvalidGridCols { field: String, cols: u8 },

    #[error("Paginated select '{field}' has no option loader")]
    MissingLoader { field: String },
}

impl FormBuildError {
    /// Key of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::DuplicateKey { key } => key,
            Self::UnknownDependency { field, .. }
            | Self::InvalidGridCols { field, .. }
            | Self::MissingLoader { field } => field,
        }
    }

    /// How to fix the field list.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DuplicateKey { .. } => "Give every field a unique key.",
            Self::UnknownDependency { .. } => {
                "Point the conditional at a field declared in the same form."
            }
            Self::InvalidGridCols { .. } => "Use a column span between 1 and 12.",
            Self::MissingLoader { .. } => "Attach a paginated select config with a loader.",
        }
    }
}

/// Why a submission did not start.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("The form is loading")]
    Loading,

    #[error("The form has invalid fields")]
    Invalid,
}
