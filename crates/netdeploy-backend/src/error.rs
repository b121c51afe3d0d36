use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("Application is not network deployed")]
    NotNetworkDeployed,

    #[error("Deployment mechanism reported a failure during {operation}: {details}")]
    NativeFailure {
        operation: &'static str,
        details: String,
    },

    #[error("Background poll for {operation} ended without a result")]
    PollAborted { operation: &'static str },

    #[error("Could not read version metadata from {}: {details}", path.display())]
    Metadata { path: PathBuf, details: String },

    #[error("Could not resolve the running executable: {details}")]
    ExecutableUnresolved { details: String },

    #[error(transparent)]
    ParseError(#[from] crate::types::VersionParseError),
}

impl DeployError {
    pub fn native(operation: &'static str, details: impl Into<String>) -> Self {
        Self::NativeFailure {
            operation,
            details: details.into(),
        }
    }

    pub fn metadata(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            details: details.into(),
        }
    }

    pub fn metadata_from<E>(path: impl Into<PathBuf>, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::metadata(path, error.to_string())
    }
}
