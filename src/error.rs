//! Error types for hydrotrain

use crate::config::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {} ({what})", path.display())]
    NotFound { what: String, path: PathBuf },

    #[error("Failed to parse YAML: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Training driver failed: {0}")]
    Driver(String),
}

impl Error {
    pub(crate) fn not_found(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Error::NotFound {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Field path of the offending config entry, when the error has one
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation(e) => Some(e.field()),
            Error::NotFound { what, .. } if is_field_path(what) => Some(what),
            _ => None,
        }
    }
}

fn is_field_path(what: &str) -> bool {
    ["general.", "data.", "model."]
        .iter()
        .any(|section| what.starts_with(section))
}

pub type Result<T> = std::result::Result<T, Error>;
