// src/error.rs

use std::path::PathBuf;

/// Failure of a single pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// Network failure or non-success HTTP status.
    #[error("fetching {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Expected content is absent from the page.
    #[error("{0}")]
    Structure(String),

    /// Required columns are missing from the table header.
    #[error("{0}")]
    Schema(String),

    /// A cell value does not parse.
    #[error("{0}")]
    Format(String),

    #[error("rate file {path:?}: {reason}")]
    RateFile { path: PathBuf, reason: String },

    /// Relation create/write failure.
    #[error("{0}")]
    Store(String),

    #[error("query `{query}` failed: {reason}")]
    Query { query: String, reason: String },

    /// Writing a CSV file or console output failed.
    #[error("writing {target}: {reason}")]
    Output { target: String, reason: String },
}

impl EtlError {
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn rate_file(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::RateFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn query(query: impl Into<String>, reason: impl ToString) -> Self {
        Self::Query {
            query: query.into(),
            reason: reason.to_string(),
        }
    }

    pub fn output(target: impl Into<String>, reason: impl ToString) -> Self {
        Self::Output {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<rusqlite::Error> for EtlError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}

pub type Result<T, E = EtlError> = std::result::Result<T, E>;
