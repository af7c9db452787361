//! Error types for the ETL run.
//!
//! Every variant is fatal for the run that produced it. Lookup misses
//! during songplay resolution are not errors and never show up here.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    /// Discovery found nothing to process under the given root
    #[error("No input files found under {}", root.display())]
    NoInputFiles { root: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line of an NDJSON file is not a JSON object
    #[error("Malformed JSON in {} at line {line}: {source}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: simd_json::Error,
    },

    #[error("Line {line} of {} is not a JSON object", path.display())]
    NotAnObject { path: PathBuf, line: usize },

    /// A row could not be converted into its typed record
    #[error("Invalid {entity} record: {reason}")]
    InvalidRecord { entity: &'static str, reason: String },

    #[error("Directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
