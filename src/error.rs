use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid identifier pattern: {0}")]
    InvalidPattern(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("category listing request failed: {0}")]
    ListingHttp(String),

    #[error("category listing returned status {status}: {message}")]
    ListingStatus { status: u16, message: String },

    #[error("malformed category listing response: {0}")]
    ListingShape(String),

    #[error("attribute query failed: {0}")]
    AskHttp(String),

    #[error("attribute query returned status {status}: {message}")]
    AskStatus { status: u16, message: String },

    #[error("malformed attribute response: {0}")]
    AskShape(String),

    #[error("lookup snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("failed to parse lookup snapshot: {0}")]
    SnapshotParse(String),

    #[error("failed to read DNA file: {0}")]
    DnaRead(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl KiraError {
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            KiraError::ListingHttp(_)
                | KiraError::ListingStatus { .. }
                | KiraError::ListingShape(_)
                | KiraError::AskHttp(_)
                | KiraError::AskStatus { .. }
                | KiraError::AskShape(_)
        )
    }
}
