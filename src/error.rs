use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ResolverError {
    #[error("invalid project accession: {0}")]
    InvalidProjectId(String),

    #[error("unrecognized identifier token: {0} (neither a single accession nor a range)")]
    #[diagnostic(help("tokens look like ERS000001 or ERS000001-ERS000010"))]
    InvalidIdentifierToken(String),

    #[error("no {db} cross-reference found for project {project}")]
    #[diagnostic(help("check that the project accession is correct"))]
    SampleLinkNotFound { project: String, db: String },

    #[error("project {project} has {count} {db} cross-references; only one is supported")]
    AmbiguousSampleLink {
        project: String,
        db: String,
        count: usize,
    },

    #[error("ENA request failed: {0}")]
    EnaHttp(String),

    #[error("ENA returned status {status}: {message}")]
    EnaStatus { status: u16, message: String },

    #[error("malformed {kind} document for {id}: {message}")]
    MalformedDocument {
        kind: String,
        id: String,
        message: String,
    },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),
}

impl ResolverError {
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            ResolverError::EnaHttp(_) | ResolverError::EnaStatus { .. }
        )
    }
}
