use std::path::PathBuf;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid accession: {0:?}")]
    InvalidAccession(String),

    #[error("failed to retrieve XML for {accession}: {message}")]
    Retrieval { accession: String, message: String },

    #[error("upstream returned status {status} for {accession}")]
    RetrievalStatus { accession: String, status: u16 },

    #[error("failed to parse XML for {accession}: {message}")]
    Parse { accession: String, message: String },

    #[error("analysis {0} has no STUDY_REF accession")]
    MissingStudyReference(String),

    #[error("analysis {0} has no resolvable reference sequence")]
    #[diagnostic(help("the analysis was not persisted"))]
    AnalysisWithoutReferenceSequence(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("failed to open catalog store at {path}: {message}")]
    StoreOpen { path: String, message: String },

    #[error("failed to read accession list at {0}")]
    AccessionFileRead(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Coarse classification used in batch outcomes and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Retrieval,
    Parse,
    AnalysisWithoutReferenceSequence,
    Storage,
    InvalidAccession,
    Fatal,
}

impl KiraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KiraError::InvalidAccession(_) => ErrorKind::InvalidAccession,
            KiraError::Retrieval { .. } | KiraError::RetrievalStatus { .. } => {
                ErrorKind::Retrieval
            }
            KiraError::Parse { .. } | KiraError::MissingStudyReference(_) => ErrorKind::Parse,
            KiraError::AnalysisWithoutReferenceSequence(_) => {
                ErrorKind::AnalysisWithoutReferenceSequence
            }
            KiraError::Storage(_) => ErrorKind::Storage,
            KiraError::StoreOpen { .. }
            | KiraError::AccessionFileRead(_)
            | KiraError::ConfigRead(_)
            | KiraError::ConfigParse(_)
            | KiraError::HttpClient(_) => ErrorKind::Fatal,
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, KiraError::Storage(_))
    }

    pub(crate) fn parse(accession: impl ToString, message: impl ToString) -> Self {
        KiraError::Parse {
            accession: accession.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn retrieval(accession: impl ToString, message: impl ToString) -> Self {
        KiraError::Retrieval {
            accession: accession.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<rusqlite::Error> for KiraError {
    fn from(err: rusqlite::Error) -> Self {
        KiraError::Storage(err.to_string())
    }
}
