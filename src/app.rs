use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::domain::{Accession, ImportSource};
use crate::error::{ErrorKind, KiraError};
use crate::importer::{ImportDirection, ObjectsImporter};
use crate::retriever::XmlRetriever;
use crate::store::CatalogCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Imported,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessionOutcome {
    pub accession: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AccessionOutcome {
    fn imported(accession: &str, entity: String) -> Self {
        Self {
            accession: accession.to_string(),
            status: OutcomeStatus::Imported,
            entity: Some(entity),
            error_kind: None,
            message: None,
        }
    }

    fn failed(accession: &str, err: &KiraError) -> Self {
        Self {
            accession: accession.to_string(),
            status: OutcomeStatus::Failed,
            entity: None,
            error_kind: Some(err.kind()),
            message: Some(err.to_string()),
        }
    }

    fn skipped(accession: &str) -> Self {
        Self {
            accession: accession.to_string(),
            status: OutcomeStatus::Skipped,
            entity: None,
            error_kind: None,
            message: Some("not attempted after a storage failure".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub source: ImportSource,
    pub outcomes: Vec<AccessionOutcome>,
    pub imported: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchReport {
    fn new(source: ImportSource, outcomes: Vec<AccessionOutcome>) -> Self {
        let count = |status| outcomes.iter().filter(|o| o.status == status).count();
        Self {
            source,
            imported: count(OutcomeStatus::Imported),
            failed: count(OutcomeStatus::Failed),
            skipped: count(OutcomeStatus::Skipped),
            outcomes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Batch driver: one import per accession, failures isolated per accession.
pub struct App<R: XmlRetriever> {
    importer: ObjectsImporter<R>,
    abort_on_storage_error: bool,
}

impl<R: XmlRetriever> App<R> {
    pub fn new(importer: ObjectsImporter<R>) -> Self {
        Self {
            importer,
            abort_on_storage_error: false,
        }
    }

    /// After the first storage failure, mark the rest of the batch skipped.
    pub fn abort_on_storage_error(mut self, abort: bool) -> Self {
        self.abort_on_storage_error = abort;
        self
    }

    pub fn importer(&self) -> &ObjectsImporter<R> {
        &self.importer
    }

    pub fn source(&self) -> ImportSource {
        match self.importer.direction() {
            ImportDirection::Api => ImportSource::Api,
            ImportDirection::Database => ImportSource::Database,
        }
    }

    pub fn import_file(
        &self,
        path: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<BatchReport, KiraError> {
        let accessions = read_accessions(path)?;
        info!(path = %path.display(), count = accessions.len(), "read accession list");
        Ok(self.import_all(&accessions, sink))
    }

    pub fn import_all(&self, accessions: &[String], sink: &dyn ProgressSink) -> BatchReport {
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(accessions.len());
        let mut tripped = false;

        for (index, raw) in accessions.iter().enumerate() {
            if tripped {
                outcomes.push(AccessionOutcome::skipped(raw));
                continue;
            }
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Import; accession={raw}; {}/{}",
                    index + 1,
                    accessions.len()
                ),
                elapsed: Some(started.elapsed()),
            });

            let outcome = match self.import_one(raw) {
                Ok(entity) => {
                    info!(accession = %raw, %entity, "imported");
                    AccessionOutcome::imported(raw, entity)
                }
                Err(err) => {
                    if err.is_storage() {
                        error!(accession = %raw, error = %err, "storage failure");
                        tripped = self.abort_on_storage_error;
                    } else {
                        warn!(accession = %raw, error = %err, "import failed");
                    }
                    AccessionOutcome::failed(raw, &err)
                }
            };
            outcomes.push(outcome);
        }

        let report = BatchReport::new(self.source(), outcomes);
        sink.event(ProgressEvent {
            message: format!(
                "phase=Done; imported={} failed={} skipped={}",
                report.imported, report.failed, report.skipped
            ),
            elapsed: Some(started.elapsed()),
        });
        report
    }

    pub fn stats(&self) -> Result<CatalogCounts, KiraError> {
        self.importer.store().counts()
    }

    fn import_one(&self, raw: &str) -> Result<String, KiraError> {
        let accession: Accession = raw.parse()?;
        match self.importer.direction() {
            ImportDirection::Api => {
                let project = self.importer.import_project(&accession)?;
                Ok(format!("project {}", project.accession_version_id))
            }
            ImportDirection::Database => {
                let analysis = self.importer.import_analysis(&accession)?;
                Ok(format!("analysis {}", analysis.accession_version_id))
            }
        }
    }
}

/// Reads a newline-delimited accession list. Blank lines and `#` comments are
/// ignored; repeats (case-insensitive) keep their first position.
pub fn read_accessions(path: &Path) -> Result<Vec<String>, KiraError> {
    let content =
        fs::read_to_string(path).map_err(|_| KiraError::AccessionFileRead(path.to_path_buf()))?;
    let mut seen = HashSet::new();
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(line.to_uppercase()))
        .map(str::to_string)
        .collect())
}
