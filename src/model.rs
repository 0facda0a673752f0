use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{
    AccessionVersionId, FileType, ReferenceSequenceType, Technology, WebResourceKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxonomy {
    pub id: Option<i64>,
    pub taxonomy_id: i64,
    pub name: String,
}

impl Taxonomy {
    pub fn new(taxonomy_id: i64, name: impl Into<String>) -> Self {
        Self {
            id: None,
            taxonomy_id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub id: Option<i64>,
    pub publication_id: String,
}

impl Publication {
    pub fn new(publication_id: impl Into<String>) -> Self {
        Self {
            id: None,
            publication_id: publication_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebResource {
    pub id: Option<i64>,
    pub kind: WebResourceKind,
    pub resource_url: String,
}

impl WebResource {
    pub fn new(kind: WebResourceKind, resource_url: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            resource_url: resource_url.into(),
        }
    }
}

/// Back-reference from an analysis or project to its persisted study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyRef {
    pub id: i64,
    pub accession_version_id: AccessionVersionId,
}

#[derive(Debug, Clone, Serialize)]
pub struct Study {
    pub id: Option<i64>,
    pub accession_version_id: AccessionVersionId,
    pub name: String,
    pub description: String,
    pub center: String,
    pub release_date: NaiveDate,
    pub taxonomy: Option<Taxonomy>,
    pub publications: Vec<Publication>,
    pub resources: Vec<WebResource>,
    /// Filled in memory by API-direction imports; not loaded back from the store.
    pub analyses: Vec<Analysis>,
}

impl Study {
    pub fn study_ref(&self) -> Option<StudyRef> {
        self.id.map(|id| StudyRef {
            id,
            accession_version_id: self.accession_version_id.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: Option<i64>,
    pub accession_version_id: AccessionVersionId,
    pub name: String,
    pub description: String,
    pub center: String,
    pub release_date: NaiveDate,
    pub study: Option<StudyRef>,
    pub publications: Vec<Publication>,
    pub resources: Vec<WebResource>,
}

impl Project {
    pub fn from_study(study: &Study) -> Self {
        Self {
            id: None,
            accession_version_id: study.accession_version_id.clone(),
            name: study.name.clone(),
            description: study.description.clone(),
            center: study.center.clone(),
            release_date: study.release_date,
            study: study.study_ref(),
            publications: study.publications.clone(),
            resources: study.resources.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSequence {
    pub id: Option<i64>,
    pub accession: String,
    pub name: String,
    pub patch: Option<String>,
    pub kind: ReferenceSequenceType,
    pub taxonomy: Option<Taxonomy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub id: Option<i64>,
    pub accession_version_id: AccessionVersionId,
    pub name: String,
    pub bio_sample_accession: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub id: Option<i64>,
    pub name: String,
    pub kind: FileType,
    pub hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub id: Option<i64>,
    pub accession_version_id: AccessionVersionId,
    pub name: String,
    pub description: String,
    pub technology: Technology,
    pub files: Vec<File>,
    pub reference_sequences: Vec<ReferenceSequence>,
    pub samples: Vec<Sample>,
    pub study: Option<StudyRef>,
}
