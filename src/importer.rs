use tracing::{debug, info, warn};

use crate::convert;
use crate::domain::{Accession, ImportSource};
use crate::error::KiraError;
use crate::extract;
use crate::finder::Finder;
use crate::model::{Analysis, Project, ReferenceSequence, Sample, Study, Taxonomy};
use crate::retriever::XmlRetriever;
use crate::store::Store;
use crate::xml::{AnalysisRecord, AssemblyRecord, StudyRecord, non_blank, parse_record};

/// Which side of the study/analysis relationship drives the traversal.
///
/// `Api` walks down from a study to the analyses it lists. `Database` walks up
/// from an analysis to the study it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDirection {
    Api,
    Database,
}

impl From<ImportSource> for ImportDirection {
    fn from(source: ImportSource) -> Self {
        match source {
            ImportSource::Api => ImportDirection::Api,
            ImportSource::Database => ImportDirection::Database,
        }
    }
}

pub fn default_study_taxonomy() -> Taxonomy {
    Taxonomy::new(9606, "Homo sapiens")
}

pub struct ObjectsImporter<R: XmlRetriever> {
    retriever: R,
    store: Store,
    direction: ImportDirection,
    study_taxonomy: Option<Taxonomy>,
}

impl<R: XmlRetriever> ObjectsImporter<R> {
    pub fn new(retriever: R, store: Store, direction: ImportDirection) -> Self {
        Self {
            retriever,
            store,
            direction,
            study_taxonomy: Some(default_study_taxonomy()),
        }
    }

    /// `None` imports studies without a taxonomy.
    pub fn with_study_taxonomy(mut self, taxonomy: Option<Taxonomy>) -> Self {
        self.study_taxonomy = taxonomy;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn direction(&self) -> ImportDirection {
        self.direction
    }

    fn finder(&self) -> Finder<'_> {
        Finder::new(&self.store)
    }

    pub fn import_study(&self, accession: &Accession) -> Result<Study, KiraError> {
        let xml = self.retriever.get_xml(accession)?;
        let record: StudyRecord = parse_record(&xml, accession)?;

        let mut study = convert::study(&record, accession);
        study.publications = extract::publications(&record);
        study.resources = extract::web_resources(&record);
        study.taxonomy = extract::study_taxonomy(self.study_taxonomy.as_ref());
        debug!(
            %accession,
            publications = study.publications.len(),
            resources = study.resources.len(),
            "converted study"
        );

        self.attach_analyses_to_study(study, &record)
    }

    /// Imports the study behind `accession` and records it as a project.
    pub fn import_project(&self, accession: &Accession) -> Result<Project, KiraError> {
        let mut study = self.import_study(accession)?;
        let analyses = std::mem::take(&mut study.analyses);
        let study = self.finder().study(&study)?;
        let project = self.finder().project(&Project::from_study(&study))?;
        info!(
            %accession,
            project = %project.accession_version_id,
            analyses = analyses.len(),
            "imported project"
        );
        Ok(project)
    }

    pub fn import_analysis(&self, accession: &Accession) -> Result<Analysis, KiraError> {
        let xml = self.retriever.get_xml(accession)?;
        let record: AnalysisRecord = parse_record(&xml, accession)?;

        let mut analysis = convert::analysis(&record, accession);
        analysis.files = extract::files(&record);

        for reference_accession in extract::reference_sequence_accessions(&record) {
            match self.import_reference_sequence_text(&reference_accession) {
                Ok(reference) => analysis.reference_sequences.push(reference),
                Err(err) if err.is_storage() => return Err(err),
                Err(err) => warn!(
                    %accession,
                    reference = %reference_accession,
                    error = %err,
                    "skipping reference sequence"
                ),
            }
        }

        analysis.samples = self.import_samples(&record)?;

        if analysis.reference_sequences.is_empty() {
            return Err(KiraError::AnalysisWithoutReferenceSequence(
                analysis.accession_version_id.accession,
            ));
        }

        self.attach_study_to_analysis(analysis, &record)
    }

    pub fn import_reference_sequence(
        &self,
        accession: &Accession,
    ) -> Result<ReferenceSequence, KiraError> {
        let xml = self.retriever.get_xml(accession)?;
        let record: AssemblyRecord = parse_record(&xml, accession)?;

        let mut reference = convert::reference_sequence(&record, accession);
        reference.taxonomy = extract::reference_sequence_taxonomy(&record);
        self.finder().reference_sequence(&reference)
    }

    pub fn import_samples(&self, record: &AnalysisRecord) -> Result<Vec<Sample>, KiraError> {
        extract::sample_references(record)
            .iter()
            .map(|sample| self.finder().sample(sample))
            .collect()
    }

    fn import_reference_sequence_text(&self, value: &str) -> Result<ReferenceSequence, KiraError> {
        let accession: Accession = value.parse()?;
        self.import_reference_sequence(&accession)
    }

    fn attach_analyses_to_study(
        &self,
        study: Study,
        record: &StudyRecord,
    ) -> Result<Study, KiraError> {
        if self.direction != ImportDirection::Api {
            return Ok(study);
        }

        let mut study = self.finder().study(&study)?;
        let study_ref = study.study_ref();
        let study_accession = study.accession_version_id.clone();

        for analysis_accession in extract::analysis_accessions(record) {
            let imported = analysis_accession
                .parse::<Accession>()
                .and_then(|accession| self.import_analysis(&accession))
                .and_then(|mut analysis| {
                    analysis.study = study_ref.clone();
                    self.finder().analysis(&analysis)
                });
            match imported {
                Ok(analysis) => study.analyses.push(analysis),
                Err(err) if err.is_storage() => return Err(err),
                Err(err) => warn!(
                    study = %study_accession,
                    analysis = %analysis_accession,
                    error = %err,
                    "skipping analysis"
                ),
            }
        }
        Ok(study)
    }

    fn attach_study_to_analysis(
        &self,
        mut analysis: Analysis,
        record: &AnalysisRecord,
    ) -> Result<Analysis, KiraError> {
        if self.direction != ImportDirection::Database {
            return Ok(analysis);
        }

        let analysis_accession = analysis.accession_version_id.accession.clone();
        let study_accession = record
            .study_ref
            .as_ref()
            .and_then(|study_ref| non_blank(study_ref.accession.as_deref()))
            .ok_or_else(|| KiraError::MissingStudyReference(analysis_accession.clone()))?;
        let study_accession: Accession = study_accession.parse().map_err(|_| {
            KiraError::parse(
                &analysis_accession,
                format!("invalid STUDY_REF accession {study_accession:?}"),
            )
        })?;

        let study = self.import_study(&study_accession)?;
        let study = self.finder().study(&study)?;
        analysis.study = study.study_ref();
        self.finder().analysis(&analysis)
    }
}
