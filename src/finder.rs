use std::fmt::Display;

use tracing::debug;

use crate::error::KiraError;
use crate::model::{
    Analysis, Project, Publication, ReferenceSequence, Sample, Study, Taxonomy, WebResource,
};
use crate::store::{Insert, Store};

/// Find-or-persist over the catalog store.
///
/// Every method returns the stored entity: the existing row when the natural
/// key is already present, otherwise the freshly inserted one. Dependencies
/// (taxonomy, publications, resources, reference sequences, samples) are
/// resolved before the owning entity is written.
#[derive(Debug, Clone, Copy)]
pub struct Finder<'a> {
    store: &'a Store,
}

impl<'a> Finder<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn taxonomy(&self, taxonomy: &Taxonomy) -> Result<Taxonomy, KiraError> {
        let key = taxonomy.taxonomy_id;
        find_or_persist(
            "taxonomy",
            &key,
            || self.store.find_taxonomy(key),
            || self.store.insert_taxonomy(taxonomy),
        )
    }

    pub fn publication(&self, publication: &Publication) -> Result<Publication, KiraError> {
        let key = publication.publication_id.as_str();
        find_or_persist(
            "publication",
            &key,
            || self.store.find_publication(key),
            || self.store.insert_publication(publication),
        )
    }

    pub fn web_resource(&self, resource: &WebResource) -> Result<WebResource, KiraError> {
        let key = resource.resource_url.as_str();
        find_or_persist(
            "web resource",
            &key,
            || self.store.find_web_resource(key),
            || self.store.insert_web_resource(resource),
        )
    }

    pub fn study(&self, study: &Study) -> Result<Study, KiraError> {
        let key = &study.accession_version_id;
        if let Some(existing) = self.store.find_study(key)? {
            return Ok(existing);
        }
        let mut resolved = study.clone();
        resolved.taxonomy = self.optional_taxonomy(study.taxonomy.as_ref())?;
        resolved.publications = self.publications(&study.publications)?;
        resolved.resources = self.web_resources(&study.resources)?;
        find_or_persist(
            "study",
            key,
            || self.store.find_study(key),
            || self.store.insert_study(&resolved),
        )
    }

    pub fn project(&self, project: &Project) -> Result<Project, KiraError> {
        let key = &project.accession_version_id;
        if let Some(existing) = self.store.find_project(key)? {
            return Ok(existing);
        }
        let mut resolved = project.clone();
        resolved.publications = self.publications(&project.publications)?;
        resolved.resources = self.web_resources(&project.resources)?;
        find_or_persist(
            "project",
            key,
            || self.store.find_project(key),
            || self.store.insert_project(&resolved),
        )
    }

    pub fn reference_sequence(
        &self,
        reference: &ReferenceSequence,
    ) -> Result<ReferenceSequence, KiraError> {
        let key = reference.accession.as_str();
        if let Some(existing) = self.store.find_reference_sequence(key)? {
            return Ok(existing);
        }
        let mut resolved = reference.clone();
        resolved.taxonomy = self.optional_taxonomy(reference.taxonomy.as_ref())?;
        find_or_persist(
            "reference sequence",
            &key,
            || self.store.find_reference_sequence(key),
            || self.store.insert_reference_sequence(&resolved),
        )
    }

    pub fn sample(&self, sample: &Sample) -> Result<Sample, KiraError> {
        let key = &sample.accession_version_id;
        find_or_persist(
            "sample",
            key,
            || self.store.find_sample(key),
            || self.store.insert_sample(sample),
        )
    }

    /// The analysis must already carry a persisted study reference when it has one.
    pub fn analysis(&self, analysis: &Analysis) -> Result<Analysis, KiraError> {
        let key = &analysis.accession_version_id;
        if let Some(existing) = self.store.find_analysis(key)? {
            return Ok(existing);
        }
        let mut resolved = analysis.clone();
        resolved.reference_sequences = analysis
            .reference_sequences
            .iter()
            .map(|reference| self.reference_sequence(reference))
            .collect::<Result<_, _>>()?;
        resolved.samples = analysis
            .samples
            .iter()
            .map(|sample| self.sample(sample))
            .collect::<Result<_, _>>()?;
        find_or_persist(
            "analysis",
            key,
            || self.store.find_analysis(key),
            || self.store.insert_analysis(&resolved),
        )
    }

    fn optional_taxonomy(&self, taxonomy: Option<&Taxonomy>) -> Result<Option<Taxonomy>, KiraError> {
        taxonomy.map(|taxonomy| self.taxonomy(taxonomy)).transpose()
    }

    fn publications(&self, publications: &[Publication]) -> Result<Vec<Publication>, KiraError> {
        publications
            .iter()
            .map(|publication| self.publication(publication))
            .collect()
    }

    fn web_resources(&self, resources: &[WebResource]) -> Result<Vec<WebResource>, KiraError> {
        resources
            .iter()
            .map(|resource| self.web_resource(resource))
            .collect()
    }
}

/// Looks the key up, inserts when absent and reads the row back. A natural-key
/// conflict on insert means a concurrent writer won; its row is returned.
pub(crate) fn find_or_persist<E>(
    entity: &str,
    key: &dyn Display,
    find: impl Fn() -> Result<Option<E>, KiraError>,
    insert: impl FnOnce() -> Result<Insert, KiraError>,
) -> Result<E, KiraError> {
    if let Some(existing) = find()? {
        return Ok(existing);
    }
    match insert()? {
        Insert::Inserted(id) => debug!(entity, %key, id, "persisted"),
        Insert::Duplicate => debug!(entity, %key, "lost insert race, re-reading"),
    }
    find()?.ok_or_else(|| KiraError::Storage(format!("{entity} {key} vanished after insert")))
}
