//! Typed views over the SRA XML schemas (study, analysis, assembly).
//!
//! Only the elements the importer reads are modelled; everything else in the
//! documents is ignored during deserialization.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::Accession;
use crate::error::KiraError;

pub trait SraRecord: DeserializeOwned {
    const ELEMENT: &'static str;
    const SET_ELEMENT: &'static str;
    type Set: DeserializeOwned;

    fn into_entries(set: Self::Set) -> Vec<Self>;
    fn record_accession(&self) -> Option<&str>;
}

/// Decodes `xml` as one record of kind `T`, accepting both the `*_SET`
/// wrapper and a bare root element.
pub fn parse_record<T: SraRecord>(xml: &str, accession: &Accession) -> Result<T, KiraError> {
    let root = root_element(xml).map_err(|err| KiraError::parse(accession, err))?;
    if root == T::SET_ELEMENT {
        let set: T::Set =
            quick_xml::de::from_str(xml).map_err(|err| KiraError::parse(accession, err))?;
        let mut entries = T::into_entries(set);
        let position = entries
            .iter()
            .position(|entry| {
                entry
                    .record_accession()
                    .is_some_and(|value| value.eq_ignore_ascii_case(accession.as_str()))
            })
            .unwrap_or(0);
        if entries.is_empty() {
            return Err(KiraError::parse(
                accession,
                format!("{} contains no {} entries", T::SET_ELEMENT, T::ELEMENT),
            ));
        }
        Ok(entries.swap_remove(position))
    } else if root == T::ELEMENT {
        quick_xml::de::from_str(xml).map_err(|err| KiraError::parse(accession, err))
    } else {
        Err(KiraError::parse(
            accession,
            format!(
                "unexpected root element <{root}>, expected <{}> or <{}>",
                T::SET_ELEMENT,
                T::ELEMENT
            ),
        ))
    }
}

fn root_element(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(|err| err.to_string())? {
            Event::Start(start) | Event::Empty(start) => {
                return Ok(String::from_utf8_lossy(start.local_name().as_ref()).into_owned());
            }
            Event::Eof => return Err("document has no root element".to_string()),
            _ => {}
        }
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

// ---------------------------------------------------------------------------
// Study

#[derive(Debug, Clone, Deserialize)]
pub struct StudySet {
    #[serde(rename = "STUDY", default)]
    pub studies: Vec<StudyRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudyRecord {
    #[serde(rename = "@accession", default)]
    pub accession: Option<String>,
    #[serde(rename = "@alias", default)]
    pub alias: Option<String>,
    #[serde(rename = "@center_name", default)]
    pub center_name: Option<String>,
    #[serde(rename = "@broker_name", default)]
    pub broker_name: Option<String>,
    #[serde(rename = "DESCRIPTOR", default)]
    pub descriptor: Option<StudyDescriptor>,
    #[serde(rename = "STUDY_LINKS", default)]
    pub links: Option<StudyLinks>,
    #[serde(rename = "STUDY_ATTRIBUTES", default)]
    pub attributes: Option<StudyAttributes>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyDescriptor {
    #[serde(rename = "STUDY_TITLE", default)]
    pub title: Option<String>,
    #[serde(rename = "STUDY_ABSTRACT", default)]
    pub study_abstract: Option<String>,
    #[serde(rename = "STUDY_DESCRIPTION", default)]
    pub description: Option<String>,
    #[serde(rename = "CENTER_PROJECT_NAME", default)]
    pub center_project_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyLinks {
    #[serde(rename = "STUDY_LINK", default)]
    pub links: Vec<StudyLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyLink {
    #[serde(rename = "XREF_LINK", default)]
    pub xref: Option<XrefLink>,
    #[serde(rename = "URL_LINK", default)]
    pub url: Option<UrlLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct XrefLink {
    #[serde(rename = "DB", default)]
    pub db: Option<String>,
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(rename = "LABEL", default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlLink {
    #[serde(rename = "LABEL", default)]
    pub label: Option<String>,
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyAttributes {
    #[serde(rename = "STUDY_ATTRIBUTE", default)]
    pub attributes: Vec<TagValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagValue {
    #[serde(rename = "TAG", default)]
    pub tag: Option<String>,
    #[serde(rename = "VALUE", default)]
    pub value: Option<String>,
}

impl StudyRecord {
    pub fn xref_links(&self) -> impl Iterator<Item = &XrefLink> {
        self.links
            .iter()
            .flat_map(|links| links.links.iter())
            .filter_map(|link| link.xref.as_ref())
    }

    pub fn url_links(&self) -> impl Iterator<Item = &UrlLink> {
        self.links
            .iter()
            .flat_map(|links| links.links.iter())
            .filter_map(|link| link.url.as_ref())
    }

    pub fn attribute(&self, tag: &str) -> Option<&str> {
        self.attributes
            .iter()
            .flat_map(|attributes| attributes.attributes.iter())
            .find(|attribute| {
                attribute
                    .tag
                    .as_deref()
                    .is_some_and(|value| value.trim().eq_ignore_ascii_case(tag))
            })
            .and_then(|attribute| non_blank(attribute.value.as_deref()))
    }
}

impl SraRecord for StudyRecord {
    const ELEMENT: &'static str = "STUDY";
    const SET_ELEMENT: &'static str = "STUDY_SET";
    type Set = StudySet;

    fn into_entries(set: StudySet) -> Vec<Self> {
        set.studies
    }

    fn record_accession(&self) -> Option<&str> {
        self.accession.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Analysis

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSet {
    #[serde(rename = "ANALYSIS", default)]
    pub analyses: Vec<AnalysisRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRecord {
    #[serde(rename = "@accession", default)]
    pub accession: Option<String>,
    #[serde(rename = "@alias", default)]
    pub alias: Option<String>,
    #[serde(rename = "@center_name", default)]
    pub center_name: Option<String>,
    #[serde(rename = "TITLE", default)]
    pub title: Option<String>,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
    #[serde(rename = "STUDY_REF", default)]
    pub study_ref: Option<RecordRef>,
    #[serde(rename = "SAMPLE_REF", default)]
    pub sample_refs: Vec<SampleRef>,
    #[serde(rename = "ANALYSIS_TYPE", default)]
    pub analysis_type: Option<AnalysisType>,
    #[serde(rename = "FILES", default)]
    pub files: Option<AnalysisFiles>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordRef {
    #[serde(rename = "@accession", default)]
    pub accession: Option<String>,
    #[serde(rename = "@refname", default)]
    pub refname: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleRef {
    #[serde(rename = "@accession", default)]
    pub accession: Option<String>,
    #[serde(rename = "@label", default)]
    pub label: Option<String>,
    #[serde(rename = "@refname", default)]
    pub refname: Option<String>,
    #[serde(rename = "IDENTIFIERS", default)]
    pub identifiers: Option<Identifiers>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Identifiers {
    #[serde(rename = "EXTERNAL_ID", default)]
    pub external_ids: Vec<ExternalId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalId {
    #[serde(rename = "@namespace", default)]
    pub namespace: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// The analysis categories that can carry a reference assembly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisType {
    #[serde(rename = "REFERENCE_ALIGNMENT", default)]
    pub reference_alignment: Option<ReferenceCategory>,
    #[serde(rename = "SEQUENCE_VARIATION", default)]
    pub sequence_variation: Option<ReferenceCategory>,
    #[serde(rename = "PROCESSED_READS", default)]
    pub processed_reads: Option<ReferenceCategory>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceCategory {
    #[serde(rename = "ASSEMBLY", default)]
    pub assembly: Option<ReferenceAssembly>,
    #[serde(rename = "SEQUENCE", default)]
    pub sequences: Vec<RecordRef>,
    #[serde(rename = "EXPERIMENT_TYPE", default)]
    pub experiment_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceAssembly {
    #[serde(rename = "STANDARD", default)]
    pub standard: Option<RecordRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisFiles {
    #[serde(rename = "FILE", default)]
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRecord {
    #[serde(rename = "@filename")]
    pub filename: String,
    #[serde(rename = "@filetype", default)]
    pub filetype: Option<String>,
    #[serde(rename = "@checksum_method", default)]
    pub checksum_method: Option<String>,
    #[serde(rename = "@checksum", default)]
    pub checksum: Option<String>,
    #[serde(rename = "@unencrypted_checksum", default)]
    pub unencrypted_checksum: Option<String>,
}

impl AnalysisType {
    /// First present category in priority order; later ones are ignored.
    pub fn reference_category(&self) -> Option<&ReferenceCategory> {
        self.reference_alignment
            .as_ref()
            .or(self.sequence_variation.as_ref())
            .or(self.processed_reads.as_ref())
    }
}

impl SraRecord for AnalysisRecord {
    const ELEMENT: &'static str = "ANALYSIS";
    const SET_ELEMENT: &'static str = "ANALYSIS_SET";
    type Set = AnalysisSet;

    fn into_entries(set: AnalysisSet) -> Vec<Self> {
        set.analyses
    }

    fn record_accession(&self) -> Option<&str> {
        self.accession.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Assembly

#[derive(Debug, Clone, Deserialize)]
pub struct AssemblySet {
    #[serde(rename = "ASSEMBLY", default)]
    pub assemblies: Vec<AssemblyRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssemblyRecord {
    #[serde(rename = "@accession", default)]
    pub accession: Option<String>,
    #[serde(rename = "@alias", default)]
    pub alias: Option<String>,
    #[serde(rename = "NAME", default)]
    pub name: Option<String>,
    #[serde(rename = "TITLE", default)]
    pub title: Option<String>,
    #[serde(rename = "TAXON", default)]
    pub taxon: Option<TaxonRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonRecord {
    #[serde(rename = "TAXON_ID", default)]
    pub taxon_id: Option<String>,
    #[serde(rename = "SCIENTIFIC_NAME", default)]
    pub scientific_name: Option<String>,
    #[serde(rename = "COMMON_NAME", default)]
    pub common_name: Option<String>,
}

impl SraRecord for AssemblyRecord {
    const ELEMENT: &'static str = "ASSEMBLY";
    const SET_ELEMENT: &'static str = "ASSEMBLY_SET";
    type Set = AssemblySet;

    fn into_entries(set: AssemblySet) -> Vec<Self> {
        set.assemblies
    }

    fn record_accession(&self) -> Option<&str> {
        self.accession.as_deref()
    }
}
