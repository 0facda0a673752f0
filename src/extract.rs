use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::domain::{AccessionVersionId, WebResourceKind};
use crate::model::{File, Publication, Sample, Taxonomy, WebResource};
use crate::xml::{AnalysisRecord, AssemblyRecord, StudyRecord, non_blank};

const PUBMED_DB: &str = "PUBMED";
const ANALYSIS_XREF_DB: &str = "ENA-ANALYSIS";
const BIOSAMPLE_NAMESPACE: &str = "BioSample";

pub fn publications(study: &StudyRecord) -> Vec<Publication> {
    let mut seen = HashSet::new();
    study
        .xref_links()
        .filter(|xref| {
            non_blank(xref.db.as_deref()).is_some_and(|db| db.eq_ignore_ascii_case(PUBMED_DB))
        })
        .filter_map(|xref| non_blank(xref.id.as_deref()))
        .filter(|id| seen.insert(id.to_string()))
        .map(Publication::new)
        .collect()
}

pub fn web_resources(study: &StudyRecord) -> Vec<WebResource> {
    let mut seen = HashSet::new();
    study
        .url_links()
        .filter_map(|link| non_blank(link.url.as_deref()))
        .filter(|url| {
            Url::parse(url)
                .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
                .unwrap_or(false)
        })
        .filter(|url| seen.insert(url.to_string()))
        .map(|url| WebResource::new(WebResourceKind::CenterWeb, url))
        .collect()
}

/// Study XML carries no usable taxon; the configured placeholder is used.
pub fn study_taxonomy(placeholder: Option<&Taxonomy>) -> Option<Taxonomy> {
    placeholder.map(|taxonomy| Taxonomy::new(taxonomy.taxonomy_id, taxonomy.name.clone()))
}

pub fn reference_sequence_taxonomy(assembly: &AssemblyRecord) -> Option<Taxonomy> {
    let taxon = assembly.taxon.as_ref()?;
    let taxonomy_id = non_blank(taxon.taxon_id.as_deref())?.parse::<i64>().ok()?;
    let name = non_blank(taxon.scientific_name.as_deref())
        .or(non_blank(taxon.common_name.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| taxonomy_id.to_string());
    Some(Taxonomy::new(taxonomy_id, name))
}

pub fn files(analysis: &AnalysisRecord) -> Vec<File> {
    analysis
        .files
        .iter()
        .flat_map(|files| files.files.iter())
        .map(crate::convert::file)
        .collect()
}

/// At most one accession: the first present category decides, and it only
/// counts when it carries a standard assembly with an accession.
pub fn reference_sequence_accessions(analysis: &AnalysisRecord) -> Vec<String> {
    analysis
        .analysis_type
        .as_ref()
        .and_then(|kind| kind.reference_category())
        .and_then(|category| category.assembly.as_ref())
        .and_then(|assembly| assembly.standard.as_ref())
        .and_then(|standard| non_blank(standard.accession.as_deref()))
        .map(|accession| vec![accession.to_string()])
        .unwrap_or_default()
}

/// Sample references embedded in an analysis, first occurrence wins. References
/// without an `accession` attribute are skipped.
pub fn sample_references(analysis: &AnalysisRecord) -> Vec<Sample> {
    let mut seen = HashSet::new();
    analysis
        .sample_refs
        .iter()
        .filter_map(|sample_ref| {
            let accession = non_blank(sample_ref.accession.as_deref())?.to_uppercase();
            if !seen.insert(accession.clone()) {
                return None;
            }
            let name = non_blank(sample_ref.label.as_deref())
                .or(non_blank(sample_ref.refname.as_deref()))
                .map(str::to_string)
                .unwrap_or_else(|| accession.clone());
            let bio_sample_accession = sample_ref
                .identifiers
                .iter()
                .flat_map(|ids| ids.external_ids.iter())
                .find(|external| {
                    external
                        .namespace
                        .as_deref()
                        .is_some_and(|ns| ns.trim().eq_ignore_ascii_case(BIOSAMPLE_NAMESPACE))
                })
                .and_then(|external| non_blank(Some(external.value.as_str())))
                .map(str::to_string);
            Some(Sample {
                id: None,
                accession_version_id: AccessionVersionId::new(accession, 1),
                name,
                bio_sample_accession,
            })
        })
        .collect()
}

/// Analysis accessions listed in a study's `ENA-ANALYSIS` cross references.
/// IDs are comma separated and may use `ERZ000001-ERZ000005` ranges.
pub fn analysis_accessions(study: &StudyRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    study
        .xref_links()
        .filter(|xref| {
            non_blank(xref.db.as_deref())
                .is_some_and(|db| db.eq_ignore_ascii_case(ANALYSIS_XREF_DB))
        })
        .filter_map(|xref| non_blank(xref.id.as_deref()))
        .flat_map(|ids| ids.split(','))
        .flat_map(|item| expand_accession_range(item.trim()))
        .filter(|accession| seen.insert(accession.clone()))
        .collect()
}

/// Wider ranges are treated as malformed and left unexpanded.
const MAX_RANGE_SPAN: u64 = 10_000;

static ACCESSION_PARTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)(\d+)$").unwrap());

fn expand_accession_range(item: &str) -> Vec<String> {
    let pattern = &*ACCESSION_PARTS;
    if item.is_empty() {
        return Vec::new();
    }
    let Some((start, end)) = item.split_once('-') else {
        return vec![item.to_uppercase()];
    };
    let (Some(start), Some(end)) = (pattern.captures(start.trim()), pattern.captures(end.trim()))
    else {
        return vec![item.to_uppercase()];
    };
    let prefix = start[1].to_uppercase();
    if !prefix.eq_ignore_ascii_case(&end[1]) {
        return vec![item.to_uppercase()];
    }
    let width = start[2].len();
    let (Ok(first), Ok(last)) = (start[2].parse::<u64>(), end[2].parse::<u64>()) else {
        return vec![item.to_uppercase()];
    };
    if first > last || last - first > MAX_RANGE_SPAN {
        return vec![item.to_uppercase()];
    }
    (first..=last)
        .map(|number| format!("{prefix}{number:0width$}"))
        .collect()
}
