#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use kira_metadata_loader::domain::Accession;
use kira_metadata_loader::error::KiraError;
use kira_metadata_loader::importer::{ImportDirection, ObjectsImporter};
use kira_metadata_loader::retriever::XmlRetriever;
use kira_metadata_loader::store::Store;

/// In-memory XML source keyed by accession; clones share documents and call log.
#[derive(Clone, Default)]
pub struct MapRetriever {
    documents: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MapRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, accession: &str, xml: impl Into<String>) -> Self {
        self.insert(accession, xml);
        self
    }

    pub fn insert(&self, accession: &str, xml: impl Into<String>) {
        self.documents
            .lock()
            .unwrap()
            .insert(accession.to_string(), xml.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl XmlRetriever for MapRetriever {
    fn get_xml(&self, accession: &Accession) -> Result<String, KiraError> {
        self.calls.lock().unwrap().push(accession.to_string());
        self.documents
            .lock()
            .unwrap()
            .get(accession.as_str())
            .cloned()
            .ok_or_else(|| KiraError::Retrieval {
                accession: accession.to_string(),
                message: "not found".to_string(),
            })
    }
}

pub fn importer(
    retriever: MapRetriever,
    direction: ImportDirection,
) -> ObjectsImporter<MapRetriever> {
    ObjectsImporter::new(retriever, Store::in_memory().unwrap(), direction)
}

pub fn acc(value: &str) -> Accession {
    value.parse().unwrap()
}

pub fn study_xml(accession: &str, analyses: &[&str]) -> String {
    let analysis_link = if analyses.is_empty() {
        String::new()
    } else {
        format!(
            "<STUDY_LINK><XREF_LINK><DB>ENA-ANALYSIS</DB><ID>{}</ID></XREF_LINK></STUDY_LINK>",
            analyses.join(",")
        )
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<STUDY_SET>
  <STUDY accession="{accession}" alias="{accession}_ALIAS" center_name="SC">
    <DESCRIPTOR>
      <STUDY_TITLE>Study {accession}</STUDY_TITLE>
      <STUDY_ABSTRACT>Abstract of {accession}</STUDY_ABSTRACT>
    </DESCRIPTOR>
    <STUDY_LINKS>
      <STUDY_LINK><XREF_LINK><DB>PUBMED</DB><ID>25000000</ID></XREF_LINK></STUDY_LINK>
      <STUDY_LINK><URL_LINK><LABEL>Home</LABEL><URL>https://example.org/{accession}</URL></URL_LINK></STUDY_LINK>
      {analysis_link}
    </STUDY_LINKS>
    <STUDY_ATTRIBUTES>
      <STUDY_ATTRIBUTE><TAG>ENA-FIRST-PUBLIC</TAG><VALUE>2016-01-15</VALUE></STUDY_ATTRIBUTE>
    </STUDY_ATTRIBUTES>
  </STUDY>
</STUDY_SET>"#
    )
}

/// Analysis with a SEQUENCE_VARIATION category pointing at `assembly`.
pub fn analysis_xml(accession: &str, study: &str, assembly: Option<&str>, samples: &[&str]) -> String {
    let standard = assembly
        .map(|assembly| format!(r#"<ASSEMBLY><STANDARD accession="{assembly}"/></ASSEMBLY>"#))
        .unwrap_or_default();
    let category = format!(
        "<SEQUENCE_VARIATION>{standard}<EXPERIMENT_TYPE>Whole genome sequencing</EXPERIMENT_TYPE></SEQUENCE_VARIATION>"
    );
    analysis_xml_with_type(accession, study, &category, samples)
}

pub fn analysis_xml_with_type(
    accession: &str,
    study: &str,
    analysis_type: &str,
    samples: &[&str],
) -> String {
    let sample_refs: String = samples
        .iter()
        .map(|sample| {
            format!(
                r#"<SAMPLE_REF accession="{sample}" label="label-{sample}">
      <IDENTIFIERS><PRIMARY_ID>{sample}</PRIMARY_ID><EXTERNAL_ID namespace="BioSample">SAMEA{sample}</EXTERNAL_ID></IDENTIFIERS>
    </SAMPLE_REF>"#
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ANALYSIS_SET>
  <ANALYSIS accession="{accession}" alias="{accession}_ALIAS" center_name="SC">
    <TITLE>Analysis {accession}</TITLE>
    <STUDY_REF accession="{study}"/>
    <DESCRIPTION>Variants for {accession}</DESCRIPTION>
    {sample_refs}
    <ANALYSIS_TYPE>{analysis_type}</ANALYSIS_TYPE>
    <FILES>
      <FILE filename="{accession}.vcf.gz" filetype="vcf" checksum_method="MD5" checksum="aaa" unencrypted_checksum="bbb"/>
      <FILE filename="{accession}.readme" filetype="readme_file" checksum_method="MD5" checksum="ccc"/>
      <FILE filename="{accession}.vcf.gz.tbi" filetype="tabix" checksum_method="MD5" checksum="ddd"/>
    </FILES>
  </ANALYSIS>
</ANALYSIS_SET>"#
    )
}

pub fn assembly_xml(accession: &str, name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ASSEMBLY_SET>
  <ASSEMBLY accession="{accession}" alias="{name}">
    <NAME>{name}</NAME>
    <TAXON>
      <TAXON_ID>9606</TAXON_ID>
      <SCIENTIFIC_NAME>Homo sapiens</SCIENTIFIC_NAME>
    </TAXON>
  </ASSEMBLY>
</ASSEMBLY_SET>"#
    )
}
