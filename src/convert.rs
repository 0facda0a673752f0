use chrono::NaiveDate;

use crate::domain::{Accession, AccessionVersionId, FileType, ReferenceSequenceType, Technology};
use crate::model::{Analysis, File, ReferenceSequence, Study};
use crate::xml::{AnalysisRecord, AssemblyRecord, FileRecord, StudyRecord, non_blank};

const FIRST_PUBLIC_TAG: &str = "ENA-FIRST-PUBLIC";
const UNKNOWN_CENTER: &str = "unknown";

/// Release date used for records that are not yet public.
pub fn embargo_release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

pub fn study(record: &StudyRecord, requested: &Accession) -> Study {
    let accession = record_accession(record.accession.as_deref(), requested);
    let descriptor = record.descriptor.clone().unwrap_or_default();
    let title = non_blank(descriptor.title.as_deref());

    let name = non_blank(descriptor.center_project_name.as_deref())
        .or(non_blank(record.alias.as_deref()))
        .or(title)
        .unwrap_or(accession.as_str())
        .to_string();
    let description = non_blank(descriptor.study_abstract.as_deref())
        .or(non_blank(descriptor.description.as_deref()))
        .or(title)
        .unwrap_or_default()
        .to_string();
    let center = non_blank(record.center_name.as_deref())
        .or(non_blank(record.broker_name.as_deref()))
        .unwrap_or(UNKNOWN_CENTER)
        .to_string();
    let release_date = record
        .attribute(FIRST_PUBLIC_TAG)
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .unwrap_or_else(embargo_release_date);

    Study {
        id: None,
        accession_version_id: AccessionVersionId::new(accession, 1),
        name,
        description,
        center,
        release_date,
        taxonomy: None,
        publications: Vec::new(),
        resources: Vec::new(),
        analyses: Vec::new(),
    }
}

pub fn analysis(record: &AnalysisRecord, requested: &Accession) -> Analysis {
    let accession = record_accession(record.accession.as_deref(), requested);
    let name = non_blank(record.title.as_deref())
        .or(non_blank(record.alias.as_deref()))
        .unwrap_or(accession.as_str())
        .to_string();
    let technology = record
        .analysis_type
        .as_ref()
        .and_then(|kind| kind.reference_category())
        .and_then(|category| category.experiment_types.first())
        .map(|value| Technology::from_experiment_type(value))
        .unwrap_or(Technology::Unspecified);

    Analysis {
        id: None,
        accession_version_id: AccessionVersionId::new(accession.clone(), 1),
        name,
        description: non_blank(record.description.as_deref())
            .unwrap_or_default()
            .to_string(),
        technology,
        files: Vec::new(),
        reference_sequences: Vec::new(),
        samples: Vec::new(),
        study: None,
    }
}

pub fn reference_sequence(record: &AssemblyRecord, requested: &Accession) -> ReferenceSequence {
    let accession = record_accession(record.accession.as_deref(), requested);
    let full_name = non_blank(record.name.as_deref())
        .or(non_blank(record.alias.as_deref()))
        .or(non_blank(record.title.as_deref()))
        .unwrap_or(accession.as_str());
    let (name, patch) = split_patch(full_name);

    ReferenceSequence {
        id: None,
        accession,
        name,
        patch,
        kind: ReferenceSequenceType::Assembly,
        taxonomy: None,
    }
}

pub fn file(record: &FileRecord) -> File {
    File {
        id: None,
        name: record.filename.trim().to_string(),
        kind: record
            .filetype
            .as_deref()
            .map(FileType::from_sra)
            .unwrap_or(FileType::Other),
        hash: non_blank(record.unencrypted_checksum.as_deref())
            .or(non_blank(record.checksum.as_deref()))
            .unwrap_or_default()
            .to_string(),
    }
}

fn record_accession(value: Option<&str>, requested: &Accession) -> String {
    non_blank(value)
        .map(str::to_uppercase)
        .unwrap_or_else(|| requested.as_str().to_string())
}

/// `GRCh38.p12` -> (`GRCh38`, `p12`).
fn split_patch(full_name: &str) -> (String, Option<String>) {
    if let Some((name, patch)) = full_name.rsplit_once('.') {
        let is_patch = patch.len() > 1
            && patch.starts_with('p')
            && patch[1..].chars().all(|ch| ch.is_ascii_digit());
        if is_patch && !name.is_empty() {
            return (name.to_string(), Some(patch.to_string()));
        }
    }
    (full_name.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_record;

    #[test]
    fn split_patch_suffix() {
        assert_eq!(
            split_patch("GRCh38.p12"),
            ("GRCh38".to_string(), Some("p12".to_string()))
        );
        assert_eq!(split_patch("GRCh37"), ("GRCh37".to_string(), None));
        assert_eq!(split_patch("Ensembl.v1"), ("Ensembl.v1".to_string(), None));
    }

    #[test]
    fn study_falls_back_to_embargo_date_and_alias() {
        let requested: Accession = "ERP000860".parse().unwrap();
        let xml = r#"<STUDY_SET><STUDY accession="ERP000860" alias="UK10K_OBESITY_SCOOP" center_name="SC">
            <DESCRIPTOR><STUDY_TITLE>Obesity</STUDY_TITLE></DESCRIPTOR>
        </STUDY></STUDY_SET>"#;
        let record: StudyRecord = parse_record(xml, &requested).unwrap();
        let study = study(&record, &requested);
        assert_eq!(study.name, "UK10K_OBESITY_SCOOP");
        assert_eq!(study.description, "Obesity");
        assert_eq!(study.center, "SC");
        assert_eq!(study.release_date, NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
    }

    #[test]
    fn study_reads_first_public_attribute() {
        let requested: Accession = "ERP1".parse().unwrap();
        let xml = r#"<STUDY accession="ERP1"><STUDY_ATTRIBUTES>
            <STUDY_ATTRIBUTE><TAG>ENA-FIRST-PUBLIC</TAG><VALUE>2015-03-02</VALUE></STUDY_ATTRIBUTE>
        </STUDY_ATTRIBUTES></STUDY>"#;
        let record: StudyRecord = parse_record(xml, &requested).unwrap();
        let study = study(&record, &requested);
        assert_eq!(study.release_date, NaiveDate::from_ymd_opt(2015, 3, 2).unwrap());
        assert_eq!(study.name, "ERP1");
        assert_eq!(study.center, "unknown");
    }

    #[test]
    fn file_prefers_unencrypted_checksum() {
        let record = FileRecord {
            filename: "EGAF00001".to_string(),
            filetype: Some("vcf".to_string()),
            checksum_method: Some("MD5".to_string()),
            checksum: Some("encrypted".to_string()),
            unencrypted_checksum: Some("checksum".to_string()),
        };
        let file = file(&record);
        assert_eq!(file.name, "EGAF00001");
        assert_eq!(file.kind, FileType::Vcf);
        assert_eq!(file.hash, "checksum");
    }
}
