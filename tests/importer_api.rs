mod common;

use common::{MapRetriever, acc, analysis_xml, assembly_xml, importer, study_xml};

use kira_metadata_loader::app::App;
use kira_metadata_loader::domain::AccessionVersionId;
use kira_metadata_loader::importer::ImportDirection;
use kira_metadata_loader::output::JsonOutput;

const STUDY: &str = "ERP000001";

fn two_analysis_study() -> MapRetriever {
    MapRetriever::new()
        .with(STUDY, study_xml(STUDY, &["ERZ000001-ERZ000002"]))
        .with(
            "ERZ000001",
            analysis_xml("ERZ000001", STUDY, Some("GCA_000001405.1"), &["ERS000001"]),
        )
        .with(
            "ERZ000002",
            analysis_xml("ERZ000002", STUDY, Some("GCA_000001405.15"), &["ERS000002"]),
        )
        .with("GCA_000001405.1", assembly_xml("GCA_000001405.1", "GRCh37"))
        .with("GCA_000001405.15", assembly_xml("GCA_000001405.15", "GRCh38.p12"))
}

#[test]
fn study_with_two_analyses_rerun_keeps_counts() {
    let app = App::new(importer(two_analysis_study(), ImportDirection::Api));
    let batch = vec![STUDY.to_string()];

    let first = app.import_all(&batch, &JsonOutput);
    assert_eq!(first.imported, 1);
    assert_eq!(first.failed, 0);
    let counts = app.stats().unwrap();
    assert_eq!(
        (counts.studies, counts.analyses, counts.reference_sequences),
        (1, 2, 2)
    );

    let second = app.import_all(&batch, &JsonOutput);
    assert_eq!(second.imported, 1);
    assert_eq!(second.failed, 0);
    let rerun = app.stats().unwrap();
    assert_eq!(rerun, counts);
    assert_eq!(rerun.projects, 1);
    assert_eq!(rerun.samples, 2);
    assert_eq!(rerun.taxonomies, 1);
    assert_eq!(rerun.files, 6);
}

#[test]
fn import_study_persists_study_and_links_analyses() {
    let importer = importer(two_analysis_study(), ImportDirection::Api);
    let study = importer.import_study(&acc(STUDY)).unwrap();

    assert!(study.id.is_some());
    assert_eq!(study.name, "ERP000001_ALIAS");
    assert_eq!(study.publications.len(), 1);
    assert_eq!(study.resources.len(), 1);
    assert_eq!(study.analyses.len(), 2);
    for analysis in &study.analyses {
        let link = analysis.study.as_ref().unwrap();
        assert_eq!(Some(link.id), study.id);
    }

    let stored = importer
        .store()
        .find_analysis(&AccessionVersionId::new("ERZ000002", 1))
        .unwrap()
        .unwrap();
    assert_eq!(stored.reference_sequences[0].name, "GRCh38");
    assert_eq!(stored.reference_sequences[0].patch.as_deref(), Some("p12"));
    assert_eq!(
        stored.study.unwrap().accession_version_id.accession,
        STUDY
    );
}

#[test]
fn analyses_sharing_an_assembly_share_one_row() {
    let retriever = MapRetriever::new()
        .with(STUDY, study_xml(STUDY, &["ERZ000001", "ERZ000002"]))
        .with(
            "ERZ000001",
            analysis_xml("ERZ000001", STUDY, Some("GCA_000001405.1"), &["ERS000001"]),
        )
        .with(
            "ERZ000002",
            analysis_xml("ERZ000002", STUDY, Some("GCA_000001405.1"), &["ERS000001"]),
        )
        .with("GCA_000001405.1", assembly_xml("GCA_000001405.1", "GRCh37"));
    let importer = importer(retriever, ImportDirection::Api);
    let study = importer.import_study(&acc(STUDY)).unwrap();

    let counts = importer.store().counts().unwrap();
    assert_eq!(counts.reference_sequences, 1);
    assert_eq!(counts.samples, 1);
    assert_eq!(counts.analyses, 2);
    assert_eq!(
        study.analyses[0].reference_sequences[0].id,
        study.analyses[1].reference_sequences[0].id
    );
}

#[test]
fn analysis_without_reference_sequence_is_skipped() {
    let retriever = MapRetriever::new()
        .with(STUDY, study_xml(STUDY, &["ERZ000001", "ERZ000002", "ERZ000003"]))
        .with(
            "ERZ000001",
            analysis_xml("ERZ000001", STUDY, Some("GCA_000001405.1"), &[]),
        )
        .with("ERZ000002", analysis_xml("ERZ000002", STUDY, None, &[]))
        .with("GCA_000001405.1", assembly_xml("GCA_000001405.1", "GRCh37"));
    let importer = importer(retriever, ImportDirection::Api);
    let study = importer.import_study(&acc(STUDY)).unwrap();

    assert_eq!(study.analyses.len(), 1);
    assert_eq!(study.analyses[0].accession_version_id.accession, "ERZ000001");
    let counts = importer.store().counts().unwrap();
    assert_eq!(counts.analyses, 1);
    assert_eq!(counts.studies, 1);
}

#[test]
fn project_import_is_idempotent() {
    let importer = importer(two_analysis_study(), ImportDirection::Api);
    let first = importer.import_project(&acc(STUDY)).unwrap();
    let second = importer.import_project(&acc(STUDY)).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.name, "ERP000001_ALIAS");
    assert_eq!(first.description, "Abstract of ERP000001");
    assert_eq!(first.publications, second.publications);
    assert!(first.study.is_some());
    assert_eq!(importer.store().counts().unwrap().projects, 1);
}

#[test]
fn study_without_taxonomy_when_disabled() {
    let importer =
        importer(two_analysis_study(), ImportDirection::Api).with_study_taxonomy(None);
    let study = importer.import_study(&acc(STUDY)).unwrap();
    assert!(study.taxonomy.is_none());
    // the assemblies still carry their own taxon
    assert_eq!(importer.store().counts().unwrap().taxonomies, 1);
}
