mod common;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use rusqlite::Connection;

use common::{MapRetriever, analysis_xml, assembly_xml, importer, study_xml};

use kira_metadata_loader::app::{App, OutcomeStatus};
use kira_metadata_loader::domain::ImportSource;
use kira_metadata_loader::error::{ErrorKind, KiraError};
use kira_metadata_loader::importer::{ImportDirection, ObjectsImporter};
use kira_metadata_loader::output::JsonOutput;
use kira_metadata_loader::store::Store;

const STUDY: &str = "ERP000001";
const GRCH37: &str = "GCA_000001405.1";

fn database_source() -> MapRetriever {
    MapRetriever::new()
        .with(STUDY, study_xml(STUDY, &[]))
        .with(GRCH37, assembly_xml(GRCH37, "GRCh37"))
        .with("ERZ000001", analysis_xml("ERZ000001", STUDY, Some(GRCH37), &["ERS000001"]))
        .with("ERZ000002", "<ANALYSIS_SET><ANALYSIS accession=\"ERZ000002\"></STUDY></ANALYSIS_SET>")
        .with("ERZ000003", analysis_xml("ERZ000003", STUDY, Some(GRCH37), &["ERS000003"]))
}

fn accessions(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn malformed_record_does_not_stop_the_batch() {
    let app = App::new(importer(database_source(), ImportDirection::Database));
    let report = app.import_all(&accessions(&["ERZ000001", "ERZ000002", "ERZ000003"]), &JsonOutput);

    assert_eq!(report.source, ImportSource::Database);
    assert_eq!(report.imported, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 0);
    let failed = &report.outcomes[1];
    assert_eq!(failed.accession, "ERZ000002");
    assert_eq!(failed.status, OutcomeStatus::Failed);
    assert_eq!(failed.error_kind, Some(ErrorKind::Parse));
    assert_eq!(report.outcomes[2].entity.as_deref(), Some("analysis ERZ000003.v1"));
    assert_eq!(app.stats().unwrap().analyses, 2);
}

#[test]
fn invalid_and_unknown_accessions_become_outcomes() {
    let app = App::new(importer(database_source(), ImportDirection::Database));
    let report = app.import_all(&accessions(&["ERZ 1", "ERZ000404", "ERZ000001"]), &JsonOutput);

    assert_eq!(report.outcomes[0].error_kind, Some(ErrorKind::InvalidAccession));
    assert_eq!(report.outcomes[1].error_kind, Some(ErrorKind::Retrieval));
    assert_eq!(report.outcomes[2].status, OutcomeStatus::Imported);
}

#[test]
fn report_serializes_without_empty_fields() {
    let app = App::new(importer(database_source(), ImportDirection::Database));
    let report = app.import_all(&accessions(&["ERZ000001", "ERZ000002"]), &JsonOutput);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["source"], "database");
    assert_eq!(json["outcomes"][0]["status"], "imported");
    assert!(json["outcomes"][0].get("error_kind").is_none());
    assert_eq!(json["outcomes"][1]["error_kind"], "parse");
}

fn broken_store() -> (tempfile::TempDir, Store) {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("catalog.db")).unwrap();
    let store = Store::open(&path).unwrap();
    let conn = Connection::open(path.as_std_path()).unwrap();
    conn.execute_batch("DROP TABLE analysis_samples; DROP TABLE sample;")
        .unwrap();
    (temp, store)
}

#[test]
fn storage_failures_continue_by_default() {
    let (_temp, store) = broken_store();
    let importer = ObjectsImporter::new(database_source(), store, ImportDirection::Database);
    let app = App::new(importer);
    let report = app.import_all(&accessions(&["ERZ000001", "ERZ000003"]), &JsonOutput);

    assert_eq!(report.failed, 2);
    assert!(
        report
            .outcomes
            .iter()
            .all(|outcome| outcome.error_kind == Some(ErrorKind::Storage))
    );
}

#[test]
fn storage_failure_trips_the_breaker_when_enabled() {
    let (_temp, store) = broken_store();
    let importer = ObjectsImporter::new(database_source(), store, ImportDirection::Database);
    let app = App::new(importer).abort_on_storage_error(true);
    let report = app.import_all(
        &accessions(&["ERZ000001", "ERZ000002", "ERZ000003"]),
        &JsonOutput,
    );

    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.outcomes[0].error_kind, Some(ErrorKind::Storage));
    assert_eq!(report.outcomes[2].status, OutcomeStatus::Skipped);
}

#[test]
fn import_file_reads_the_list() {
    let temp = tempfile::tempdir().unwrap();
    let list = temp.path().join("accessions.txt");
    std::fs::write(&list, "# analyses\nERZ000001\nerz000001\n\nERZ000003\n").unwrap();
    let app = App::new(importer(database_source(), ImportDirection::Database));

    let report = app.import_file(&list, &JsonOutput).unwrap();
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.imported, 2);
}

#[test]
fn missing_accession_file_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let app = App::new(importer(database_source(), ImportDirection::Database));
    assert_matches!(
        app.import_file(&temp.path().join("nope.txt"), &JsonOutput),
        Err(KiraError::AccessionFileRead(_))
    );
}
