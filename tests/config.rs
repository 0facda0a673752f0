use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kira_metadata_loader::config::{ConfigLoader, ConfigOverrides};
use kira_metadata_loader::domain::ImportSource;
use kira_metadata_loader::error::KiraError;

fn write_config(content: &str) -> (tempfile::TempDir, String) {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("kira-ml.json");
    std::fs::write(&path, content).unwrap();
    let path = path.to_str().unwrap().to_string();
    (temp, path)
}

#[test]
fn file_values_are_used() {
    let (_temp, path) = write_config(
        r#"{
            "schema_version": 1,
            "source": "database",
            "api": { "base_url": "http://localhost:9000/xml", "timeout_secs": 5, "max_retries": 1 },
            "database": { "path": "sra.sqlite" },
            "store": { "path": "out/catalog.db" },
            "study_taxonomy": { "id": 10090, "name": "Mus musculus" },
            "abort_on_storage_error": true
        }"#,
    );
    let resolved = ConfigLoader::resolve(Some(&path), &ConfigOverrides::default()).unwrap();

    assert_eq!(resolved.source, ImportSource::Database);
    assert_eq!(resolved.api_base_url, "http://localhost:9000/xml");
    assert_eq!(resolved.api_timeout.as_secs(), 5);
    assert_eq!(resolved.api_max_retries, 1);
    assert_eq!(resolved.database_path, Some(Utf8PathBuf::from("sra.sqlite")));
    assert_eq!(resolved.store_path, Utf8PathBuf::from("out/catalog.db"));
    assert_eq!(resolved.study_taxonomy.unwrap().taxonomy_id, 10090);
    assert!(resolved.abort_on_storage_error);
}

#[test]
fn overrides_win_over_the_file() {
    let (_temp, path) = write_config(r#"{ "source": "database", "database": { "path": "a.db" } }"#);
    let overrides = ConfigOverrides {
        source: Some(ImportSource::Api),
        store_path: Some(Utf8PathBuf::from("cli.db")),
        api_base_url: Some("http://mirror/xml".to_string()),
        ..ConfigOverrides::default()
    };
    let resolved = ConfigLoader::resolve(Some(&path), &overrides).unwrap();

    assert_eq!(resolved.source, ImportSource::Api);
    assert_eq!(resolved.store_path, Utf8PathBuf::from("cli.db"));
    assert_eq!(resolved.api_base_url, "http://mirror/xml");
}

#[test]
fn database_source_needs_a_path() {
    let (_temp, path) = write_config(r#"{ "source": "database" }"#);
    assert_matches!(
        ConfigLoader::resolve(Some(&path), &ConfigOverrides::default()),
        Err(KiraError::ConfigParse(_))
    );
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    assert_matches!(
        ConfigLoader::resolve(path.to_str(), &ConfigOverrides::default()),
        Err(KiraError::ConfigRead(_))
    );
}

#[test]
fn unknown_schema_version_is_rejected() {
    let (_temp, path) = write_config(r#"{ "schema_version": 2 }"#);
    assert_matches!(
        ConfigLoader::resolve(Some(&path), &ConfigOverrides::default()),
        Err(KiraError::ConfigParse(_))
    );
}
