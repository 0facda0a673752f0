use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::ImportSource;
use crate::error::KiraError;
use crate::importer::default_study_taxonomy;
use crate::model::Taxonomy;
use crate::retriever::DEFAULT_ENA_BASE_URL;

pub const DEFAULT_CONFIG_FILE: &str = "kira-ml.json";
pub const DEFAULT_STORE_PATH: &str = "metadata-catalog.db";
const SCHEMA_VERSION: u32 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: usize = 3;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub source: Option<ImportSource>,
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub store: StoreSection,
    /// Absent means the default species; `null` disables study taxonomy.
    #[serde(default = "default_taxonomy_entry")]
    pub study_taxonomy: Option<TaxonomyEntry>,
    #[serde(default)]
    pub abort_on_storage_error: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: None,
            source: None,
            api: ApiSection::default(),
            database: DatabaseSection::default(),
            store: StoreSection::default(),
            study_taxonomy: default_taxonomy_entry(),
            abort_on_storage_error: None,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_retries: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DatabaseSection {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StoreSection {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaxonomyEntry {
    pub id: i64,
    pub name: String,
}

fn default_taxonomy_entry() -> Option<TaxonomyEntry> {
    let taxonomy = default_study_taxonomy();
    Some(TaxonomyEntry {
        id: taxonomy.taxonomy_id,
        name: taxonomy.name,
    })
}

/// Command-line values that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<ImportSource>,
    pub store_path: Option<Utf8PathBuf>,
    pub database_path: Option<Utf8PathBuf>,
    pub api_base_url: Option<String>,
    pub abort_on_storage_error: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub source: ImportSource,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub api_max_retries: usize,
    pub database_path: Option<Utf8PathBuf>,
    pub store_path: Utf8PathBuf,
    pub study_taxonomy: Option<Taxonomy>,
    pub abort_on_storage_error: bool,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: &ConfigOverrides,
    ) -> Result<ResolvedConfig, KiraError> {
        let config = Self::load(path)?;
        Self::resolve_config(config, overrides)
    }

    /// A missing default config file yields the defaults; an explicit path must exist.
    pub fn load(path: Option<&str>) -> Result<Config, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| KiraError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(
        config: Config,
        overrides: &ConfigOverrides,
    ) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(SCHEMA_VERSION);
        if schema_version != SCHEMA_VERSION {
            return Err(KiraError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let source = overrides
            .source
            .or(config.source)
            .unwrap_or(ImportSource::Api);
        let database_path = overrides
            .database_path
            .clone()
            .or_else(|| config.database.path.map(Utf8PathBuf::from));
        if source == ImportSource::Database && database_path.is_none() {
            return Err(KiraError::ConfigParse(
                "the database source requires database.path or --database".to_string(),
            ));
        }

        let api_base_url = overrides
            .api_base_url
            .clone()
            .or(config.api.base_url)
            .unwrap_or_else(|| DEFAULT_ENA_BASE_URL.to_string());

        Ok(ResolvedConfig {
            schema_version,
            source,
            api_base_url,
            api_timeout: Duration::from_secs(
                config.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            api_max_retries: config.api.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            database_path,
            store_path: overrides
                .store_path
                .clone()
                .or_else(|| config.store.path.map(Utf8PathBuf::from))
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STORE_PATH)),
            study_taxonomy: config
                .study_taxonomy
                .map(|entry| Taxonomy::new(entry.id, entry.name)),
            abort_on_storage_error: overrides.abort_on_storage_error
                || config.abort_on_storage_error.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let resolved =
            ConfigLoader::resolve_config(Config::default(), &ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.source, ImportSource::Api);
        assert_eq!(resolved.api_base_url, DEFAULT_ENA_BASE_URL);
        assert_eq!(resolved.store_path, DEFAULT_STORE_PATH);
        assert_eq!(resolved.api_max_retries, 3);
        assert_eq!(resolved.study_taxonomy.unwrap().taxonomy_id, 9606);
        assert!(!resolved.abort_on_storage_error);
    }

    #[test]
    fn null_study_taxonomy_disables_it() {
        let config: Config = serde_json::from_str(r#"{"study_taxonomy": null}"#).unwrap();
        let resolved = ConfigLoader::resolve_config(config, &ConfigOverrides::default()).unwrap();
        assert!(resolved.study_taxonomy.is_none());
    }
}
