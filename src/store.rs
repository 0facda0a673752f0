use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

use crate::domain::AccessionVersionId;
use crate::error::KiraError;
use crate::model::{
    Analysis, File, Project, Publication, ReferenceSequence, Sample, Study, StudyRef, Taxonomy,
    WebResource,
};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS taxonomy (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    taxonomy_id INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS publication (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    publication_id TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS web_resource (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NOT NULL,
    resource_url TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS study (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    accession TEXT NOT NULL,
    version INTEGER NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    center TEXT NOT NULL,
    release_date TEXT NOT NULL,
    taxonomy_id INTEGER REFERENCES taxonomy(id),
    UNIQUE (accession, version)
);
CREATE TABLE IF NOT EXISTS study_publications (
    study_id INTEGER NOT NULL REFERENCES study(id),
    publication_id INTEGER NOT NULL REFERENCES publication(id),
    PRIMARY KEY (study_id, publication_id)
);
CREATE TABLE IF NOT EXISTS study_resources (
    study_id INTEGER NOT NULL REFERENCES study(id),
    resource_id INTEGER NOT NULL REFERENCES web_resource(id),
    PRIMARY KEY (study_id, resource_id)
);
CREATE TABLE IF NOT EXISTS project (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    accession TEXT NOT NULL,
    version INTEGER NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    center TEXT NOT NULL,
    release_date TEXT NOT NULL,
    study_id INTEGER REFERENCES study(id),
    UNIQUE (accession, version)
);
CREATE TABLE IF NOT EXISTS project_publications (
    project_id INTEGER NOT NULL REFERENCES project(id),
    publication_id INTEGER NOT NULL REFERENCES publication(id),
    PRIMARY KEY (project_id, publication_id)
);
CREATE TABLE IF NOT EXISTS project_resources (
    project_id INTEGER NOT NULL REFERENCES project(id),
    resource_id INTEGER NOT NULL REFERENCES web_resource(id),
    PRIMARY KEY (project_id, resource_id)
);
CREATE TABLE IF NOT EXISTS reference_sequence (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    accession TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    patch TEXT,
    type TEXT NOT NULL,
    taxonomy_id INTEGER REFERENCES taxonomy(id)
);
CREATE TABLE IF NOT EXISTS sample (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    accession TEXT NOT NULL,
    version INTEGER NOT NULL,
    name TEXT NOT NULL,
    bio_sample_accession TEXT,
    UNIQUE (accession, version)
);
CREATE TABLE IF NOT EXISTS analysis (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    accession TEXT NOT NULL,
    version INTEGER NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    technology TEXT NOT NULL,
    study_id INTEGER REFERENCES study(id),
    UNIQUE (accession, version)
);
CREATE TABLE IF NOT EXISTS file (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    analysis_id INTEGER NOT NULL REFERENCES analysis(id),
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    hash TEXT NOT NULL,
    UNIQUE (analysis_id, position)
);
CREATE TABLE IF NOT EXISTS analysis_reference_sequences (
    analysis_id INTEGER NOT NULL REFERENCES analysis(id),
    reference_sequence_id INTEGER NOT NULL REFERENCES reference_sequence(id),
    position INTEGER NOT NULL,
    PRIMARY KEY (analysis_id, position)
);
CREATE TABLE IF NOT EXISTS analysis_samples (
    analysis_id INTEGER NOT NULL REFERENCES analysis(id),
    sample_id INTEGER NOT NULL REFERENCES sample(id),
    position INTEGER NOT NULL,
    PRIMARY KEY (analysis_id, position)
);
"#;

/// Outcome of an insert that may lose a natural-key race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    Inserted(i64),
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub taxonomies: u64,
    pub publications: u64,
    pub web_resources: u64,
    pub studies: u64,
    pub projects: u64,
    pub analyses: u64,
    pub reference_sequences: u64,
    pub samples: u64,
    pub files: u64,
}

/// SQLite-backed metadata catalog.
#[derive(Debug)]
pub struct Store {
    conn: Mutex<Connection>,
    path: Option<Utf8PathBuf>,
}

impl Store {
    pub fn open(path: &Utf8Path) -> Result<Self, KiraError> {
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
        {
            std::fs::create_dir_all(parent.as_std_path())
                .map_err(|err| KiraError::Storage(format!("create {parent}: {err}")))?;
        }
        let conn = Connection::open(path.as_std_path())?;
        let store = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, KiraError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    fn initialize(&self) -> Result<(), KiraError> {
        let conn = self.conn()?;
        conn.busy_timeout(Duration::from_secs(10))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        // ignored for in-memory databases
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, KiraError> {
        self.conn
            .lock()
            .map_err(|_| KiraError::Storage("catalog connection mutex poisoned".to_string()))
    }

    pub fn counts(&self) -> Result<CatalogCounts, KiraError> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<u64, KiraError> {
            let value: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
            Ok(value as u64)
        };
        Ok(CatalogCounts {
            taxonomies: count("taxonomy")?,
            publications: count("publication")?,
            web_resources: count("web_resource")?,
            studies: count("study")?,
            projects: count("project")?,
            analyses: count("analysis")?,
            reference_sequences: count("reference_sequence")?,
            samples: count("sample")?,
            files: count("file")?,
        })
    }

    // -----------------------------------------------------------------------
    // Taxonomy

    pub fn find_taxonomy(&self, taxonomy_id: i64) -> Result<Option<Taxonomy>, KiraError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, taxonomy_id, name FROM taxonomy WHERE taxonomy_id = ?1",
                params![taxonomy_id],
                taxonomy_from_row,
            )
            .optional()?)
    }

    pub fn insert_taxonomy(&self, taxonomy: &Taxonomy) -> Result<Insert, KiraError> {
        let conn = self.conn()?;
        insert_row(
            &conn,
            "INSERT INTO taxonomy (taxonomy_id, name) VALUES (?1, ?2)",
            params![taxonomy.taxonomy_id, taxonomy.name],
        )
    }

    // -----------------------------------------------------------------------
    // Publication / WebResource

    pub fn find_publication(&self, publication_id: &str) -> Result<Option<Publication>, KiraError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, publication_id FROM publication WHERE publication_id = ?1",
                params![publication_id],
                publication_from_row,
            )
            .optional()?)
    }

    pub fn insert_publication(&self, publication: &Publication) -> Result<Insert, KiraError> {
        let conn = self.conn()?;
        insert_row(
            &conn,
            "INSERT INTO publication (publication_id) VALUES (?1)",
            params![publication.publication_id],
        )
    }

    pub fn find_web_resource(&self, resource_url: &str) -> Result<Option<WebResource>, KiraError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, type, resource_url FROM web_resource WHERE resource_url = ?1",
                params![resource_url],
                web_resource_from_row,
            )
            .optional()?)
    }

    pub fn insert_web_resource(&self, resource: &WebResource) -> Result<Insert, KiraError> {
        let conn = self.conn()?;
        insert_row(
            &conn,
            "INSERT INTO web_resource (type, resource_url) VALUES (?1, ?2)",
            params![resource.kind.as_str(), resource.resource_url],
        )
    }

    // -----------------------------------------------------------------------
    // Study / Project

    pub fn find_study(&self, key: &AccessionVersionId) -> Result<Option<Study>, KiraError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, accession, version, name, description, center, release_date, taxonomy_id
                 FROM study WHERE accession = ?1 AND version = ?2",
                params![key.accession, key.version],
                |row| {
                    Ok((
                        Study {
                            id: Some(row.get(0)?),
                            accession_version_id: AccessionVersionId::new(
                                row.get::<_, String>(1)?,
                                row.get(2)?,
                            ),
                            name: row.get(3)?,
                            description: row.get(4)?,
                            center: row.get(5)?,
                            release_date: row.get(6)?,
                            taxonomy: None,
                            publications: Vec::new(),
                            resources: Vec::new(),
                            analyses: Vec::new(),
                        },
                        row.get::<_, Option<i64>>(7)?,
                    ))
                },
            )
            .optional()?;
        let Some((mut study, taxonomy_row)) = row else {
            return Ok(None);
        };
        let id = study.id.unwrap_or_default();
        study.taxonomy = load_taxonomy(&conn, taxonomy_row)?;
        study.publications = load_publications(&conn, "study_publications", "study_id", id)?;
        study.resources = load_resources(&conn, "study_resources", "study_id", id)?;
        Ok(Some(study))
    }

    pub fn insert_study(&self, study: &Study) -> Result<Insert, KiraError> {
        let taxonomy_id = study
            .taxonomy
            .as_ref()
            .map(|taxonomy| persisted_id(taxonomy.id, "taxonomy"))
            .transpose()?;
        let publication_ids = publication_ids(&study.publications)?;
        let resource_ids = resource_ids(&study.resources)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let id = match insert_row(
            &tx,
            "INSERT INTO study (accession, version, name, description, center, release_date, taxonomy_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                study.accession_version_id.accession,
                study.accession_version_id.version,
                study.name,
                study.description,
                study.center,
                study.release_date,
                taxonomy_id,
            ],
        )? {
            Insert::Inserted(id) => id,
            Insert::Duplicate => return Ok(Insert::Duplicate),
        };
        link_rows(&tx, "study_publications", "study_id", "publication_id", id, &publication_ids)?;
        link_rows(&tx, "study_resources", "study_id", "resource_id", id, &resource_ids)?;
        tx.commit()?;
        Ok(Insert::Inserted(id))
    }

    pub fn find_project(&self, key: &AccessionVersionId) -> Result<Option<Project>, KiraError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT p.id, p.accession, p.version, p.name, p.description, p.center,
                        p.release_date, s.id, s.accession, s.version
                 FROM project p LEFT JOIN study s ON s.id = p.study_id
                 WHERE p.accession = ?1 AND p.version = ?2",
                params![key.accession, key.version],
                |row| {
                    let study = match row.get::<_, Option<i64>>(7)? {
                        Some(id) => Some(StudyRef {
                            id,
                            accession_version_id: AccessionVersionId::new(
                                row.get::<_, String>(8)?,
                                row.get(9)?,
                            ),
                        }),
                        None => None,
                    };
                    Ok(Project {
                        id: Some(row.get(0)?),
                        accession_version_id: AccessionVersionId::new(
                            row.get::<_, String>(1)?,
                            row.get(2)?,
                        ),
                        name: row.get(3)?,
                        description: row.get(4)?,
                        center: row.get(5)?,
                        release_date: row.get(6)?,
                        study,
                        publications: Vec::new(),
                        resources: Vec::new(),
                    })
                },
            )
            .optional()?;
        let Some(mut project) = row else {
            return Ok(None);
        };
        let id = project.id.unwrap_or_default();
        project.publications =
            load_publications(&conn, "project_publications", "project_id", id)?;
        project.resources = load_resources(&conn, "project_resources", "project_id", id)?;
        Ok(Some(project))
    }

    pub fn insert_project(&self, project: &Project) -> Result<Insert, KiraError> {
        let study_id = project.study.as_ref().map(|study| study.id);
        let publication_ids = publication_ids(&project.publications)?;
        let resource_ids = resource_ids(&project.resources)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let id = match insert_row(
            &tx,
            "INSERT INTO project (accession, version, name, description, center, release_date, study_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.accession_version_id.accession,
                project.accession_version_id.version,
                project.name,
                project.description,
                project.center,
                project.release_date,
                study_id,
            ],
        )? {
            Insert::Inserted(id) => id,
            Insert::Duplicate => return Ok(Insert::Duplicate),
        };
        link_rows(&tx, "project_publications", "project_id", "publication_id", id, &publication_ids)?;
        link_rows(&tx, "project_resources", "project_id", "resource_id", id, &resource_ids)?;
        tx.commit()?;
        Ok(Insert::Inserted(id))
    }

    // -----------------------------------------------------------------------
    // ReferenceSequence / Sample

    pub fn find_reference_sequence(
        &self,
        accession: &str,
    ) -> Result<Option<ReferenceSequence>, KiraError> {
        let conn = self.conn()?;
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM reference_sequence WHERE accession = ?1",
                params![accession],
                |row| row.get(0),
            )
            .optional()?;
        match id {
            Some(id) => load_reference_sequence(&conn, id),
            None => Ok(None),
        }
    }

    pub fn insert_reference_sequence(
        &self,
        reference_sequence: &ReferenceSequence,
    ) -> Result<Insert, KiraError> {
        let taxonomy_id = reference_sequence
            .taxonomy
            .as_ref()
            .map(|taxonomy| persisted_id(taxonomy.id, "taxonomy"))
            .transpose()?;
        let conn = self.conn()?;
        insert_row(
            &conn,
            "INSERT INTO reference_sequence (accession, name, patch, type, taxonomy_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reference_sequence.accession,
                reference_sequence.name,
                reference_sequence.patch,
                reference_sequence.kind.as_str(),
                taxonomy_id,
            ],
        )
    }

    pub fn find_sample(&self, key: &AccessionVersionId) -> Result<Option<Sample>, KiraError> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, accession, version, name, bio_sample_accession
                 FROM sample WHERE accession = ?1 AND version = ?2",
                params![key.accession, key.version],
                sample_from_row,
            )
            .optional()?)
    }

    pub fn insert_sample(&self, sample: &Sample) -> Result<Insert, KiraError> {
        let conn = self.conn()?;
        insert_row(
            &conn,
            "INSERT INTO sample (accession, version, name, bio_sample_accession)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                sample.accession_version_id.accession,
                sample.accession_version_id.version,
                sample.name,
                sample.bio_sample_accession,
            ],
        )
    }

    // -----------------------------------------------------------------------
    // Analysis

    pub fn find_analysis(&self, key: &AccessionVersionId) -> Result<Option<Analysis>, KiraError> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT a.id, a.accession, a.version, a.name, a.description, a.technology,
                        s.id, s.accession, s.version
                 FROM analysis a LEFT JOIN study s ON s.id = a.study_id
                 WHERE a.accession = ?1 AND a.version = ?2",
                params![key.accession, key.version],
                |row| {
                    let study = match row.get::<_, Option<i64>>(6)? {
                        Some(id) => Some(StudyRef {
                            id,
                            accession_version_id: AccessionVersionId::new(
                                row.get::<_, String>(7)?,
                                row.get(8)?,
                            ),
                        }),
                        None => None,
                    };
                    Ok(Analysis {
                        id: Some(row.get(0)?),
                        accession_version_id: AccessionVersionId::new(
                            row.get::<_, String>(1)?,
                            row.get(2)?,
                        ),
                        name: row.get(3)?,
                        description: row.get(4)?,
                        technology: parse_column(row, 5)?,
                        files: Vec::new(),
                        reference_sequences: Vec::new(),
                        samples: Vec::new(),
                        study,
                    })
                },
            )
            .optional()?;
        let Some(mut analysis) = row else {
            return Ok(None);
        };
        let id = analysis.id.unwrap_or_default();

        let mut stmt = conn.prepare(
            "SELECT id, name, type, hash FROM file WHERE analysis_id = ?1 ORDER BY position",
        )?;
        analysis.files = stmt
            .query_map(params![id], |row| {
                Ok(File {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    kind: parse_column(row, 2)?,
                    hash: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT reference_sequence_id FROM analysis_reference_sequences
             WHERE analysis_id = ?1 ORDER BY position",
        )?;
        let reference_ids = stmt
            .query_map(params![id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        for reference_id in reference_ids {
            if let Some(reference) = load_reference_sequence(&conn, reference_id)? {
                analysis.reference_sequences.push(reference);
            }
        }

        let mut stmt = conn.prepare(
            "SELECT s.id, s.accession, s.version, s.name, s.bio_sample_accession
             FROM analysis_samples j JOIN sample s ON s.id = j.sample_id
             WHERE j.analysis_id = ?1 ORDER BY j.position",
        )?;
        analysis.samples = stmt
            .query_map(params![id], sample_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(analysis))
    }

    /// Inserts the analysis row, its files and its reference/sample links in
    /// one transaction. Referenced entities must already be persisted.
    pub fn insert_analysis(&self, analysis: &Analysis) -> Result<Insert, KiraError> {
        let study_id = analysis.study.as_ref().map(|study| study.id);
        let reference_ids = analysis
            .reference_sequences
            .iter()
            .map(|reference| persisted_id(reference.id, "reference sequence"))
            .collect::<Result<Vec<_>, _>>()?;
        let sample_ids = analysis
            .samples
            .iter()
            .map(|sample| persisted_id(sample.id, "sample"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let id = match insert_row(
            &tx,
            "INSERT INTO analysis (accession, version, name, description, technology, study_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                analysis.accession_version_id.accession,
                analysis.accession_version_id.version,
                analysis.name,
                analysis.description,
                analysis.technology.as_str(),
                study_id,
            ],
        )? {
            Insert::Inserted(id) => id,
            Insert::Duplicate => return Ok(Insert::Duplicate),
        };
        for (position, file) in analysis.files.iter().enumerate() {
            tx.execute(
                "INSERT INTO file (analysis_id, position, name, type, hash)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, position as i64, file.name, file.kind.as_str(), file.hash],
            )?;
        }
        for (position, reference_id) in reference_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO analysis_reference_sequences (analysis_id, reference_sequence_id, position)
                 VALUES (?1, ?2, ?3)",
                params![id, reference_id, position as i64],
            )?;
        }
        for (position, sample_id) in sample_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO analysis_samples (analysis_id, sample_id, position)
                 VALUES (?1, ?2, ?3)",
                params![id, sample_id, position as i64],
            )?;
        }
        tx.commit()?;
        Ok(Insert::Inserted(id))
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == rusqlite::ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

fn insert_row(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Insert, KiraError> {
    match conn.execute(sql, params) {
        Ok(_) => Ok(Insert::Inserted(conn.last_insert_rowid())),
        Err(err) if is_unique_violation(&err) => Ok(Insert::Duplicate),
        Err(err) => Err(err.into()),
    }
}

fn link_rows(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    target_column: &str,
    owner_id: i64,
    target_ids: &[i64],
) -> Result<(), KiraError> {
    let sql = format!(
        "INSERT OR IGNORE INTO {table} ({owner_column}, {target_column}) VALUES (?1, ?2)"
    );
    for target_id in target_ids {
        conn.execute(&sql, params![owner_id, target_id])?;
    }
    Ok(())
}

fn persisted_id(id: Option<i64>, what: &str) -> Result<i64, KiraError> {
    id.ok_or_else(|| KiraError::Storage(format!("{what} must be persisted before it is linked")))
}

fn publication_ids(publications: &[Publication]) -> Result<Vec<i64>, KiraError> {
    publications
        .iter()
        .map(|publication| persisted_id(publication.id, "publication"))
        .collect()
}

fn resource_ids(resources: &[WebResource]) -> Result<Vec<i64>, KiraError> {
    resources
        .iter()
        .map(|resource| persisted_id(resource.id, "web resource"))
        .collect()
}

fn parse_column<T>(row: &Row<'_>, index: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = KiraError>,
{
    let value: String = row.get(index)?;
    value
        .parse()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

fn taxonomy_from_row(row: &Row<'_>) -> rusqlite::Result<Taxonomy> {
    Ok(Taxonomy {
        id: Some(row.get(0)?),
        taxonomy_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn publication_from_row(row: &Row<'_>) -> rusqlite::Result<Publication> {
    Ok(Publication {
        id: Some(row.get(0)?),
        publication_id: row.get(1)?,
    })
}

fn web_resource_from_row(row: &Row<'_>) -> rusqlite::Result<WebResource> {
    Ok(WebResource {
        id: Some(row.get(0)?),
        kind: parse_column(row, 1)?,
        resource_url: row.get(2)?,
    })
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<Sample> {
    Ok(Sample {
        id: Some(row.get(0)?),
        accession_version_id: AccessionVersionId::new(row.get::<_, String>(1)?, row.get(2)?),
        name: row.get(3)?,
        bio_sample_accession: row.get(4)?,
    })
}

fn load_taxonomy(conn: &Connection, id: Option<i64>) -> Result<Option<Taxonomy>, KiraError> {
    let Some(id) = id else {
        return Ok(None);
    };
    Ok(conn
        .query_row(
            "SELECT id, taxonomy_id, name FROM taxonomy WHERE id = ?1",
            params![id],
            taxonomy_from_row,
        )
        .optional()?)
}

fn load_reference_sequence(
    conn: &Connection,
    id: i64,
) -> Result<Option<ReferenceSequence>, KiraError> {
    let row = conn
        .query_row(
            "SELECT id, accession, name, patch, type, taxonomy_id
             FROM reference_sequence WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    ReferenceSequence {
                        id: Some(row.get(0)?),
                        accession: row.get(1)?,
                        name: row.get(2)?,
                        patch: row.get(3)?,
                        kind: parse_column(row, 4)?,
                        taxonomy: None,
                    },
                    row.get::<_, Option<i64>>(5)?,
                ))
            },
        )
        .optional()?;
    let Some((mut reference, taxonomy_row)) = row else {
        return Ok(None);
    };
    reference.taxonomy = load_taxonomy(conn, taxonomy_row)?;
    Ok(Some(reference))
}

fn load_publications(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    owner_id: i64,
) -> Result<Vec<Publication>, KiraError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT p.id, p.publication_id FROM {table} j
         JOIN publication p ON p.id = j.publication_id
         WHERE j.{owner_column} = ?1 ORDER BY p.id"
    ))?;
    let rows = stmt
        .query_map(params![owner_id], publication_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_resources(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    owner_id: i64,
) -> Result<Vec<WebResource>, KiraError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT r.id, r.type, r.resource_url FROM {table} j
         JOIN web_resource r ON r.id = j.resource_id
         WHERE j.{owner_column} = ?1 ORDER BY r.id"
    ))?;
    let rows = stmt
        .query_map(params![owner_id], web_resource_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
