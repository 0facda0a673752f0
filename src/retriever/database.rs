use std::io::Read;
use std::sync::Mutex;

use camino::Utf8Path;
use flate2::read::GzDecoder;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use super::XmlRetriever;
use crate::domain::Accession;
use crate::error::KiraError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Reads XML documents from a local SRA metadata dump.
///
/// The dump is a SQLite file with a `sra_object(accession, xml)` table. The
/// `xml` column may hold text or a blob; gzip-compressed blobs are inflated.
#[derive(Debug)]
pub struct DatabaseXmlRetriever {
    conn: Mutex<Connection>,
}

impl DatabaseXmlRetriever {
    pub fn open(path: &Utf8Path) -> Result<Self, KiraError> {
        let conn = Connection::open_with_flags(
            path.as_std_path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl XmlRetriever for DatabaseXmlRetriever {
    fn get_xml(&self, accession: &Accession) -> Result<String, KiraError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| KiraError::retrieval(accession, "source connection mutex poisoned"))?;
        let bytes: Option<Vec<u8>> = conn
            .query_row(
                "SELECT xml FROM sra_object WHERE accession = ?1",
                params![accession.as_str()],
                |row| {
                    Ok(match row.get_ref(0)? {
                        ValueRef::Text(text) | ValueRef::Blob(text) => Some(text.to_vec()),
                        _ => None,
                    })
                },
            )
            .optional()
            .map_err(|err| KiraError::retrieval(accession, err))?
            .flatten();
        let Some(bytes) = bytes else {
            return Err(KiraError::retrieval(accession, "no XML in source database"));
        };
        let xml = decode(&bytes).map_err(|message| KiraError::retrieval(accession, message))?;
        if xml.trim().is_empty() {
            return Err(KiraError::retrieval(accession, "empty XML in source database"));
        }
        Ok(xml)
    }
}

fn decode(bytes: &[u8]) -> Result<String, String> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut xml = String::new();
        GzDecoder::new(bytes)
            .read_to_string(&mut xml)
            .map_err(|err| format!("gzip: {err}"))?;
        return Ok(xml);
    }
    String::from_utf8(bytes.to_vec()).map_err(|err| format!("utf-8: {err}"))
}
