mod api;
mod database;

pub use api::{DEFAULT_ENA_BASE_URL, EnaApiRetriever};
pub use database::DatabaseXmlRetriever;

use crate::domain::Accession;
use crate::error::KiraError;

/// Source of raw SRA XML documents, one per accession.
pub trait XmlRetriever: Send + Sync {
    fn get_xml(&self, accession: &Accession) -> Result<String, KiraError>;
}

impl<R: XmlRetriever + ?Sized> XmlRetriever for Box<R> {
    fn get_xml(&self, accession: &Accession) -> Result<String, KiraError> {
        (**self).get_xml(accession)
    }
}
