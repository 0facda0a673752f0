pub mod app;
pub mod config;
pub mod convert;
pub mod domain;
pub mod error;
pub mod extract;
pub mod finder;
pub mod importer;
pub mod model;
pub mod output;
pub mod retriever;
pub mod store;
pub mod xml;
