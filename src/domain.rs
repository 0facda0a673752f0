use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

/// Upstream source of the XML documents; also selects the traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    Api,
    Database,
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSource::Api => write!(f, "api"),
            ImportSource::Database => write!(f, "database"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Accession(String);

impl Accession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Accession {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
            && normalized.starts_with(|ch: char| ch.is_ascii_alphabetic());
        if !is_valid {
            return Err(KiraError::InvalidAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Natural key shared by studies, projects, analyses and samples.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessionVersionId {
    pub accession: String,
    pub version: i64,
}

impl AccessionVersionId {
    pub fn new(accession: impl Into<String>, version: i64) -> Self {
        Self {
            accession: accession.into(),
            version,
        }
    }
}

impl fmt::Display for AccessionVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.v{}", self.accession, self.version)
    }
}

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = KiraError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(KiraError::Storage(format!(
                        "unknown {} value: {other}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Technology {
    Gwas,
    ExomeSequencing,
    Wgs,
    Genotyping,
    Array,
    Curation,
    Unspecified,
}

text_enum!(Technology {
    Gwas => "GWAS",
    ExomeSequencing => "EXOME_SEQUENCING",
    Wgs => "WGS",
    Genotyping => "GENOTYPING",
    Array => "ARRAY",
    Curation => "CURATION",
    Unspecified => "UNSPECIFIED",
});

impl Technology {
    /// Maps an SRA `EXPERIMENT_TYPE` value.
    pub fn from_experiment_type(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "exome sequencing" => Technology::ExomeSequencing,
            "whole genome sequencing" => Technology::Wgs,
            "genotyping by array" => Technology::Genotyping,
            "curation" => Technology::Curation,
            _ => Technology::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceSequenceType {
    Sequence,
    Assembly,
    Transcriptome,
}

text_enum!(ReferenceSequenceType {
    Sequence => "SEQUENCE",
    Assembly => "ASSEMBLY",
    Transcriptome => "TRANSCRIPTOME",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileType {
    Vcf,
    Bam,
    Cram,
    Tsv,
    Bed,
    Fasta,
    Readme,
    Other,
}

text_enum!(FileType {
    Vcf => "VCF",
    Bam => "BAM",
    Cram => "CRAM",
    Tsv => "TSV",
    Bed => "BED",
    Fasta => "FASTA",
    Readme => "README",
    Other => "OTHER",
});

impl FileType {
    /// Maps an SRA `filetype` attribute.
    pub fn from_sra(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "vcf" | "vcf_aggregate" => FileType::Vcf,
            "bam" => FileType::Bam,
            "cram" => FileType::Cram,
            "tab" => FileType::Tsv,
            "bed" => FileType::Bed,
            "fasta" => FileType::Fasta,
            "readme_file" => FileType::Readme,
            _ => FileType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebResourceKind {
    CenterWeb,
    ProviderWeb,
}

text_enum!(WebResourceKind {
    CenterWeb => "CENTER_WEB",
    ProviderWeb => "PROVIDER_WEB",
});

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_accession_normalizes_case() {
        let acc: Accession = " erz092698 ".parse().unwrap();
        assert_eq!(acc.as_str(), "ERZ092698");
    }

    #[test]
    fn parse_accession_rejects_garbage() {
        let err = "ERZ 1".parse::<Accession>().unwrap_err();
        assert_matches!(err, KiraError::InvalidAccession(_));
        let err = "".parse::<Accession>().unwrap_err();
        assert_matches!(err, KiraError::InvalidAccession(_));
    }

    #[test]
    fn text_enums_round_trip_through_storage_text() {
        assert_eq!("VCF".parse::<FileType>().unwrap(), FileType::Vcf);
        assert_eq!(Technology::ExomeSequencing.as_str(), "EXOME_SEQUENCING");
        assert!("vcf".parse::<FileType>().is_err());
    }

    #[test]
    fn sra_file_types() {
        assert_eq!(FileType::from_sra("vcf_aggregate"), FileType::Vcf);
        assert_eq!(FileType::from_sra("tab"), FileType::Tsv);
        assert_eq!(FileType::from_sra("phenotype_file"), FileType::Other);
    }
}
