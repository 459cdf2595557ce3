use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResolverError;

/// Project accessions accepted by the ENA browser API (BioProject or study).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = ResolverError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let digits = ["PRJEB", "PRJNA", "PRJDB", "ERP", "SRP", "DRP"]
            .iter()
            .find_map(|prefix| normalized.strip_prefix(prefix));
        let is_valid = digits
            .map(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
            .unwrap_or(false);
        if !is_valid {
            return Err(ResolverError::InvalidProjectId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Project,
    Experiment,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Project => write!(f, "project"),
            DocumentKind::Experiment => write!(f, "experiment"),
        }
    }
}

/// Shape of a well-formed accession: a literal prefix and a fixed number of
/// zero-padded digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessionPattern {
    pub prefix: String,
    pub width: usize,
}

impl AccessionPattern {
    pub const MAX_WIDTH: usize = 18;

    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
        }
    }

    /// Rejects an empty prefix and widths outside `1..=MAX_WIDTH`; a wider
    /// number would not fit in `u64`.
    pub fn validate(&self) -> Result<(), ResolverError> {
        if self.prefix.is_empty() {
            return Err(ResolverError::InvalidConfig(
                "sample_prefix must not be empty".to_string(),
            ));
        }
        if self.width == 0 || self.width > Self::MAX_WIDTH {
            return Err(ResolverError::InvalidConfig(format!(
                "sample_width must be between 1 and {}, got {}",
                Self::MAX_WIDTH,
                self.width
            )));
        }
        Ok(())
    }

    pub fn render(&self, number: u64) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.width)
    }
}

impl Default for AccessionPattern {
    fn default() -> Self {
        Self::new("ERS", 6)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierToken {
    Single(String),
    Range { start: u64, end: u64 },
}

/// Deduplicated accessions, iterated in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentifierSet(BTreeSet<String>);

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for IdentifierSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub owning_id: String,
    pub alias: String,
    pub run_accession: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEntry {
    pub sample_accession: String,
    pub member_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRecord {
    pub sample_accession: String,
    pub file_id: String,
    pub run_accession: String,
}

impl ResolvedRecord {
    pub fn new(
        sample_accession: impl Into<String>,
        file_id: impl Into<String>,
        run_accession: impl Into<String>,
    ) -> Self {
        Self {
            sample_accession: sample_accession.into(),
            file_id: file_id.into(),
            run_accession: run_accession.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedWarning {
    pub sample_accession: String,
    pub file_id: String,
}

impl UnresolvedWarning {
    pub fn new(sample_accession: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            sample_accession: sample_accession.into(),
            file_id: file_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Resolution {
    Resolved(ResolvedRecord),
    Unresolved(UnresolvedWarning),
}

impl Resolution {
    pub fn sample_accession(&self) -> &str {
        match self {
            Resolution::Resolved(record) => &record.sample_accession,
            Resolution::Unresolved(warning) => &warning.sample_accession,
        }
    }
}
