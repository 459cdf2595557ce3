use tracing::info;

use crate::document::parse_sample_links;
use crate::domain::{DocumentKind, IdentifierSet, ProjectId};
use crate::ena::MetadataFetcher;
use crate::error::ResolverError;
use crate::range::RangeExpander;

pub const DEFAULT_SAMPLE_DB: &str = "ENA-SAMPLE";

/// Returns the single sample range string linked from the project record.
pub fn fetch_sample_link<F: MetadataFetcher + ?Sized>(
    project: &ProjectId,
    fetcher: &F,
    sample_db: &str,
) -> Result<String, ResolverError> {
    let xml = fetcher.fetch_document(project.as_str(), DocumentKind::Project)?;
    let mut links = parse_sample_links(project.as_str(), &xml, sample_db)?;
    match links.len() {
        0 => Err(ResolverError::SampleLinkNotFound {
            project: project.to_string(),
            db: sample_db.to_string(),
        }),
        1 => Ok(links.remove(0)),
        count => Err(ResolverError::AmbiguousSampleLink {
            project: project.to_string(),
            db: sample_db.to_string(),
            count,
        }),
    }
}

pub fn resolve_project_samples<F: MetadataFetcher + ?Sized>(
    project: &ProjectId,
    fetcher: &F,
    sample_db: &str,
    expander: &RangeExpander,
) -> Result<IdentifierSet, ResolverError> {
    let link = fetch_sample_link(project, fetcher, sample_db)?;
    info!(project = %project, samples = %link, "found sample link");
    expander.expand(&link)
}
