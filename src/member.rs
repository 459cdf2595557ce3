use tracing::debug;

use crate::document::parse_pool_members;
use crate::domain::{DocumentKind, MembershipEntry, ResolvedRecord, Resolution, UnresolvedWarning};
use crate::ena::MetadataFetcher;
use crate::error::ResolverError;
use crate::run_index::{RunIndex, run_key};

/// Run alias prefix used by the Sanger submissions this tool was written for
/// (`SC_RUN_5150_1#0`). Other submitters name their runs differently.
pub const DEFAULT_ALIAS_PREFIX: &str = "SC_RUN_";

/// File identifier as it appears in sample sheets: alias prefix removed and
/// `#` replaced with `_`.
pub fn file_id(member_name: &str, alias_prefix: &str) -> String {
    let stripped = if alias_prefix.is_empty() {
        member_name.to_string()
    } else {
        member_name.replace(alias_prefix, "")
    };
    stripped.replace('#', "_")
}

pub fn resolve_entry(
    owning_id: &str,
    entry: &MembershipEntry,
    index: &RunIndex,
    alias_prefix: &str,
) -> Resolution {
    let key = run_key(owning_id, &format!("{alias_prefix}{}", entry.member_name));
    let file_id = file_id(&entry.member_name, alias_prefix);
    match index.get(&key) {
        Some(run) if !run.is_empty() => Resolution::Resolved(ResolvedRecord::new(
            entry.sample_accession.as_str(),
            file_id,
            run,
        )),
        _ => {
            debug!(
                sample = %entry.sample_accession,
                file_id = %file_id,
                key = %key,
                "no run found"
            );
            Resolution::Unresolved(UnresolvedWarning::new(
                entry.sample_accession.as_str(),
                file_id,
            ))
        }
    }
}

pub fn resolve_members<F: MetadataFetcher + ?Sized>(
    owning_id: &str,
    fetcher: &F,
    index: &RunIndex,
    alias_prefix: &str,
) -> Result<Vec<Resolution>, ResolverError> {
    let xml = fetcher.fetch_document(owning_id, DocumentKind::Experiment)?;
    let members = parse_pool_members(owning_id, &xml)?;
    debug!(experiment = owning_id, members = members.len(), "resolving pool members");
    Ok(members
        .iter()
        .map(|entry| resolve_entry(owning_id, entry, index, alias_prefix))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_strips_prefix_and_hash() {
        assert_eq!(file_id("5150_1#0", "SC_RUN_"), "5150_1_0");
        assert_eq!(file_id("SC_RUN_5150_1#0", "SC_RUN_"), "5150_1_0");
        assert_eq!(file_id("run#1#2", ""), "run_1_2");
    }
}
