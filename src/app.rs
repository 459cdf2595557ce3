use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;

use crate::domain::{
    AccessionPattern, ProjectId, ResolvedRecord, Resolution, UnresolvedWarning,
};
use crate::ena::{MetadataFetcher, RunReportFetcher};
use crate::error::ResolverError;
use crate::member::{DEFAULT_ALIAS_PREFIX, resolve_members};
use crate::project::{DEFAULT_SAMPLE_DB, resolve_project_samples};
use crate::range::RangeExpander;
use crate::run_index::RunIndex;

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub alias_prefix: String,
    pub sample_db: String,
    pub sample_pattern: AccessionPattern,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            alias_prefix: DEFAULT_ALIAS_PREFIX.to_string(),
            sample_db: DEFAULT_SAMPLE_DB.to_string(),
            sample_pattern: AccessionPattern::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub project: String,
    pub expected_samples: usize,
    pub experiments: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Project samples that no experiment pool referenced.
    pub unreferenced_samples: Vec<String>,
}

/// Receives results in the order the reconciler produces them.
pub trait ResultSink {
    fn emit(&mut self, record: &ResolvedRecord);
    fn emit_warning(&mut self, warning: &UnresolvedWarning);
    fn progress(&mut self, _message: &str) {}
}

#[derive(Clone)]
pub struct Reconciler<M: MetadataFetcher, R: RunReportFetcher> {
    metadata: M,
    reports: R,
    options: ReconcileOptions,
}

impl<M: MetadataFetcher, R: RunReportFetcher> Reconciler<M, R> {
    pub fn new(metadata: M, reports: R, options: ReconcileOptions) -> Self {
        Self {
            metadata,
            reports,
            options,
        }
    }

    pub fn run(
        &self,
        project: &ProjectId,
        sink: &mut dyn ResultSink,
    ) -> Result<ReconcileSummary, ResolverError> {
        let expander = RangeExpander::new(self.options.sample_pattern.clone())?;

        sink.progress(&format!("Querying project {project}"));
        let expected = resolve_project_samples(
            project,
            &self.metadata,
            &self.options.sample_db,
            &expander,
        )?;
        sink.progress(&format!(
            "Found {} sample accessions for project {project}",
            expected.len()
        ));

        let report = self.reports.fetch_run_report(project)?;
        let index = RunIndex::build(&report);
        info!(
            project = %project,
            runs = index.len(),
            skipped_rows = index.skipped_rows(),
            "loaded run report"
        );

        let mut seen = BTreeSet::new();
        let mut experiments = 0usize;
        let mut resolved = 0usize;
        let mut unresolved = 0usize;
        for owning_id in index.owning_ids() {
            experiments += 1;
            let resolutions = resolve_members(
                owning_id,
                &self.metadata,
                &index,
                &self.options.alias_prefix,
            )?;
            for resolution in resolutions {
                seen.insert(resolution.sample_accession().to_string());
                match resolution {
                    Resolution::Resolved(record) => {
                        resolved += 1;
                        sink.emit(&record);
                    }
                    Resolution::Unresolved(warning) => {
                        unresolved += 1;
                        sink.emit_warning(&warning);
                    }
                }
            }
        }

        let unreferenced_samples = expected
            .iter()
            .filter(|sample| !seen.contains(*sample))
            .map(str::to_string)
            .collect::<Vec<_>>();
        info!(
            project = %project,
            experiments,
            resolved,
            unresolved,
            unreferenced = unreferenced_samples.len(),
            "reconciliation finished"
        );

        Ok(ReconcileSummary {
            project: project.to_string(),
            expected_samples: expected.len(),
            experiments,
            resolved,
            unresolved,
            unreferenced_samples,
        })
    }
}
