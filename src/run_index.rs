use std::collections::{BTreeSet, HashMap};

use tracing::{debug, trace};

use crate::domain::RunRecord;

/// Column names of the ENA read-run report, as emitted in its header row.
pub const REPORT_HEADER: [&str; 3] = ["experiment_accession", "run_alias", "run_accession"];

/// Composite key shared by the index builder and every lookup: the owning
/// experiment accession immediately followed by the run alias.
pub fn run_key(owning_id: &str, alias: &str) -> String {
    format!("{owning_id}{alias}")
}

/// Parses one report row into a record. Rows without exactly three
/// tab-separated fields, and the header row, yield `None`.
pub fn parse_row(line: &str) -> Option<RunRecord> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = line.split('\t');
    let (Some(owning_id), Some(alias), Some(run_accession), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return None;
    };
    if [owning_id, alias, run_accession] == REPORT_HEADER {
        return None;
    }
    Some(RunRecord {
        owning_id: owning_id.to_string(),
        alias: alias.to_string(),
        run_accession: run_accession.to_string(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct RunIndex {
    runs: HashMap<String, String>,
    owning_ids: BTreeSet<String>,
    skipped_rows: usize,
}

impl RunIndex {
    pub fn build(report: &str) -> Self {
        let mut index = Self::default();
        for (line_no, line) in report.split('\n').enumerate() {
            match parse_row(line) {
                Some(record) => index.insert(record),
                None => {
                    trace!(line = line_no + 1, "skipping report row");
                    index.skipped_rows += 1;
                }
            }
        }
        debug!(
            keys = index.runs.len(),
            owning_ids = index.owning_ids.len(),
            skipped = index.skipped_rows,
            "built run index"
        );
        index
    }

    fn insert(&mut self, record: RunRecord) {
        self.runs
            .insert(run_key(&record.owning_id, &record.alias), record.run_accession);
        self.owning_ids.insert(record.owning_id);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.runs.get(key).map(String::as_str)
    }

    pub fn lookup(&self, owning_id: &str, alias: &str) -> Option<&str> {
        self.get(&run_key(owning_id, alias))
    }

    pub fn owning_ids(&self) -> impl Iterator<Item = &str> {
        self.owning_ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_row_requires_three_fields() {
        assert!(parse_row("").is_none());
        assert!(parse_row("a\tb").is_none());
        assert!(parse_row("a\tb\tc\td").is_none());
        let record = parse_row("ERX1\tSC_RUN_1#0\tERR9\r").unwrap();
        assert_eq!(record.run_accession, "ERR9");
    }

    #[test]
    fn header_row_is_skipped() {
        assert!(parse_row("experiment_accession\trun_alias\trun_accession").is_none());
    }

    #[test]
    fn empty_fields_still_count() {
        let record = parse_row("ERX1\t\t").unwrap();
        assert_eq!(record.alias, "");
        assert_eq!(record.run_accession, "");
    }
}
