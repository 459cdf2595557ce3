use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ReconcileSummary, ResultSink};
use crate::domain::{IdentifierSet, ResolvedRecord, Resolution, UnresolvedWarning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn format_record(record: &ResolvedRecord) -> String {
    format!(
        "{}, File ID {}: {}",
        record.sample_accession, record.file_id, record.run_accession
    )
}

pub fn format_warning(warning: &UnresolvedWarning) -> String {
    format!(
        "*** WARNING: No run found for {} with file ID {}",
        warning.sample_accession, warning.file_id
    )
}

/// Line-oriented sink. Results and warnings share one stream so their
/// relative order is kept; progress goes to stderr.
pub struct TextOutput<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

impl TextOutput<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TextOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    fn write_line(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.writer, "{line}") {
            self.error = Some(err);
        }
    }

    pub fn print_summary(&mut self, summary: &ReconcileSummary) {
        self.write_line(&format!(
            "Resolved {} of {} pool members across {} experiments",
            summary.resolved,
            summary.resolved + summary.unresolved,
            summary.experiments
        ));
        if !summary.unreferenced_samples.is_empty() {
            self.write_line(&format!(
                "*** WARNING: {} project samples were not referenced by any experiment: {}",
                summary.unreferenced_samples.len(),
                summary.unreferenced_samples.join(",")
            ));
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> ResultSink for TextOutput<W> {
    fn emit(&mut self, record: &ResolvedRecord) {
        self.write_line(&format_record(record));
    }

    fn emit_warning(&mut self, warning: &UnresolvedWarning) {
        self.write_line(&format_warning(warning));
    }

    fn progress(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    summary: &'a ReconcileSummary,
    results: &'a [Resolution],
}

/// Buffers every result and prints one JSON document at the end.
#[derive(Debug, Default)]
pub struct JsonOutput {
    results: Vec<Resolution>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[Resolution] {
        &self.results
    }

    pub fn print_report(&self, summary: &ReconcileSummary) -> io::Result<()> {
        Self::print_json(&JsonReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            summary,
            results: &self.results,
        })
    }

    pub fn print_identifiers(ids: &IdentifierSet) -> io::Result<()> {
        Self::print_json(ids)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ResultSink for JsonOutput {
    fn emit(&mut self, record: &ResolvedRecord) {
        self.results.push(Resolution::Resolved(record.clone()));
    }

    fn emit_warning(&mut self, warning: &UnresolvedWarning) {
        self.results.push(Resolution::Unresolved(warning.clone()));
    }
}
