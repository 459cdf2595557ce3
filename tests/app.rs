use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use assert_matches::assert_matches;

use ena_run_resolver::app::{ReconcileOptions, Reconciler, ResultSink};
use ena_run_resolver::domain::{
    DocumentKind, ProjectId, ResolvedRecord, Resolution, UnresolvedWarning,
};
use ena_run_resolver::ena::{MetadataFetcher, RunReportFetcher};
use ena_run_resolver::error::ResolverError;
use ena_run_resolver::output::TextOutput;

#[derive(Default)]
struct MockEna {
    documents: HashMap<String, Vec<u8>>,
    report: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl MockEna {
    fn fixture() -> Self {
        let mut documents = HashMap::new();
        for id in ["PRJEB211", "ERX000001", "ERX000002"] {
            let name = if id.starts_with("PRJ") {
                format!("tests/fixtures/project_{id}.xml")
            } else {
                format!("tests/fixtures/experiment_{id}.xml")
            };
            documents.insert(id.to_string(), fs::read(name).unwrap());
        }
        Self {
            documents,
            report: Some(fs::read_to_string("tests/fixtures/filereport_PRJEB211.tsv").unwrap()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl MetadataFetcher for &MockEna {
    fn fetch_document(&self, id: &str, kind: DocumentKind) -> Result<Vec<u8>, ResolverError> {
        self.requests.lock().unwrap().push(format!("{kind}:{id}"));
        self.documents
            .get(id)
            .cloned()
            .ok_or_else(|| ResolverError::EnaStatus {
                status: 404,
                message: format!("{id} not found"),
            })
    }
}

impl RunReportFetcher for &MockEna {
    fn fetch_run_report(&self, project: &ProjectId) -> Result<String, ResolverError> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("report:{project}"));
        self.report
            .clone()
            .ok_or_else(|| ResolverError::EnaHttp("connection refused".to_string()))
    }
}

#[derive(Default)]
struct RecordingSink {
    results: Vec<Resolution>,
    progress: Vec<String>,
}

impl ResultSink for RecordingSink {
    fn emit(&mut self, record: &ResolvedRecord) {
        self.results.push(Resolution::Resolved(record.clone()));
    }

    fn emit_warning(&mut self, warning: &UnresolvedWarning) {
        self.results.push(Resolution::Unresolved(warning.clone()));
    }

    fn progress(&mut self, message: &str) {
        self.progress.push(message.to_string());
    }
}

fn project() -> ProjectId {
    "PRJEB211".parse().unwrap()
}

#[test]
fn reconcile_fixture_project() {
    let ena = MockEna::fixture();
    let reconciler = Reconciler::new(&ena, &ena, ReconcileOptions::default());
    let mut sink = RecordingSink::default();

    let summary = reconciler.run(&project(), &mut sink).unwrap();

    assert_eq!(
        sink.results,
        vec![
            Resolution::Resolved(ResolvedRecord::new("ERS000001", "5150_1_0", "ERR000010")),
            Resolution::Unresolved(UnresolvedWarning::new("ERS000002", "5150_1_1")),
            Resolution::Resolved(ResolvedRecord::new("ERS000003", "5150_2_0", "ERR000020")),
            Resolution::Resolved(ResolvedRecord::new("ERS000001", "5150_2_1", "ERR000021")),
        ]
    );
    assert_eq!(summary.expected_samples, 4);
    assert_eq!(summary.experiments, 2);
    assert_eq!(summary.resolved, 3);
    assert_eq!(summary.unresolved, 1);
    assert_eq!(summary.unreferenced_samples, vec!["ERS000010"]);
    assert_eq!(
        ena.requests(),
        vec![
            "project:PRJEB211",
            "report:PRJEB211",
            "experiment:ERX000001",
            "experiment:ERX000002",
        ]
    );
    assert_eq!(sink.progress.len(), 2);
}

#[test]
fn reconcile_is_idempotent() {
    let ena = MockEna::fixture();
    let reconciler = Reconciler::new(&ena, &ena, ReconcileOptions::default());

    let mut first = TextOutput::new(Vec::new());
    let first_summary = reconciler.run(&project(), &mut first).unwrap();
    let mut second = TextOutput::new(Vec::new());
    let second_summary = reconciler.run(&project(), &mut second).unwrap();

    assert_eq!(first_summary, second_summary);
    let first = String::from_utf8(first.finish().unwrap()).unwrap();
    let second = String::from_utf8(second.finish().unwrap()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 4);
}

#[test]
fn project_failure_aborts_before_report() {
    let mut ena = MockEna::fixture();
    ena.documents.insert(
        "PRJEB211".to_string(),
        b"<PROJECT_SET><PROJECT><PROJECT_LINKS/></PROJECT></PROJECT_SET>".to_vec(),
    );
    let reconciler = Reconciler::new(&ena, &ena, ReconcileOptions::default());
    let mut sink = RecordingSink::default();

    let err = reconciler.run(&project(), &mut sink).unwrap_err();

    assert_matches!(err, ResolverError::SampleLinkNotFound { .. });
    assert!(sink.results.is_empty());
    assert_eq!(ena.requests(), vec!["project:PRJEB211"]);
}

#[test]
fn report_failure_is_fatal() {
    let mut ena = MockEna::fixture();
    ena.report = None;
    let reconciler = Reconciler::new(&ena, &ena, ReconcileOptions::default());
    let mut sink = RecordingSink::default();

    let err = reconciler.run(&project(), &mut sink).unwrap_err();
    assert_matches!(err, ResolverError::EnaHttp(_));
}

#[test]
fn mismatched_alias_prefix_only_warns() {
    let ena = MockEna::fixture();
    let options = ReconcileOptions {
        alias_prefix: "OTHER_".to_string(),
        ..ReconcileOptions::default()
    };
    let reconciler = Reconciler::new(&ena, &ena, options);
    let mut sink = RecordingSink::default();

    let summary = reconciler.run(&project(), &mut sink).unwrap();

    assert_eq!(summary.resolved, 0);
    assert_eq!(summary.unresolved, 4);
    assert!(
        sink.results
            .iter()
            .all(|result| matches!(result, Resolution::Unresolved(_)))
    );
}
