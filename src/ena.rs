use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::domain::{DocumentKind, ProjectId};
use crate::error::ResolverError;

pub const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/ena";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const RUN_REPORT_FIELDS: &str = "experiment_accession,run_alias,run_accession";

/// Source of raw XML records for projects and experiments.
pub trait MetadataFetcher: Send + Sync {
    fn fetch_document(&self, id: &str, kind: DocumentKind) -> Result<Vec<u8>, ResolverError>;
}

/// Source of the tab-delimited read-run report of a project.
pub trait RunReportFetcher: Send + Sync {
    fn fetch_run_report(&self, project: &ProjectId) -> Result<String, ResolverError>;
}

#[derive(Clone)]
pub struct EnaHttpClient {
    client: Client,
    base_url: String,
}

impl EnaHttpClient {
    pub fn new() -> Result<Self, ResolverError> {
        Self::with_settings(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_settings(base_url: &str, timeout: Duration) -> Result<Self, ResolverError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ena-rr/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ResolverError::EnaHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| ResolverError::EnaHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn document_url(&self, id: &str) -> String {
        format!("{}/browser/api/xml/{}", self.base_url, id)
    }

    pub fn run_report_url(&self, project: &ProjectId) -> String {
        format!(
            "{}/portal/api/filereport?accession={}&result=read_run&fields={}&format=tsv",
            self.base_url,
            project.as_str(),
            RUN_REPORT_FIELDS
        )
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, ResolverError> {
        debug!(url, "querying ENA");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| ResolverError::EnaHttp(err.to_string()))?;
        Self::handle_status(response)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ResolverError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "ENA request failed".to_string());
        Err(ResolverError::EnaStatus { status, message })
    }
}

impl MetadataFetcher for EnaHttpClient {
    fn fetch_document(&self, id: &str, _kind: DocumentKind) -> Result<Vec<u8>, ResolverError> {
        let response = self.get(&self.document_url(id))?;
        let bytes = response
            .bytes()
            .map_err(|err| ResolverError::EnaHttp(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl RunReportFetcher for EnaHttpClient {
    fn fetch_run_report(&self, project: &ProjectId) -> Result<String, ResolverError> {
        let response = self.get(&self.run_report_url(project))?;
        response
            .text()
            .map_err(|err| ResolverError::EnaHttp(err.to_string()))
    }
}
