use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, warn};

use super::XmlRetriever;
use crate::domain::Accession;
use crate::error::KiraError;

pub const DEFAULT_ENA_BASE_URL: &str = "https://www.ebi.ac.uk/ena/browser/api/xml";

const BASE_DELAY_MS: u64 = 200;

/// Fetches XML from the ENA browser API, one GET per accession.
#[derive(Clone)]
pub struct EnaApiRetriever {
    client: Client,
    base_url: String,
    max_retries: usize,
}

impl EnaApiRetriever {
    pub fn new(base_url: &str, timeout: Duration, max_retries: usize) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-ml/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::HttpClient(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| KiraError::HttpClient(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    pub fn url_for(&self, accession: &Accession) -> String {
        format!("{}/{}", self.base_url, accession.as_str())
    }

    fn send_with_retries<F>(
        &self,
        accession: &Accession,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, KiraError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < self.max_retries && is_retryable_status(status) {
                        debug!(%accession, status, attempt, "retrying ENA request");
                        backoff(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < self.max_retries && is_retryable_error(&err) {
                        warn!(%accession, attempt, error = %err, "ENA request failed, retrying");
                        backoff(attempt);
                        attempt += 1;
                        continue;
                    }
                    return Err(KiraError::retrieval(accession, err));
                }
            }
        }
    }
}

impl XmlRetriever for EnaApiRetriever {
    fn get_xml(&self, accession: &Accession) -> Result<String, KiraError> {
        let url = self.url_for(accession);
        let response = self.send_with_retries(accession, || self.client.get(&url))?;
        if !response.status().is_success() {
            return Err(KiraError::RetrievalStatus {
                accession: accession.to_string(),
                status: response.status().as_u16(),
            });
        }
        let body = response
            .text()
            .map_err(|err| KiraError::retrieval(accession, err))?;
        if body.trim().is_empty() {
            return Err(KiraError::retrieval(accession, "empty response body"));
        }
        Ok(body)
    }
}

fn backoff(attempt: usize) {
    let delay = BASE_DELAY_MS * (attempt as u64 + 1);
    thread::sleep(Duration::from_millis(delay));
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
