//! Scopus Search API client.
//!
//! Talks to the Elsevier Scopus Search API with the COMPLETE view so that
//! entries carry authors, author keywords, and abstracts when Scopus has
//! them. Pagination, backoff, and error classification live here; the
//! returned entries are raw and loosely typed, and the `record` module
//! resolves all of their optionality.
//!
//! API notes:
//! - The key is sent via the `X-ELS-APIKey` header.
//! - COMPLETE view caps `count` at 25 per page.
//! - 429 responses are retried with exponential backoff.

use crate::error::{RefscopeError, Result};
use crate::query::SearchQuery;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Scopus Search API endpoint
const SCOPUS_API_BASE: &str = "https://api.elsevier.com/content/search/scopus";

/// Maximum results per page for the COMPLETE view
const PAGE_SIZE: usize = 25;

/// Concurrent page fetches after the first page
const CONCURRENT_PAGES: usize = 4;

/// Retry attempts on 429 before giving up
const MAX_RETRIES: u32 = 3;

/// One raw entry from the Scopus Search API.
///
/// Every field is optional by design; Scopus omits keys freely depending
/// on document type and entitlement. Field fallbacks are resolved in
/// [`crate::record::normalize`], never here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopusEntry {
    /// Scopus EID (primary identifier)
    pub eid: Option<String>,
    /// Secondary identifier ("SCOPUS_ID:...")
    #[serde(rename = "dc:identifier")]
    pub identifier: Option<String>,
    #[serde(rename = "prism:doi")]
    pub doi: Option<String>,
    #[serde(rename = "dc:title")]
    pub title: Option<String>,
    /// Abstract text (COMPLETE view only)
    #[serde(rename = "dc:description")]
    pub description: Option<String>,
    #[serde(rename = "prism:publicationName")]
    pub publication_name: Option<String>,
    /// Cover date, "YYYY-MM-DD"
    #[serde(rename = "prism:coverDate")]
    pub cover_date: Option<String>,
    /// First-author display string, "Surname, Given" (STANDARD view fallback)
    #[serde(rename = "dc:creator")]
    pub creator: Option<String>,
    /// Full author list (COMPLETE view only)
    #[serde(default)]
    pub author: Vec<ScopusAuthor>,
    /// Author keywords, joined with " | "
    pub authkeywords: Option<String>,
    /// Citation count, returned as a string by the API
    #[serde(rename = "citedby-count")]
    pub citedby_count: Option<String>,
    #[serde(rename = "prism:url")]
    pub url: Option<String>,
    /// Set instead of the usual fields when the result set is empty
    pub error: Option<String>,
}

/// One raw author object from a COMPLETE-view entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopusAuthor {
    /// Display name, "Surname G."
    pub authname: Option<String>,
    pub surname: Option<String>,
    #[serde(rename = "given-name")]
    pub given_name: Option<String>,
    /// Scopus author identifier
    pub authid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "search-results")]
    search_results: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(rename = "opensearch:totalResults")]
    total_results: Option<String>,
    #[serde(default)]
    entry: Vec<ScopusEntry>,
}

/// Scopus Search API client with pagination and backoff
pub struct ScopusClient {
    client: Client,
    api_key: String,
}

impl ScopusClient {
    /// Create a new client holding the given API key.
    ///
    /// # Errors
    ///
    /// Returns `Auth` when the key is empty and `Config` when the HTTP
    /// client cannot be built.
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(RefscopeError::Auth("no Scopus API key found".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("refscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RefscopeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, api_key })
    }

    /// Run a search, paginating until the query limit or the result set
    /// is exhausted.
    ///
    /// The first page reports the total result count; remaining pages are
    /// fetched concurrently and reassembled in offset order, so retrieval
    /// order matches what Scopus returned.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<ScopusEntry>> {
        use futures::stream::{self, StreamExt};

        let expression = query.expression();
        info!(query = %expression, limit = ?query.limit, "Starting Scopus search");

        let first = self.fetch_page(&expression, 0).await?;
        let total: usize = first
            .total_results
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(first.entry.len());

        let wanted = match query.limit {
            Some(limit) => total.min(limit),
            None => total,
        };

        let mut entries = keep_valid(first.entry);
        entries.truncate(wanted);
        if entries.len() >= wanted || total <= PAGE_SIZE {
            info!(total = entries.len(), "Scopus search complete");
            return Ok(entries);
        }

        let offsets: Vec<usize> = (PAGE_SIZE..wanted).step_by(PAGE_SIZE).collect();
        let expression = expression.as_str();

        let mut pages: Vec<(usize, Result<SearchResults>)> = stream::iter(offsets)
            .map(|start| async move {
                debug!(start = start, "Fetching Scopus page");
                (start, self.fetch_page(expression, start).await)
            })
            .buffer_unordered(CONCURRENT_PAGES)
            .collect()
            .await;
        pages.sort_by_key(|(start, _)| *start);

        for (start, page) in pages {
            match page {
                Ok(results) => {
                    let valid = keep_valid(results.entry);
                    debug!(start = start, count = valid.len(), "Parsed Scopus page");
                    entries.extend(valid);
                }
                Err(e) => {
                    warn!(start = start, error = %e, "Page fetch failed");
                    return Err(e);
                }
            }
        }

        entries.truncate(wanted);
        info!(total = entries.len(), "Scopus search complete");
        Ok(entries)
    }

    /// Fetch one page of results, retrying on rate limits.
    async fn fetch_page(&self, expression: &str, start: usize) -> Result<SearchResults> {
        let mut retries = 0;
        let count = PAGE_SIZE.to_string();
        let start = start.to_string();

        loop {
            let response = self
                .client
                .get(SCOPUS_API_BASE)
                .header("X-ELS-APIKey", &self.api_key)
                .header("Accept", "application/json")
                .query(&[
                    ("query", expression),
                    ("view", "COMPLETE"),
                    ("count", count.as_str()),
                    ("start", start.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();

            if status.is_success() {
                let parsed: SearchResponse = response.json().await?;
                return Ok(parsed.search_results);
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(RefscopeError::Auth(format!(
                    "Scopus rejected the API key ({})",
                    status
                )));
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                if retries < MAX_RETRIES {
                    let backoff = Duration::from_secs(2u64.pow(retries));
                    warn!(
                        retries = retries,
                        backoff_secs = backoff.as_secs(),
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    retries += 1;
                    continue;
                }
                return Err(RefscopeError::RateLimited(60));
            }

            return Err(RefscopeError::Api {
                code: status.as_u16() as i32,
                message: format!("Scopus API error: {}", status),
            });
        }
    }
}

/// Drop placeholder entries: empty-result-set markers and entries missing
/// both identifiers.
fn keep_valid(entries: Vec<ScopusEntry>) -> Vec<ScopusEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            if let Some(marker) = &entry.error {
                debug!(marker = %marker, "Skipping placeholder entry");
                return false;
            }
            if entry.eid.is_none() && entry.identifier.is_none() {
                warn!("Skipping entry without eid or dc:identifier");
                return false;
            }
            true
        })
        .collect()
}
