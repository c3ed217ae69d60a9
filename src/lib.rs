//! # refscope
//!
//! Scopus Publication Retrieval & Analysis
//!
//! ## Modules
//!
//! - [`query`] - Search expression building and output file naming
//! - [`scopus`] - Scopus Search API client
//! - [`record`] - Internal publication schema and record normalization
//! - [`collection`] - Persisted JSON document handling
//! - [`analyze`] - Summary statistics, rankings, and BibTeX export
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use refscope::query::{SearchQuery, Selector};
//! use refscope::scopus::ScopusClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let selector = Selector::from_flags(Some("Jane Doe".into()), None, None)?;
//!     let query = SearchQuery::new(selector, Some(2018), Some(2023), None)?;
//!     let client = ScopusClient::new("api-key".into())?;
//!     let entries = client.search(&query).await?;
//!     println!("Found {} entries", entries.len());
//!     Ok(())
//! }
//! ```

pub mod analyze;
pub mod collection;
pub mod error;
pub mod query;
pub mod record;
pub mod scopus;

pub use error::{RefscopeError, Result};
