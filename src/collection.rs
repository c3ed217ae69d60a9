//! Persisted publication collection: metadata wrapper, atomic save,
//! defensive load.
//!
//! The on-disk format is pretty-printed UTF-8 JSON with a trailing
//! newline:
//!
//! ```json
//! {
//!   "metadata": { "retrieved_at": "...", "total_publications": 2, "source": "Scopus Search API" },
//!   "publications": [ ... ]
//! }
//! ```

use crate::error::Result;
use crate::record::Publication;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Constant source label written into every document
pub const SOURCE_LABEL: &str = "Scopus Search API";

/// Retrieval metadata. Owned by this module; `total_publications` is
/// always computed from the publication sequence, never trusted from a
/// caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// RFC 3339 timestamp, set once at serialization time
    pub retrieved_at: String,
    pub total_publications: usize,
    pub source: String,
}

/// The persisted document: metadata plus publications in retrieval order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationCollection {
    pub metadata: Metadata,
    pub publications: Vec<Publication>,
}

impl PublicationCollection {
    /// Wrap publications with freshly computed metadata. Publication
    /// contents and order are left untouched.
    pub fn new(publications: Vec<Publication>) -> Self {
        Self {
            metadata: Metadata {
                retrieved_at: Local::now().to_rfc3339(),
                total_publications: publications.len(),
                source: SOURCE_LABEL.to_string(),
            },
            publications,
        }
    }

    /// Write the document to `path`.
    ///
    /// Goes through a sibling temp file and a rename, so the destination
    /// is never left half-written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, format!("{}\n", json))?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load a document from `path`.
    ///
    /// A `total_publications` value that disagrees with the actual
    /// publication count is logged but tolerated.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let collection: Self = serde_json::from_str(&text)?;

        if collection.metadata.total_publications != collection.publications.len() {
            warn!(
                declared = collection.metadata.total_publications,
                actual = collection.publications.len(),
                "metadata.total_publications does not match the publication count"
            );
        }

        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_publication(id: &str) -> Publication {
        Publication {
            id: id.to_string(),
            doi: Some(format!("10.1000/{}", id)),
            title: format!("Title {}", id),
            abstract_text: None,
            journal: Some("Journal of Things".to_string()),
            year: Some(2021),
            authors: vec![],
            keywords: vec!["Things".to_string()],
            citation_count: 3,
            url: None,
        }
    }

    #[test]
    fn test_new_computes_count() {
        let collection =
            PublicationCollection::new(vec![sample_publication("a"), sample_publication("b")]);
        assert_eq!(collection.metadata.total_publications, 2);
        assert_eq!(collection.metadata.source, SOURCE_LABEL);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.json");

        let collection =
            PublicationCollection::new(vec![sample_publication("a"), sample_publication("b")]);
        collection.save(&path).expect("save");

        let text = fs::read_to_string(&path).expect("read");
        assert!(text.ends_with('\n'));
        assert!(text.contains("\"metadata\""));

        let loaded = PublicationCollection::load(&path).expect("load");
        assert_eq!(loaded.publications, collection.publications);
        assert_eq!(
            loaded.metadata.total_publications,
            loaded.publications.len()
        );
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.json");

        PublicationCollection::new(vec![sample_publication("a")])
            .save(&path)
            .expect("save");

        let names: Vec<String> = fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["out.json".to_string()]);
    }

    #[test]
    fn test_load_tolerates_stale_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stale.json");

        let json = serde_json::json!({
            "metadata": {
                "retrieved_at": "2024-01-01T00:00:00+00:00",
                "total_publications": 99,
                "source": SOURCE_LABEL
            },
            "publications": [serde_json::to_value(sample_publication("a")).expect("serialize")]
        });
        fs::write(&path, json.to_string()).expect("write");

        let loaded = PublicationCollection::load(&path).expect("load");
        assert_eq!(loaded.publications.len(), 1);
        assert_eq!(loaded.metadata.total_publications, 99);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = PublicationCollection::load(Path::new("/nonexistent/nope.json"));
        assert!(matches!(result, Err(crate::error::RefscopeError::Io(_))));
    }

    #[test]
    fn test_abstract_serializes_under_json_name() {
        let mut publication = sample_publication("a");
        publication.abstract_text = Some("An abstract.".to_string());
        let value = serde_json::to_value(&publication).expect("serialize");
        assert_eq!(value["abstract"], "An abstract.");
        assert!(value.get("abstract_text").is_none());
    }
}
