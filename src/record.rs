//! Internal publication schema and the record normalizer.
//!
//! [`normalize`] is the single place where the variability of raw Scopus
//! entries is absorbed: every optional upstream field resolves to a
//! documented default, so downstream code (serialization, analysis) can
//! assume the fully-populated shape and never re-check optionality.
//! Normalization degrades missing fields instead of failing; a record is
//! never lost because one field could not be parsed.

use crate::scopus::{ScopusAuthor, ScopusEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Scopus record landing page, used when a publication has no DOI
const SCOPUS_RECORD_URL: &str = "https://www.scopus.com/record/display.uri";

/// Author name used when nothing at all is known
const UNKNOWN_AUTHOR: &str = "Unknown";

/// One author of a publication.
///
/// `name` is always populated: display name when Scopus has one, otherwise
/// a "given surname" concatenation, otherwise the literal "Unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub author_id: Option<String>,
}

/// One normalized publication record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    /// Scopus EID (falls back to the SCOPUS_ID identifier)
    pub id: String,
    pub doi: Option<String>,
    /// Empty string when Scopus has no title
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
    /// `None` when the cover date is missing or unparseable
    pub year: Option<i32>,
    /// Upstream order, preserved
    pub authors: Vec<Author>,
    /// Trimmed, deduplicated (case-sensitive), first-seen order
    pub keywords: Vec<String>,
    /// 0 when absent or unparseable
    pub citation_count: u32,
    /// DOI link when a DOI exists, otherwise the Scopus record page
    pub url: Option<String>,
}

/// Convert one raw search entry into the internal schema.
///
/// Never fails: every missing or malformed field degrades to its default.
pub fn normalize(entry: &ScopusEntry) -> Publication {
    let id = entry
        .eid
        .clone()
        .or_else(|| entry.identifier.clone())
        .unwrap_or_default();

    let doi = clean(&entry.doi);
    let year = entry.cover_date.as_deref().and_then(parse_year);

    let authors = if entry.author.is_empty() {
        // STANDARD-view entries only carry the first author as a display string
        entry
            .creator
            .as_deref()
            .map(|creator| vec![author_from_display(creator)])
            .unwrap_or_default()
    } else {
        entry.author.iter().map(normalize_author).collect()
    };

    let keywords = entry
        .authkeywords
        .as_deref()
        .map(split_keywords)
        .unwrap_or_default();

    let citation_count = entry
        .citedby_count
        .as_deref()
        .and_then(|count| count.trim().parse().ok())
        .unwrap_or(0);

    let url = match (&doi, id.is_empty()) {
        (Some(doi), _) => Some(format!("https://doi.org/{}", doi)),
        (None, false) => Some(format!(
            "{}?eid={}&origin=resultslist",
            SCOPUS_RECORD_URL, id
        )),
        (None, true) => clean(&entry.url),
    };

    Publication {
        id,
        doi,
        title: clean(&entry.title).unwrap_or_default(),
        abstract_text: clean(&entry.description),
        journal: clean(&entry.publication_name),
        year,
        authors,
        keywords,
        citation_count,
        url,
    }
}

/// Trim an optional field, mapping whitespace-only values to `None`
fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Leading YYYY of a "YYYY-MM-DD" cover date
fn parse_year(cover_date: &str) -> Option<i32> {
    cover_date.split('-').next()?.trim().parse().ok()
}

fn normalize_author(raw: &ScopusAuthor) -> Author {
    let given_name = clean(&raw.given_name);
    let surname = clean(&raw.surname);

    let name = match clean(&raw.authname) {
        Some(name) => name,
        None => match (&given_name, &surname) {
            (Some(given), Some(sur)) => format!("{} {}", given, sur),
            (None, Some(sur)) => sur.clone(),
            (Some(given), None) => given.clone(),
            (None, None) => UNKNOWN_AUTHOR.to_string(),
        },
    };

    Author {
        name,
        given_name,
        surname,
        author_id: clean(&raw.authid),
    }
}

/// Parse a "Surname, Given" display string into a best-effort [`Author`].
fn author_from_display(display: &str) -> Author {
    let display = display.trim();
    if display.is_empty() {
        return Author {
            name: UNKNOWN_AUTHOR.to_string(),
            given_name: None,
            surname: None,
            author_id: None,
        };
    }

    let (surname, given_name) = match display.split_once(',') {
        Some((surname, given)) => {
            let given = given.trim();
            (
                Some(surname.trim().to_string()).filter(|s| !s.is_empty()),
                (!given.is_empty()).then(|| given.to_string()),
            )
        }
        None => {
            let parts: Vec<&str> = display.split_whitespace().collect();
            let surname = parts.last().map(|s| s.to_string());
            let given = if parts.len() > 1 {
                Some(parts[..parts.len() - 1].join(" "))
            } else {
                None
            };
            (surname, given)
        }
    };

    Author {
        name: display.to_string(),
        given_name,
        surname,
        author_id: None,
    }
}

/// Split the " | "-separated keyword field: trim, drop empties, dedupe
/// exact matches, keep first-seen order.
fn split_keywords(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for keyword in raw.split('|') {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            continue;
        }
        if seen.insert(keyword.to_string()) {
            keywords.push(keyword.to_string());
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_complete_entry() {
        let entry = ScopusEntry {
            eid: Some("2-s2.0-85000000001".to_string()),
            identifier: Some("SCOPUS_ID:85000000001".to_string()),
            doi: Some("10.1000/thing.1".to_string()),
            title: Some("A Study of Things ".to_string()),
            description: Some("We study things.".to_string()),
            publication_name: Some("Journal of Things".to_string()),
            cover_date: Some("2021-03-15".to_string()),
            author: vec![ScopusAuthor {
                authname: Some("Doe J.".to_string()),
                surname: Some("Doe".to_string()),
                given_name: Some("Jane".to_string()),
                authid: Some("123".to_string()),
            }],
            authkeywords: Some("Things | Studies".to_string()),
            citedby_count: Some("42".to_string()),
            ..Default::default()
        };

        let publication = normalize(&entry);
        assert_eq!(publication.id, "2-s2.0-85000000001");
        assert_eq!(publication.title, "A Study of Things");
        assert_eq!(publication.year, Some(2021));
        assert_eq!(publication.citation_count, 42);
        assert_eq!(publication.keywords, vec!["Things", "Studies"]);
        assert_eq!(
            publication.url.as_deref(),
            Some("https://doi.org/10.1000/thing.1")
        );
        assert_eq!(publication.authors[0].surname.as_deref(), Some("Doe"));
    }

    #[test]
    fn test_normalize_empty_entry_uses_defaults() {
        let publication = normalize(&ScopusEntry::default());
        assert_eq!(publication.id, "");
        assert_eq!(publication.title, "");
        assert!(publication.doi.is_none());
        assert!(publication.year.is_none());
        assert!(publication.authors.is_empty());
        assert!(publication.keywords.is_empty());
        assert_eq!(publication.citation_count, 0);
        assert!(publication.url.is_none());
    }

    #[test]
    fn test_url_falls_back_to_scopus_record_page() {
        let entry = ScopusEntry {
            eid: Some("2-s2.0-1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            normalize(&entry).url.as_deref(),
            Some("https://www.scopus.com/record/display.uri?eid=2-s2.0-1&origin=resultslist")
        );
    }

    #[test]
    fn test_bad_year_and_citations_degrade() {
        let entry = ScopusEntry {
            cover_date: Some("unknown".to_string()),
            citedby_count: Some("lots".to_string()),
            ..Default::default()
        };
        let publication = normalize(&entry);
        assert!(publication.year.is_none());
        assert_eq!(publication.citation_count, 0);
    }

    #[test]
    fn test_creator_string_becomes_single_author() {
        let entry = ScopusEntry {
            creator: Some("Doe, Jane".to_string()),
            ..Default::default()
        };
        let publication = normalize(&entry);
        assert_eq!(publication.authors.len(), 1);
        let author = &publication.authors[0];
        assert_eq!(author.name, "Doe, Jane");
        assert_eq!(author.surname.as_deref(), Some("Doe"));
        assert_eq!(author.given_name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_creator_without_comma() {
        let author = author_from_display("Jane van Doe");
        assert_eq!(author.surname.as_deref(), Some("Doe"));
        assert_eq!(author.given_name.as_deref(), Some("Jane van"));
    }

    #[test]
    fn test_author_name_fallbacks() {
        let from_parts = normalize_author(&ScopusAuthor {
            surname: Some("Doe".to_string()),
            given_name: Some("Jane".to_string()),
            ..Default::default()
        });
        assert_eq!(from_parts.name, "Jane Doe");

        let nothing = normalize_author(&ScopusAuthor::default());
        assert_eq!(nothing.name, "Unknown");
    }

    #[test]
    fn test_keyword_dedupe_preserves_order_and_case() {
        let keywords = split_keywords("ML | AI |  | ML | ai");
        assert_eq!(keywords, vec!["ML", "AI", "ai"]);
    }

    fn arb_entry() -> impl Strategy<Value = ScopusEntry> {
        (
            proptest::option::of("2-s2\\.0-[0-9]{11}"),
            proptest::option::of("10\\.[0-9]{4}/[a-z0-9.]{1,20}"),
            proptest::option::of(".{0,80}"),
            proptest::option::of("[0-9]{4}-[0-9]{2}-[0-9]{2}"),
            proptest::option::of("[A-Za-z ,.]{0,40}"),
            proptest::option::of("[A-Za-z |]{0,60}"),
            proptest::option::of("-?[0-9]{1,6}"),
        )
            .prop_map(
                |(eid, doi, title, cover_date, creator, authkeywords, citedby_count)| {
                    ScopusEntry {
                        eid,
                        doi,
                        title,
                        cover_date,
                        creator,
                        authkeywords,
                        citedby_count,
                        ..Default::default()
                    }
                },
            )
    }

    proptest! {
        /// Any combination of missing or malformed fields still yields a
        /// schema-valid publication.
        #[test]
        fn normalize_is_total(entry in arb_entry()) {
            let publication = normalize(&entry);

            prop_assert_eq!(publication.title.trim(), publication.title.as_str());
            for author in &publication.authors {
                prop_assert!(!author.name.is_empty());
            }
            for keyword in &publication.keywords {
                prop_assert!(!keyword.is_empty());
                prop_assert_eq!(keyword.trim(), keyword.as_str());
            }
            // duplicates removed
            let unique: HashSet<&String> = publication.keywords.iter().collect();
            prop_assert_eq!(unique.len(), publication.keywords.len());
            if let Some(doi) = &publication.doi {
                let expected_url = format!("https://doi.org/{}", doi);
                prop_assert_eq!(
                    publication.url.as_deref(),
                    Some(expected_url.as_str())
                );
            }
        }
    }
}
