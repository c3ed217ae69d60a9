//! Scopus query construction and output file naming.
//!
//! Builds the advanced-search expression handed to the Scopus client and
//! derives the auto-generated output filename from the same parameters.
//! Everything here is a pure function of its inputs: no I/O, no clock,
//! no environment reads.

use crate::error::{RefscopeError, Result};

/// Filename used when sanitization leaves nothing of the query label
const FALLBACK_BASENAME: &str = "publications";

/// Identity selector for a Scopus search.
///
/// Exactly one of the three CLI flags maps to one variant; [`Selector::from_flags`]
/// rejects zero or multiple selections, so downstream code never has to
/// re-check mutual exclusivity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Author name, either "First Last" or "Last, First"
    Name(String),
    /// ORCID identifier (e.g. "0000-0002-1825-0097")
    Orcid(String),
    /// Institution/affiliation name
    Institution(String),
}

impl Selector {
    /// Build a selector from the three optional CLI flags.
    ///
    /// # Errors
    ///
    /// Returns `Config` when none or more than one flag is given.
    pub fn from_flags(
        name: Option<String>,
        orcid: Option<String>,
        institution: Option<String>,
    ) -> Result<Self> {
        match (name, orcid, institution) {
            (Some(name), None, None) => Ok(Self::Name(name)),
            (None, Some(orcid), None) => Ok(Self::Orcid(orcid)),
            (None, None, Some(institution)) => Ok(Self::Institution(institution)),
            (None, None, None) => Err(RefscopeError::Config(
                "specify one of --name, --orcid, or --institution".to_string(),
            )),
            _ => Err(RefscopeError::Config(
                "--name, --orcid, and --institution are mutually exclusive".to_string(),
            )),
        }
    }
}

/// A fully validated search request.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    selector: Selector,
    start_year: Option<i32>,
    end_year: Option<i32>,
    /// Maximum number of results to retrieve (unbounded when `None`)
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Validate the year range and result limit.
    ///
    /// # Errors
    ///
    /// Returns `Config` when `start_year > end_year` or `limit == 0`.
    pub fn new(
        selector: Selector,
        start_year: Option<i32>,
        end_year: Option<i32>,
        limit: Option<usize>,
    ) -> Result<Self> {
        if let (Some(start), Some(end)) = (start_year, end_year) {
            if start > end {
                return Err(RefscopeError::Config(format!(
                    "--start-year {} is after --end-year {}",
                    start, end
                )));
            }
        }
        if limit == Some(0) {
            return Err(RefscopeError::Config(
                "--limit must be a positive integer".to_string(),
            ));
        }
        Ok(Self {
            selector,
            start_year,
            end_year,
            limit,
        })
    }

    /// Scopus advanced-search expression for this request.
    ///
    /// Year bounds are expressed with strict PUBYEAR comparisons, so an
    /// inclusive range `[start, end]` becomes `PUBYEAR > start-1 AND
    /// PUBYEAR < end+1`.
    pub fn expression(&self) -> String {
        let mut query = match &self.selector {
            Selector::Orcid(orcid) => format!("ORCID({})", orcid.trim()),
            Selector::Name(name) => format!("AUTHOR-NAME({})", surname_first(name)),
            Selector::Institution(institution) => format!("AFFIL({})", institution.trim()),
        };

        if let Some(start) = self.start_year {
            query.push_str(&format!(" AND PUBYEAR > {}", start - 1));
        }
        if let Some(end) = self.end_year {
            query.push_str(&format!(" AND PUBYEAR < {}", end + 1));
        }

        query
    }

    /// Short human-readable label for this query, used for auto-generated
    /// filenames and progress messages.
    pub fn label(&self) -> String {
        match &self.selector {
            Selector::Name(name) => name.trim().to_string(),
            Selector::Orcid(orcid) => format!("ORCID_{}", orcid.trim()),
            Selector::Institution(institution) => institution.trim().to_string(),
        }
    }

    /// Derive the output filename.
    ///
    /// An explicit override is used verbatim (with `.json` appended when
    /// missing). Otherwise the name is `<sanitized_label>[_<years>].json`
    /// where the year segment is `start-end`, `start-present`, or
    /// `until-end` depending on which bounds were given. Deterministic:
    /// the same inputs always produce the same name.
    pub fn output_filename(&self, explicit: Option<&str>) -> String {
        if let Some(name) = explicit {
            return if name.ends_with(".json") {
                name.to_string()
            } else {
                format!("{}.json", name)
            };
        }

        let mut base = sanitize_label(&self.label());
        if base.is_empty() {
            base = FALLBACK_BASENAME.to_string();
        }

        match (self.start_year, self.end_year) {
            (Some(start), Some(end)) => base.push_str(&format!("_{}-{}", start, end)),
            (Some(start), None) => base.push_str(&format!("_{}-present", start)),
            (None, Some(end)) => base.push_str(&format!("_until-{}", end)),
            (None, None) => {}
        }

        format!("{}.json", base)
    }
}

/// Normalize an author name to Scopus "Last, First" form.
///
/// Names already containing a comma are passed through; otherwise the last
/// whitespace-separated token is treated as the surname.
fn surname_first(name: &str) -> String {
    let name = name.trim();
    if name.contains(',') {
        return name.to_string();
    }
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() < 2 {
        return name.to_string();
    }
    let (first, last) = parts.split_at(parts.len() - 1);
    format!("{}, {}", last[0], first.join(" "))
}

/// Make a query label filesystem-safe: whitespace becomes `_`, anything
/// outside `[A-Za-z0-9_-]` is stripped, underscore runs are collapsed.
fn sanitize_label(label: &str) -> String {
    let mut sanitized = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_whitespace() {
            if !sanitized.ends_with('_') {
                sanitized.push('_');
            }
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            if c == '_' && sanitized.ends_with('_') {
                continue;
            }
            sanitized.push(c);
        }
    }
    sanitized.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn name_query(name: &str) -> SearchQuery {
        SearchQuery::new(Selector::Name(name.to_string()), None, None, None)
            .expect("valid query")
    }

    #[test]
    fn test_selector_requires_exactly_one_flag() {
        assert!(Selector::from_flags(None, None, None).is_err());
        assert!(Selector::from_flags(
            Some("A".into()),
            Some("0000-0002-1825-0097".into()),
            None
        )
        .is_err());
        assert_eq!(
            Selector::from_flags(Some("Jane Doe".into()), None, None).expect("one flag"),
            Selector::Name("Jane Doe".into())
        );
    }

    #[test]
    fn test_year_range_validation() {
        let selector = Selector::Orcid("0000-0002-1825-0097".into());
        assert!(SearchQuery::new(selector.clone(), Some(2022), Some(2020), None).is_err());
        assert!(SearchQuery::new(selector.clone(), Some(2020), Some(2020), None).is_ok());
        assert!(SearchQuery::new(selector, None, None, Some(0)).is_err());
    }

    #[test]
    fn test_expression_orcid() {
        let query = SearchQuery::new(
            Selector::Orcid("0000-0002-1825-0097".into()),
            None,
            None,
            None,
        )
        .expect("valid query");
        assert_eq!(query.expression(), "ORCID(0000-0002-1825-0097)");
    }

    #[test]
    fn test_expression_flips_plain_name() {
        assert_eq!(
            name_query("Jane van Doe").expression(),
            "AUTHOR-NAME(Doe, Jane van)"
        );
        // already "Last, First": passed through
        assert_eq!(
            name_query("Doe, Jane").expression(),
            "AUTHOR-NAME(Doe, Jane)"
        );
        // single token: nothing to flip
        assert_eq!(name_query("Doe").expression(), "AUTHOR-NAME(Doe)");
    }

    #[test]
    fn test_expression_year_clauses() {
        let selector = Selector::Institution("MIT".into());
        let both = SearchQuery::new(selector.clone(), Some(2020), Some(2023), None)
            .expect("valid query");
        assert_eq!(
            both.expression(),
            "AFFIL(MIT) AND PUBYEAR > 2019 AND PUBYEAR < 2024"
        );

        let start_only =
            SearchQuery::new(selector.clone(), Some(2020), None, None).expect("valid query");
        assert_eq!(start_only.expression(), "AFFIL(MIT) AND PUBYEAR > 2019");

        let end_only = SearchQuery::new(selector, None, Some(2023), None).expect("valid query");
        assert_eq!(end_only.expression(), "AFFIL(MIT) AND PUBYEAR < 2024");
    }

    #[test]
    fn test_filename_override_verbatim() {
        let query = name_query("Jane Doe");
        assert_eq!(query.output_filename(Some("mine.json")), "mine.json");
        assert_eq!(query.output_filename(Some("mine")), "mine.json");
    }

    #[test]
    fn test_filename_year_segments() {
        let selector = Selector::Name("Jane Doe".into());
        let both = SearchQuery::new(selector.clone(), Some(2020), Some(2023), None)
            .expect("valid query");
        assert_eq!(both.output_filename(None), "Jane_Doe_2020-2023.json");

        let start_only =
            SearchQuery::new(selector.clone(), Some(2020), None, None).expect("valid query");
        assert_eq!(start_only.output_filename(None), "Jane_Doe_2020-present.json");

        let end_only = SearchQuery::new(selector.clone(), None, Some(2023), None)
            .expect("valid query");
        assert_eq!(end_only.output_filename(None), "Jane_Doe_until-2023.json");

        let no_years = SearchQuery::new(selector, None, None, None).expect("valid query");
        assert_eq!(no_years.output_filename(None), "Jane_Doe.json");
    }

    #[test]
    fn test_filename_sanitization() {
        assert_eq!(
            name_query("Doe, Jane  M.").output_filename(None),
            "Doe_Jane_M.json"
        );
        let orcid = SearchQuery::new(
            Selector::Orcid("0000-0002-1825-0097".into()),
            None,
            None,
            None,
        )
        .expect("valid query");
        assert_eq!(
            orcid.output_filename(None),
            "ORCID_0000-0002-1825-0097.json"
        );
        // nothing survives sanitization
        assert_eq!(name_query("!!!").output_filename(None), "publications.json");
    }

    proptest! {
        /// Auto-generated names are deterministic and contain only
        /// filesystem-safe characters.
        #[test]
        fn filename_is_deterministic_and_safe(
            label in ".{0,40}",
            start in proptest::option::of(1900i32..2100),
            end in proptest::option::of(1900i32..2100),
        ) {
            let (start, end) = match (start, end) {
                (Some(s), Some(e)) if s > e => (Some(e), Some(s)),
                other => other,
            };
            let query = SearchQuery::new(Selector::Name(label), start, end, None)
                .expect("valid query");

            let first = query.output_filename(None);
            let second = query.output_filename(None);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.ends_with(".json"));
            prop_assert!(first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'));
        }
    }
}
