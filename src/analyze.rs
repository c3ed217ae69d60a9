//! Analysis over a loaded publication collection.
//!
//! Every function here treats its input as read-only and allocates its
//! result; the publication sequence is never reordered or mutated in
//! place. Rendering helpers return strings so the CLI layer only prints.

use crate::collection::PublicationCollection;
use crate::error::Result;
use crate::record::Publication;
use clap::ValueEnum;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Summary statistics over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub mean_year: Option<f64>,
    /// (year, count), ascending by year
    pub publications_per_year: Vec<(i32, usize)>,
    pub total_citations: u64,
    pub mean_citations: f64,
    pub max_citations: u32,
    pub median_citations: u32,
    pub with_doi: usize,
    pub with_abstract: usize,
    pub with_keywords: usize,
    /// (journal, count), most frequent first, capped at ten
    pub top_journals: Vec<(String, usize)>,
}

/// Compute summary statistics for a collection.
pub fn summary(collection: &PublicationCollection) -> Summary {
    let publications = &collection.publications;

    let years: Vec<i32> = publications.iter().filter_map(|p| p.year).collect();
    let mean_year = if years.is_empty() {
        None
    } else {
        Some(years.iter().map(|&y| f64::from(y)).sum::<f64>() / years.len() as f64)
    };

    let mut per_year: HashMap<i32, usize> = HashMap::new();
    for year in &years {
        *per_year.entry(*year).or_insert(0) += 1;
    }
    let mut publications_per_year: Vec<(i32, usize)> = per_year.into_iter().collect();
    publications_per_year.sort_by_key(|(year, _)| *year);

    let mut citations: Vec<u32> = publications.iter().map(|p| p.citation_count).collect();
    citations.sort_unstable();
    let total_citations: u64 = citations.iter().map(|&c| u64::from(c)).sum();
    let mean_citations = if citations.is_empty() {
        0.0
    } else {
        total_citations as f64 / citations.len() as f64
    };
    let median_citations = citations.get(citations.len() / 2).copied().unwrap_or(0);
    let max_citations = citations.last().copied().unwrap_or(0);

    let mut journal_counts: HashMap<&str, usize> = HashMap::new();
    for publication in publications {
        if let Some(journal) = publication.journal.as_deref() {
            *journal_counts.entry(journal).or_insert(0) += 1;
        }
    }
    let mut top_journals: Vec<(String, usize)> = journal_counts
        .into_iter()
        .map(|(journal, count)| (journal.to_string(), count))
        .collect();
    top_journals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_journals.truncate(10);

    Summary {
        total: publications.len(),
        min_year: years.iter().min().copied(),
        max_year: years.iter().max().copied(),
        mean_year,
        publications_per_year,
        total_citations,
        mean_citations,
        max_citations,
        median_citations,
        with_doi: publications.iter().filter(|p| p.doi.is_some()).count(),
        with_abstract: publications
            .iter()
            .filter(|p| p.abstract_text.is_some())
            .count(),
        with_keywords: publications.iter().filter(|p| !p.keywords.is_empty()).count(),
        top_journals,
    }
}

#[derive(Default)]
struct CasingStats {
    total: usize,
    /// (casing, count, global position of first occurrence)
    casings: Vec<(String, usize, usize)>,
}

/// Ranked keyword frequency table.
///
/// Keywords are counted case-insensitively; the displayed casing is the
/// most common one seen, ties broken by first occurrence. The table is
/// sorted by count descending, then alphabetically ascending.
pub fn keyword_frequency(publications: &[Publication]) -> Vec<(String, usize)> {
    let mut table: HashMap<String, CasingStats> = HashMap::new();
    let mut position = 0usize;

    for publication in publications {
        for keyword in &publication.keywords {
            let stats = table.entry(keyword.to_lowercase()).or_default();
            stats.total += 1;
            match stats.casings.iter_mut().find(|(text, _, _)| text == keyword) {
                Some((_, count, _)) => *count += 1,
                None => stats.casings.push((keyword.clone(), 1, position)),
            }
            position += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = table
        .into_values()
        .map(|stats| {
            let display = stats
                .casings
                .into_iter()
                .min_by_key(|(_, count, first_seen)| (Reverse(*count), *first_seen))
                .map(|(text, _, _)| text)
                .unwrap_or_default();
            (display, stats.total)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.0.to_lowercase().cmp(&b.0.to_lowercase()))
    });
    ranked
}

/// Publications with at least `threshold` citations, most cited first.
///
/// Ties are broken by year descending (missing years last), then title
/// ascending.
pub fn highly_cited(publications: &[Publication], threshold: u32) -> Vec<&Publication> {
    let mut ranked: Vec<&Publication> = publications
        .iter()
        .filter(|p| p.citation_count >= threshold)
        .collect();

    ranked.sort_by(|a, b| {
        b.citation_count
            .cmp(&a.citation_count)
            .then_with(|| b.year.cmp(&a.year))
            .then_with(|| a.title.cmp(&b.title))
    });
    ranked
}

/// Non-null DOIs in original publication order.
pub fn dois(publications: &[Publication]) -> Vec<&str> {
    publications.iter().filter_map(|p| p.doi.as_deref()).collect()
}

/// Non-null URLs in original publication order.
pub fn urls(publications: &[Publication]) -> Vec<&str> {
    publications.iter().filter_map(|p| p.url.as_deref()).collect()
}

/// Listing style for [`render_list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// One-paragraph entries with up to three authors
    Simple,
    /// Full metadata including citations, keywords, and abstract excerpt
    Detailed,
}

/// Render all publications as BibTeX `@article` entries.
///
/// Citation keys are `<first-author-surname><year>` lowercased; a key
/// collision within one export appends `b` to the second occurrence,
/// `c` to the third, and so on. Entries are separated by one blank line.
pub fn to_bibtex(publications: &[Publication]) -> String {
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut entries = Vec::with_capacity(publications.len());

    for publication in publications {
        let base = citation_key(publication);
        let seen = occurrences.entry(base.clone()).or_insert(0);
        *seen += 1;
        let key = match *seen {
            1 => base,
            n @ 2..=26 => format!("{}{}", base, (b'a' + (n - 1) as u8) as char),
            n => format!("{}{}", base, n),
        };
        entries.push(render_entry(publication, &key));
    }

    entries.join("\n")
}

/// Write the BibTeX rendering of `publications` to `path`.
pub fn export_bibtex(publications: &[Publication], path: &Path) -> Result<()> {
    fs::write(path, to_bibtex(publications))?;
    Ok(())
}

fn citation_key(publication: &Publication) -> String {
    let surname = publication
        .authors
        .first()
        .map(|author| match &author.surname {
            Some(surname) => surname.clone(),
            // fall back to the last token of the display name
            None => author
                .name
                .split_whitespace()
                .last()
                .unwrap_or("Unknown")
                .to_string(),
        })
        .unwrap_or_else(|| "Unknown".to_string());

    let year = publication
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "nd".to_string());

    format!("{}{}", surname, year)
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

fn render_entry(publication: &Publication, key: &str) -> String {
    let mut entry = format!("@article{{{},\n", key);

    if !publication.title.is_empty() {
        let _ = writeln!(entry, "  title = {{{}}},", publication.title);
    }
    if !publication.authors.is_empty() {
        let authors: Vec<&str> = publication.authors.iter().map(|a| a.name.as_str()).collect();
        let _ = writeln!(entry, "  author = {{{}}},", authors.join(" and "));
    }
    if let Some(journal) = &publication.journal {
        let _ = writeln!(entry, "  journal = {{{}}},", journal);
    }
    if let Some(year) = publication.year {
        let _ = writeln!(entry, "  year = {{{}}},", year);
    }
    if let Some(doi) = &publication.doi {
        let _ = writeln!(entry, "  doi = {{{}}},", doi);
    }

    entry.push_str("}\n");
    entry
}

// === Text rendering ===

/// Render the summary block printed by `analyze` with no flags.
pub fn render_summary(collection: &PublicationCollection) -> String {
    let stats = summary(collection);
    let mut out = String::new();

    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "PUBLICATION SUMMARY");
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "\nTotal publications: {}", stats.total);
    let _ = writeln!(out, "Retrieved: {}", collection.metadata.retrieved_at);

    if let (Some(min), Some(max)) = (stats.min_year, stats.max_year) {
        let _ = writeln!(out, "\nYear range: {} - {}", min, max);
        if let Some(mean) = stats.mean_year {
            let _ = writeln!(out, "Mean year: {:.1}", mean);
        }
        let _ = writeln!(out, "\nPublications by year:");
        for (year, count) in &stats.publications_per_year {
            let _ = writeln!(out, "  {}: {}", year, count);
        }
    }

    if stats.total > 0 {
        let _ = writeln!(out, "\nCitation statistics:");
        let _ = writeln!(out, "  Total citations: {}", stats.total_citations);
        let _ = writeln!(out, "  Average per paper: {:.1}", stats.mean_citations);
        let _ = writeln!(out, "  Most cited: {}", stats.max_citations);
        let _ = writeln!(out, "  Median: {}", stats.median_citations);

        let _ = writeln!(out, "\nData completeness:");
        let percent = |n: usize| 100.0 * n as f64 / stats.total as f64;
        let _ = writeln!(
            out,
            "  With DOI: {}/{} ({:.1}%)",
            stats.with_doi,
            stats.total,
            percent(stats.with_doi)
        );
        let _ = writeln!(
            out,
            "  With abstract: {}/{} ({:.1}%)",
            stats.with_abstract,
            stats.total,
            percent(stats.with_abstract)
        );
        let _ = writeln!(
            out,
            "  With keywords: {}/{} ({:.1}%)",
            stats.with_keywords,
            stats.total,
            percent(stats.with_keywords)
        );
    }

    if !stats.top_journals.is_empty() {
        let _ = writeln!(out, "\nTop journals:");
        for (journal, count) in &stats.top_journals {
            let _ = writeln!(out, "  {}: {}", journal, count);
        }
    }

    out
}

/// Render the keyword frequency table (top twenty).
pub fn render_keywords(publications: &[Publication]) -> String {
    let ranked = keyword_frequency(publications);
    if ranked.is_empty() {
        return "No keywords found\n".to_string();
    }

    let total: usize = ranked.iter().map(|(_, count)| count).sum();
    let mut out = String::new();
    let _ = writeln!(out, "Keyword Analysis:");
    let _ = writeln!(out, "{}", "-".repeat(60));
    let _ = writeln!(out, "Total keywords: {}", total);
    let _ = writeln!(out, "Unique keywords: {}", ranked.len());
    let _ = writeln!(out, "\nMost common keywords:");
    for (keyword, count) in ranked.iter().take(20) {
        let _ = writeln!(out, "  {:3}  {}", count, keyword);
    }
    out
}

/// Render the citation ranking for papers at or above `threshold`.
pub fn render_highly_cited(publications: &[Publication], threshold: u32) -> String {
    let ranked = highly_cited(publications, threshold);
    let mut out = String::new();
    let _ = writeln!(out, "Highly Cited Papers (>={} citations):", threshold);
    let _ = writeln!(out, "{}", "-".repeat(60));

    for publication in ranked {
        let _ = writeln!(
            out,
            "\n[{} citations] {}",
            publication.citation_count, publication.title
        );
        let _ = writeln!(
            out,
            "  {}, {}",
            publication.journal.as_deref().unwrap_or("(no journal)"),
            publication
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "n.d.".to_string())
        );
        if let Some(doi) = &publication.doi {
            let _ = writeln!(out, "  https://doi.org/{}", doi);
        }
    }
    out
}

/// Render the publication listing.
pub fn render_list(publications: &[Publication], format: ListFormat) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Publications:");
    let _ = writeln!(out, "{}", "=".repeat(60));

    for (index, publication) in publications.iter().enumerate() {
        let number = index + 1;
        match format {
            ListFormat::Simple => {
                let mut authors: Vec<&str> = publication
                    .authors
                    .iter()
                    .take(3)
                    .map(|a| a.name.as_str())
                    .collect();
                if publication.authors.len() > 3 {
                    authors.push("et al.");
                }
                let _ = writeln!(out, "\n{}. {}", number, publication.title);
                let _ = writeln!(out, "   {}", authors.join(", "));
                let _ = writeln!(
                    out,
                    "   {}, {}",
                    publication.journal.as_deref().unwrap_or("(no journal)"),
                    publication
                        .year
                        .map(|y| y.to_string())
                        .unwrap_or_else(|| "n.d.".to_string())
                );
                if let Some(doi) = &publication.doi {
                    let _ = writeln!(out, "   DOI: {}", doi);
                }
            }
            ListFormat::Detailed => {
                let _ = writeln!(out, "\n{}", "=".repeat(60));
                let _ = writeln!(out, "[{}] {}", number, publication.title);
                let _ = writeln!(out, "{}", "=".repeat(60));

                let authors: Vec<&str> =
                    publication.authors.iter().map(|a| a.name.as_str()).collect();
                let _ = writeln!(out, "Authors: {}", authors.join(", "));
                let _ = writeln!(
                    out,
                    "Journal: {}",
                    publication.journal.as_deref().unwrap_or("(no journal)")
                );
                let _ = writeln!(
                    out,
                    "Year: {}",
                    publication
                        .year
                        .map(|y| y.to_string())
                        .unwrap_or_else(|| "n.d.".to_string())
                );
                let _ = writeln!(out, "Citations: {}", publication.citation_count);
                if !publication.keywords.is_empty() {
                    let _ = writeln!(out, "Keywords: {}", publication.keywords.join(", "));
                }
                if let Some(doi) = &publication.doi {
                    let _ = writeln!(out, "DOI: https://doi.org/{}", doi);
                }
                if let Some(abstract_text) = &publication.abstract_text {
                    let excerpt: String = abstract_text.chars().take(200).collect();
                    let ellipsis = if abstract_text.chars().count() > 200 {
                        "..."
                    } else {
                        ""
                    };
                    let _ = writeln!(out, "\nAbstract: {}{}", excerpt, ellipsis);
                }
            }
        }
    }
    out
}
