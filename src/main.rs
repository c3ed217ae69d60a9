//! refscope - Scopus Publication Retrieval & Analysis
//!
//! A CLI for downloading publication records from the Scopus Search API
//! and analyzing the resulting JSON documents.
//!
//! ## Usage
//!
//! ```bash
//! refscope fetch --name "Jane Doe" --start-year 2018 --end-year 2023
//! refscope analyze Doe_Jane_2018-2023.json --keywords
//! refscope analyze Doe_Jane_2018-2023.json --bibtex refs.bib
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use refscope::analyze::{self, ListFormat};
use refscope::collection::PublicationCollection;
use refscope::error::RefscopeError;
use refscope::query::{SearchQuery, Selector};
use refscope::record;
use refscope::scopus::ScopusClient;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Scopus Publication Retrieval & Analysis
#[derive(Parser)]
#[command(name = "refscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download publications from the Scopus API
    Fetch {
        /// Author name ("First Last" or "Last, First")
        #[arg(long)]
        name: Option<String>,

        /// ORCID identifier
        #[arg(long)]
        orcid: Option<String>,

        /// Institution name
        #[arg(long)]
        institution: Option<String>,

        /// Earliest publication year (inclusive)
        #[arg(long)]
        start_year: Option<i32>,

        /// Latest publication year (inclusive)
        #[arg(long)]
        end_year: Option<i32>,

        /// Maximum number of results to retrieve
        #[arg(long)]
        limit: Option<usize>,

        /// Output filename (default: derived from the query)
        #[arg(short, long)]
        output: Option<String>,

        /// Scopus API key (default: SCOPUS_API_KEY environment variable)
        #[arg(long)]
        api_key: Option<String>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Analyze a JSON document produced by `fetch`
    Analyze {
        /// JSON file to analyze
        file: PathBuf,

        /// Show keyword frequency analysis
        #[arg(short, long)]
        keywords: bool,

        /// List all DOIs
        #[arg(short = 'D', long)]
        dois: bool,

        /// List all publication URLs
        #[arg(short, long)]
        urls: bool,

        /// Show papers with at least N citations
        #[arg(short = 'c', long, value_name = "N")]
        highly_cited: Option<u32>,

        /// List all publications
        #[arg(short, long, value_enum, value_name = "FORMAT")]
        list: Option<ListFormat>,

        /// Export to BibTeX at the given path
        #[arg(short, long, value_name = "OUTPUT")]
        bibtex: Option<PathBuf>,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Fetch {
            name,
            orcid,
            institution,
            start_year,
            end_year,
            limit,
            output,
            api_key,
            quiet,
        } => {
            run_fetch(
                name,
                orcid,
                institution,
                start_year,
                end_year,
                limit,
                output,
                api_key,
                quiet,
            )
            .await
        }
        Commands::Analyze {
            file,
            keywords,
            dois,
            urls,
            highly_cited,
            list,
            bibtex,
        } => run_analyze(&file, keywords, dois, urls, highly_cited, list, bibtex),
    }
}

// ============================================================================
// Fetch
// ============================================================================

#[allow(clippy::too_many_arguments)]
async fn run_fetch(
    name: Option<String>,
    orcid: Option<String>,
    institution: Option<String>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    limit: Option<usize>,
    output: Option<String>,
    api_key: Option<String>,
    quiet: bool,
) -> Result<()> {
    // Configuration errors fail before any network access
    let selector = Selector::from_flags(name, orcid, institution)?;
    let query = SearchQuery::new(selector, start_year, end_year, limit)?;

    // Credentials are resolved here at the CLI boundary and passed down
    // explicitly; nothing below reads the environment.
    let api_key = api_key
        .or_else(|| std::env::var("SCOPUS_API_KEY").ok())
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| RefscopeError::Auth("no Scopus API key found".to_string()))?;

    let client = ScopusClient::new(api_key)?;

    if !quiet {
        println!("Searching with query: {}", query.expression());
    }

    let entries = client.search(&query).await?;
    if entries.is_empty() {
        // Zero results is a valid outcome, not an error
        println!("No publications found");
        return Ok(());
    }

    let publications: Vec<record::Publication> = entries.iter().map(record::normalize).collect();
    let collection = PublicationCollection::new(publications);

    let filename = query.output_filename(output.as_deref());
    collection.save(Path::new(&filename))?;

    if !quiet {
        let stats = analyze::summary(&collection);
        println!(
            "Saved {} publications to: {}",
            collection.publications.len(),
            filename
        );
        if let (Some(min), Some(max)) = (stats.min_year, stats.max_year) {
            println!("Year range: {} - {}", min, max);
        }
        println!("Publications with DOI: {}/{}", stats.with_doi, stats.total);
        println!(
            "Publications with abstract: {}/{}",
            stats.with_abstract, stats.total
        );
    }

    Ok(())
}

// ============================================================================
// Analyze
// ============================================================================

fn run_analyze(
    file: &Path,
    keywords: bool,
    dois: bool,
    urls: bool,
    highly_cited: Option<u32>,
    list: Option<ListFormat>,
    bibtex: Option<PathBuf>,
) -> Result<()> {
    let collection = PublicationCollection::load(file)?;
    let publications = &collection.publications;

    if keywords {
        print!("{}", analyze::render_keywords(publications));
    } else if dois {
        println!("DOIs:");
        println!("{}", "-".repeat(60));
        for doi in analyze::dois(publications) {
            println!("{}", doi);
        }
    } else if urls {
        println!("URLs:");
        println!("{}", "-".repeat(60));
        for url in analyze::urls(publications) {
            println!("{}", url);
        }
    } else if let Some(threshold) = highly_cited {
        print!("{}", analyze::render_highly_cited(publications, threshold));
    } else if let Some(format) = list {
        print!("{}", analyze::render_list(publications, format));
    } else if let Some(destination) = bibtex {
        analyze::export_bibtex(publications, &destination)?;
        println!(
            "Exported {} entries to {}",
            publications.len(),
            destination.display()
        );
    } else {
        print!("{}", analyze::render_summary(&collection));
    }

    Ok(())
}
