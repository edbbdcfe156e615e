//! Impress Affiliations CLI
//!
//! Resolves affiliation strings, one per line, and prints one JSON record
//! per line on stdout. Logs go to stderr (`RUST_LOG`, default `info`).
//!
//! Usage:
//!   impress-affiliations resolve \
//!     --institutes grid/institutes.csv \
//!     --addresses grid/addresses.csv \
//!     --cache-db affiliations.sqlite \
//!     affiliations.txt
//!
//!   impress-affiliations fields "Dept. of Biology, Example University, 10001, contact: a@b.com"

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use impress_affiliations::{
    build_extractor, extract_email, extract_zipcode, load_countries, read_affiliations,
    AffiliationConfig, CacheBackend, EntityExtractor, EntitySpan, Pipeline,
};

/// Resolve author affiliations to research-organization registry IDs
#[derive(Parser, Debug)]
#[command(name = "impress-affiliations")]
#[command(version, about)]
struct Cli {
    /// Config file (TOML, or JSON with a .json extension);
    /// defaults to ~/.impress/affiliations.toml when present
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve affiliations read one per line
    Resolve {
        /// Institute table CSV
        #[arg(long)]
        institutes: Option<PathBuf>,

        /// Address table CSV
        #[arg(long)]
        addresses: Option<PathBuf>,

        /// Persist the resolution cache in this SQLite file
        #[arg(long)]
        cache_db: Option<PathBuf>,

        /// Similarity threshold; matches must score strictly above it
        #[arg(long)]
        threshold: Option<f64>,

        /// Resolve on all cores
        #[arg(long)]
        parallel: bool,

        /// Input file; stdin when omitted
        input: Option<PathBuf>,
    },

    /// Show the fields and entity spans extracted from one affiliation
    Fields {
        text: String,
    },
}

#[derive(Serialize)]
struct Fields {
    zipcode: Option<String>,
    email: Option<String>,
    entities: Vec<EntitySpan>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AffiliationConfig::load(path)?,
        None => AffiliationConfig::load_standard()?,
    };

    match cli.command {
        Command::Resolve {
            institutes,
            addresses,
            cache_db,
            threshold,
            parallel,
            input,
        } => {
            let mut config = config;
            if institutes.is_some() {
                config.reference.institutes = institutes;
            }
            if addresses.is_some() {
                config.reference.addresses = addresses;
            }
            if let Some(path) = cache_db {
                config.cache.backend = CacheBackend::Sqlite;
                config.cache.path = Some(path);
            }
            if let Some(threshold) = threshold {
                config.matching.threshold = threshold;
            }
            resolve(&config, input, parallel)
        }
        Command::Fields { text } => fields(&config, &text),
    }
}

fn resolve(
    config: &AffiliationConfig,
    input: Option<PathBuf>,
    parallel: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let texts = read_lines(input)?;
    let pipeline = Pipeline::open(config)?;

    let results = if parallel {
        pipeline.resolve_batch_parallel(&texts)
    } else {
        pipeline.resolve_batch(&texts)
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut failures = 0usize;
    for (text, result) in texts.iter().zip(results) {
        match result {
            Ok(resolved) => writeln!(out, "{}", serde_json::to_string(&resolved)?)?,
            Err(e) => {
                failures += 1;
                tracing::error!("Failed to resolve {:?}: {}", text, e);
            }
        }
    }
    out.flush()?;

    pipeline.finish()?;
    if failures > 0 {
        return Err(format!("{} affiliations could not be resolved", failures).into());
    }
    Ok(())
}

fn fields(config: &AffiliationConfig, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let countries = load_countries(config)?;
    let extractor = build_extractor(config, &countries)?;
    let fields = Fields {
        zipcode: extract_zipcode(text),
        email: extract_email(text),
        entities: extractor.extract_entities(text)?,
    };
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

/// Non-blank lines from `input` or stdin
fn read_lines(input: Option<PathBuf>) -> io::Result<Vec<String>> {
    match input {
        Some(path) => read_affiliations(BufReader::new(File::open(path)?)),
        None => read_affiliations(io::stdin().lock()),
    }
}
