use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use serde::de::DeserializeOwned;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shelving::{Book, BorrowRecord, LibraryRestructuring, SortBy};

/// Group co-borrowed books into clusters, ordered by how long their books stay out
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Opts {
    /// Book catalogue: a JSON array, or one JSON object per line ("-" for stdin)
    #[arg(long)]
    books: PathBuf,
    /// Borrow records, in the same formats ("-" for stdin)
    #[arg(long)]
    records: PathBuf,
    /// Order of the books within each cluster
    #[arg(long, value_enum, default_value_t = SortKey::Title)]
    sort_by: SortKey,
    /// Print the clusters as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortKey {
    Title,
    Author,
    Year,
}

impl From<SortKey> for SortBy {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Title => SortBy::Title,
            SortKey::Author => SortBy::Author,
            SortKey::Year => SortBy::YearPublished,
        }
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Parses either a JSON array or newline-delimited JSON objects.
fn parse_rows<T: DeserializeOwned>(buf: &str) -> Result<Vec<T>> {
    let s = buf.trim();

    if s.starts_with('[') {
        return serde_json::from_str(s).context("invalid JSON array");
    }

    buf.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(n, l)| serde_json::from_str(l).with_context(|| format!("invalid JSON on line {}", n + 1)))
        .collect()
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let buf = read_input(path)?;
    parse_rows(&buf).with_context(|| format!("loading {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parse();
    ensure!(
        !(is_stdin(&opts.books) && is_stdin(&opts.records)),
        "only one of --books and --records can be read from stdin"
    );

    let books: Vec<Book> = load(&opts.books)?;
    let records: Vec<BorrowRecord> = load(&opts.records)?;
    info!(books = books.len(), records = records.len(), "inputs loaded");

    let library = LibraryRestructuring::new(&records, &books)?;
    let clusters = library.cluster_and_sort(opts.sort_by.into())?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&clusters)?);
        return Ok(());
    }

    println!("Clusters:");
    for (n, cluster) in clusters.iter().enumerate() {
        println!("  #{} (average {:.1} days)", n + 1, cluster.average_borrow_days);
        for isbn in &cluster.isbns {
            let title = library.book(isbn).map_or("?", |book| book.title.as_str());
            println!("    {} {}", isbn, title);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn parses_array_and_ndjson() {
        let array: Vec<Book> = parse_rows(
            r#"[{"isbn": "1", "title": "Emma", "author": "Austen", "year_published": 1815}]"#,
        )
        .unwrap();

        let lines: Vec<Book> = parse_rows(
            "{\"isbn\": \"1\", \"title\": \"Emma\", \"author\": \"Austen\", \"year_published\": 1815}\n\n",
        )
        .unwrap();

        assert_eq!(array, lines);
        assert_eq!("Emma", array[0].title);
    }

    #[test]
    fn reports_the_bad_line() {
        let error = parse_rows::<Book>("{\"isbn\": \"1\"}\n").unwrap_err();
        assert_eq!("invalid JSON on line 1", error.to_string());
    }

    #[test]
    fn cli_parses() {
        let opts = Opts::try_parse_from(["shelving", "--books", "b.json", "--records", "-", "--sort-by", "year"]).unwrap();

        assert!(is_stdin(&opts.records));
        assert!(!opts.json);
        assert_eq!(SortBy::YearPublished, SortBy::from(opts.sort_by));
    }
}
