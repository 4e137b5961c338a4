//! Restructuring of a library collection around co-borrowing.
//!
//! Two books are *co-borrowed* when the same patron borrowed both. The
//! co-borrowing graph is split into clusters of connected books; clusters are
//! then ordered by the average number of days their books stay out, and the
//! books of each cluster by title, author or year of publication.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::Date;
use tracing::debug;

use crate::error::{Error, Result};
use crate::hash_map::HashMap;
use crate::ordered_set::OrderedSet;
use crate::sort::{MergeSort, RadixSort};
use crate::stack::Stack;

/// Format of the dates of a borrow record, e.g. `2024-03-16`.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A book of the catalogue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Identifier of the book, the key of every lookup.
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub year_published: i32,
}

/// One loan of one book to one patron.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BorrowRecord {
    pub patron_id: u64,
    /// ISBN of the borrowed book.
    pub book_isbn: String,
    /// Day the book left, as `YYYY-MM-DD`.
    #[serde(deserialize_with = "deserialize_date")]
    pub checkout_date: Date,
    #[serde(deserialize_with = "deserialize_date")]
    pub return_date: Date,
}

impl BorrowRecord {
    /// Number of whole days the book was out.
    pub fn borrow_days(&self) -> i64 {
        (self.return_date - self.checkout_date).whole_days()
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    Date::parse(&text, DATE_FORMAT)
        .map_err(|e| serde::de::Error::custom(format!("invalid date {:?}: {}", text, e)))
}

/// Order of the books within a cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Title,
    Author,
    YearPublished,
}

impl FromStr for SortBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "title" => Ok(SortBy::Title),
            "author" => Ok(SortBy::Author),
            "year" | "yearPublished" | "year_published" => Ok(SortBy::YearPublished),
            _ => Err(Error::UnknownSortKey(s.to_string())),
        }
    }
}

/// A group of co-borrowed books.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cluster {
    /// ISBNs of the books, in the requested order.
    pub isbns: Vec<String>,
    /// Average over the books of their total borrowed days.
    pub average_borrow_days: f64,
}

/// The catalogue, loan totals and co-borrowing graph of a library.
#[derive(Clone, Debug)]
pub struct LibraryRestructuring {
    books: HashMap<String, Book>,
    //  Total borrowed days, per ISBN.
    borrow_days: HashMap<String, i64>,
    //  Co-borrowed neighbours, per borrowed ISBN.
    graph: HashMap<String, OrderedSet<String>>,
}

impl LibraryRestructuring {
    /// Builds the co-borrowing graph of `records` over the catalogue `books`.
    ///
    /// Every borrowed book becomes a vertex, even if nobody borrowed anything
    /// else alongside it.
    ///
    /// #   Errors
    ///
    /// Fails on a record returned before its checkout, or if a map cannot
    /// place an ISBN.
    pub fn new(records: &[BorrowRecord], books: &[Book]) -> Result<Self> {
        let mut catalogue = HashMap::with_capacity(books.len());
        for book in books {
            catalogue.try_insert(book.isbn.clone(), book.clone())?;
        }

        let mut borrow_days: HashMap<String, i64> = HashMap::with_capacity(records.len());
        let mut by_patron: HashMap<u64, OrderedSet<String>> = HashMap::with_capacity(records.len());

        for record in records {
            let days = record.borrow_days();
            if days < 0 {
                return Err(Error::ReturnBeforeCheckout {
                    isbn: record.book_isbn.clone(),
                    patron_id: record.patron_id,
                });
            }

            *borrow_days.try_get_or_insert_default(record.book_isbn.clone())? += days;
            by_patron
                .try_get_or_insert_default(record.patron_id)?
                .insert(record.book_isbn.clone());
        }

        let mut graph: HashMap<String, OrderedSet<String>> = HashMap::with_capacity(borrow_days.len());

        for record in records {
            let neighbours = graph.try_get_or_insert_default(record.book_isbn.clone())?;

            if let Some(borrowed) = by_patron.search(&record.patron_id) {
                neighbours.extend(
                    borrowed
                        .iter()
                        .filter(|isbn| **isbn != record.book_isbn)
                        .cloned(),
                );
            }
        }

        debug!(
            books = catalogue.len(),
            patrons = by_patron.len(),
            vertices = graph.len(),
            "co-borrowing graph built"
        );

        Ok(Self {
            books: catalogue,
            borrow_days,
            graph,
        })
    }

    /// Returns the catalogue entry of `isbn`.
    pub fn book(&self, isbn: &str) -> Option<&Book> {
        self.books.search(isbn)
    }

    /// Returns the total borrowed days of `isbn`, if it was ever borrowed.
    pub fn total_borrow_days(&self, isbn: &str) -> Option<i64> {
        self.borrow_days.search(isbn).copied()
    }

    /// Returns the books co-borrowed with `isbn`, if it was ever borrowed.
    pub fn neighbours(&self, isbn: &str) -> Option<&OrderedSet<String>> {
        self.graph.search(isbn)
    }

    /// Returns the co-borrowing graph.
    pub fn graph(&self) -> &HashMap<String, OrderedSet<String>> {
        &self.graph
    }

    /// Returns the average, over `isbns`, of their total borrowed days.
    pub fn average_borrow_days(&self, isbns: &[String]) -> f64 {
        if isbns.is_empty() {
            return 0.0;
        }

        let total: i64 = isbns.iter().filter_map(|isbn| self.total_borrow_days(isbn)).sum();
        total as f64 / isbns.len() as f64
    }

    /// Splits the graph into clusters of at least two connected books, and
    /// orders them.
    ///
    /// Clusters come in increasing order of average borrowed days, truncated
    /// to whole days; books within a cluster are ordered by `sort_by`, books
    /// missing from the catalogue first.
    ///
    /// #   Errors
    ///
    /// Fails if the visited marker cannot place an ISBN.
    pub fn cluster_and_sort(&self, sort_by: SortBy) -> Result<Vec<Cluster>> {
        let mut clusters = self.clusters()?;

        RadixSort::new(|isbns: &Vec<String>| self.average_borrow_days(isbns) as i64).sort(&mut clusters);

        let sorter = self.book_order(sort_by);
        let clusters: Vec<Cluster> = clusters
            .into_iter()
            .map(|mut isbns| {
                sorter.sort(&mut isbns);
                let average_borrow_days = self.average_borrow_days(&isbns);
                Cluster {
                    isbns,
                    average_borrow_days,
                }
            })
            .collect();

        debug!(clusters = clusters.len(), ?sort_by, "clusters sorted");
        Ok(clusters)
    }

    fn book_order(&self, sort_by: SortBy) -> MergeSort<'_, String> {
        let books = &self.books;

        match sort_by {
            SortBy::Title => MergeSort::new(move |a: &String, b: &String| {
                books.search(a).map(|book| &book.title) < books.search(b).map(|book| &book.title)
            }),
            SortBy::Author => MergeSort::new(move |a: &String, b: &String| {
                books.search(a).map(|book| &book.author) < books.search(b).map(|book| &book.author)
            }),
            SortBy::YearPublished => MergeSort::new(move |a: &String, b: &String| {
                books.search(a).map(|book| book.year_published)
                    < books.search(b).map(|book| book.year_published)
            }),
        }
    }

    //  Connected components of two or more books, in graph slot order.
    fn clusters(&self) -> Result<Vec<Vec<String>>> {
        let mut visited: HashMap<&str, bool> = HashMap::with_capacity(self.graph.len());
        for isbn in self.graph.keys() {
            visited.try_insert(isbn.as_str(), false)?;
        }

        let mut clusters = Vec::new();
        for isbn in self.graph.keys() {
            if *visited.try_get_or_insert_default(isbn.as_str())? {
                continue;
            }

            let cluster = self.depth_first(isbn, &mut visited)?;
            if cluster.len() > 1 {
                clusters.push(cluster);
            }
        }

        Ok(clusters)
    }

    //  Pre-order walk from `start`, neighbours in increasing order.
    fn depth_first<'a>(&'a self, start: &'a str, visited: &mut HashMap<&'a str, bool>) -> Result<Vec<String>> {
        let mut cluster = Vec::new();
        let mut pending = Stack::new();
        pending.push(start);

        while let Some(isbn) = pending.pop() {
            let seen = visited.try_get_or_insert_default(isbn)?;
            if *seen {
                continue;
            }
            *seen = true;
            cluster.push(isbn.to_string());

            if let Some(neighbours) = self.graph.search(isbn) {
                //  Pushed in reverse so that the smallest is visited first.
                pending.extend(
                    neighbours
                        .iter()
                        .rev()
                        .map(String::as_str)
                        .filter(|next| visited.search(next) != Some(&true)),
                );
            }
        }

        Ok(cluster)
    }
}
