//! The Error and Result types of this library.
//!
//! Misses (an absent key, an empty stack) are never errors: they are reported
//! through `Option` or `bool`. An `Error` means either that a container was
//! configured with parameters it cannot work with, or that an operation could
//! not complete without losing data.

use thiserror::Error;

/// Universal Error type of this library.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A hash map was configured with no slots at all.
    #[error("hash map capacity must be at least 1")]
    ZeroCapacity,
    /// The load factor threshold is not within `(0, 1]`.
    #[error("load factor threshold {0} is outside (0, 1]")]
    LoadFactorOutOfRange(f64),
    /// A hash map was configured with an empty probe window.
    #[error("hop range must be at least 1")]
    ZeroHopRange,
    /// Doubling the number of slots would overflow `usize`.
    #[error("hash map capacity overflow")]
    CapacityOverflow,
    /// A key could not be placed within its hop window, even after growing.
    #[error("no free slot within the hop window (capacity {capacity})")]
    HopWindowExhausted {
        /// Capacity of the map when placement gave up.
        capacity: usize,
    },
    /// A sort key other than title, author or year.
    #[error("unknown sort key {0:?}, expected title, author or year")]
    UnknownSortKey(String),
    /// A borrow record claims the book came back before it left.
    #[error("book {isbn} returned before it was checked out by patron {patron_id}")]
    ReturnBeforeCheckout {
        /// The book concerned.
        isbn: String,
        /// The patron who borrowed it.
        patron_id: u64,
    },
}

/// Universal Result type of this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn error_display() {
        assert_eq!("hop range must be at least 1", Error::ZeroHopRange.to_string());
        assert_eq!(
            "no free slot within the hop window (capacity 64)",
            Error::HopWindowExhausted { capacity: 64 }.to_string()
        );
        assert_eq!(
            "load factor threshold 1.5 is outside (0, 1]",
            Error::LoadFactorOutOfRange(1.5).to_string()
        );
    }
}
