//! Typed failures for the lending operations. Every variant carries enough
//! context to render a useful message, and the storage variant wraps any
//! lower-level SQLite error so `?` can forward it without losing the text.

use thiserror::Error;

/// Everything a lending operation can fail with. Business-rule violations are
/// detected before a transaction commits, so observing one of these means the
/// database was left untouched by the failed call.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A book with the same category, title, press, publish year and author
    /// is already registered.
    #[error("book already registered with the same category, title, press, year and author")]
    DuplicateBook,

    /// A card with the same name, department and kind is already registered.
    #[error("card already registered with the same name, department and type")]
    DuplicateCard,

    #[error("book {0} does not exist")]
    BookNotFound(i64),

    #[error("card {0} does not exist")]
    CardNotFound(i64),

    /// No loan matches the exact (card, book, borrow time) key.
    #[error("no open borrow record for card {card_id}, book {book_id} at {borrow_time}")]
    BorrowNotFound {
        card_id: i64,
        book_id: i64,
        borrow_time: i64,
    },

    /// The book cannot be deleted while copies are still out.
    #[error("book {0} still has unreturned copies")]
    BookOnLoan(i64),

    /// The card cannot be deleted while it holds unreturned books.
    #[error("card {0} still has unreturned books")]
    CardOnLoan(i64),

    /// Applying the delta would leave a negative number of copies.
    #[error("stock of book {book_id} cannot go negative ({stock} {delta:+})")]
    StockUnderflow {
        book_id: i64,
        stock: i64,
        delta: i64,
    },

    /// The card already holds an open loan of this book.
    #[error("card {card_id} has not returned book {book_id} yet")]
    AlreadyBorrowed { card_id: i64, book_id: i64 },

    #[error("return time {return_time} precedes borrow time {borrow_time}")]
    ReturnBeforeBorrow {
        borrow_time: i64,
        return_time: i64,
    },

    /// Any failure reported by the storage layer itself.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Shorthand used by every operation in the `db` modules.
pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
