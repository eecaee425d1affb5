//! Core library surface for the lending manager.
//!
//! The public modules exposed here provide an intentionally small API so an
//! embedding host (an HTTP handler, an RPC service, a scripted test driver)
//! can call the catalog, membership and circulation operations directly and
//! get back either a typed `Result` or the flattened [`Outcome`] envelope.
pub mod db;
pub mod models;
pub mod outcome;

/// Convenience re-exports for the persistence layer. `ensure_schema` brings
/// up the on-disk store, `open_memory` a throwaway one, and `reset_tables`
/// restores a clean fixture state.
pub use db::{
    adjust_stock, borrow_book, borrow_history, ensure_schema, list_cards, modify_book, open_at,
    open_memory, query_books, register_card, remove_book, remove_card, reset_tables, return_book,
    store_book, store_books, LibraryError, LibraryResult,
};

/// The domain types the operations consume and produce.
pub use models::{Book, BookQuery, Card, CardKind, HistoryEntry, SortColumn, SortOrder};

/// The uniform success/message/payload envelope for hosts that cannot branch
/// on `Result` directly.
pub use outcome::Outcome;
