//! Persistence module split across logical submodules. Each public operation
//! owns one transaction: it commits on success and any early return unwinds
//! the `Transaction` guard, rolling everything back.

mod books;
mod borrows;
mod cards;
mod connection;
pub mod error;

pub use books::{adjust_stock, modify_book, query_books, remove_book, store_book, store_books};
pub use borrows::{borrow_book, borrow_history, return_book};
pub use cards::{list_cards, register_card, remove_card};
pub use connection::{ensure_schema, open_at, open_memory, reset_tables};
pub use error::{LibraryError, LibraryResult};
