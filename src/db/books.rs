//! Catalog operations: registration, stock keeping, modification, deletion
//! and search. Each public function owns one transaction for its whole
//! duration; helpers take the transaction explicitly so composed operations
//! (such as a borrow adjusting stock) stay inside a single atomic scope.

use rusqlite::{params, Connection, OptionalExtension, Row, ToSql, Transaction};

use super::borrows::book_has_open_loan;
use super::error::{LibraryError, LibraryResult};
use crate::models::{Book, BookQuery};

/// Register a single book. Fails when another row already carries the same
/// five-field edition key; on success the generated id is written back onto
/// the record.
pub fn store_book(conn: &mut Connection, book: &mut Book) -> LibraryResult<()> {
    let tx = conn.transaction()?;
    insert_book(&tx, book)?;
    tx.commit()?;
    Ok(())
}

/// Register a whole batch as one transaction. Books are first compared
/// pairwise against each other (a collision rejects the batch before storage
/// is touched), then inserted in list order with the usual duplicate check.
/// The first collision of either kind aborts everything; no row of a failed
/// batch survives. On success every book has its id populated.
pub fn store_books(conn: &mut Connection, books: &mut [Book]) -> LibraryResult<()> {
    for i in 0..books.len() {
        for j in i + 1..books.len() {
            if books[i].same_edition(&books[j]) {
                return Err(LibraryError::DuplicateBook);
            }
        }
    }

    let tx = conn.transaction()?;
    for book in books.iter_mut() {
        insert_book(&tx, book)?;
    }
    tx.commit()?;
    Ok(())
}

/// Duplicate-check then insert, writing the generated id back. Shared by the
/// single and batch registration paths.
fn insert_book(tx: &Transaction<'_>, book: &mut Book) -> LibraryResult<()> {
    if edition_exists(tx, book)? {
        return Err(LibraryError::DuplicateBook);
    }

    tx.execute(
        "INSERT INTO book (category, title, press, publish_year, author, price, stock)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            book.category,
            book.title,
            book.press,
            book.publish_year,
            book.author,
            book.price,
            book.stock
        ],
    )?;
    book.id = tx.last_insert_rowid();
    Ok(())
}

/// Whether a stored row already carries this book's edition key.
fn edition_exists(tx: &Transaction<'_>, book: &Book) -> rusqlite::Result<bool> {
    let mut stmt = tx.prepare(
        "SELECT 1 FROM book
         WHERE category = ?1 AND title = ?2 AND press = ?3 AND publish_year = ?4 AND author = ?5",
    )?;
    stmt.exists(params![
        book.category,
        book.title,
        book.press,
        book.publish_year,
        book.author
    ])
}

/// Add a signed delta to a book's stock. The delta may be negative, but the
/// resulting stock may not: the update is refused and nothing changes when it
/// would drop below zero.
pub fn adjust_stock(conn: &mut Connection, book_id: i64, delta: i64) -> LibraryResult<()> {
    let tx = conn.transaction()?;
    adjust_stock_in(&tx, book_id, delta)?;
    tx.commit()?;
    Ok(())
}

/// Transaction-scoped body of [`adjust_stock`]. The circulation operations
/// call this directly so the stock change commits or rolls back together
/// with the loan row they are writing. This is the only code path that
/// mutates the stock column.
pub(crate) fn adjust_stock_in(
    tx: &Transaction<'_>,
    book_id: i64,
    delta: i64,
) -> LibraryResult<()> {
    let stock: i64 = tx
        .query_row(
            "SELECT stock FROM book WHERE book_id = ?1",
            params![book_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(LibraryError::BookNotFound(book_id))?;

    let next = stock + delta;
    if next < 0 {
        return Err(LibraryError::StockUnderflow {
            book_id,
            stock,
            delta,
        });
    }

    tx.execute(
        "UPDATE book SET stock = ?1 WHERE book_id = ?2",
        params![next, book_id],
    )?;
    Ok(())
}

/// Overwrite a registered book's descriptive fields. The id and the stock
/// count are immutable through this path; stock moves only via
/// [`adjust_stock`].
pub fn modify_book(conn: &mut Connection, book: &Book) -> LibraryResult<()> {
    let tx = conn.transaction()?;
    let updated = tx.execute(
        "UPDATE book SET category = ?1, title = ?2, press = ?3, publish_year = ?4,
                         author = ?5, price = ?6
         WHERE book_id = ?7",
        params![
            book.category,
            book.title,
            book.press,
            book.publish_year,
            book.author,
            book.price,
            book.id
        ],
    )?;
    if updated == 0 {
        return Err(LibraryError::BookNotFound(book.id));
    }
    tx.commit()?;
    Ok(())
}

/// Delete a book from the catalog. Refused while any copy is still out on an
/// open loan; closed loans keep their historical rows and do not block.
pub fn remove_book(conn: &mut Connection, book_id: i64) -> LibraryResult<()> {
    let tx = conn.transaction()?;
    if book_has_open_loan(&tx, book_id)? {
        return Err(LibraryError::BookOnLoan(book_id));
    }
    let deleted = tx.execute("DELETE FROM book WHERE book_id = ?1", params![book_id])?;
    if deleted == 0 {
        return Err(LibraryError::BookNotFound(book_id));
    }
    tx.commit()?;
    Ok(())
}

/// Search the catalog. Active filters are ANDed; results come back in the
/// requested sort order with `book_id` ascending breaking ties. The ORDER BY
/// clause is assembled from the [`crate::models::SortColumn`] enum, never
/// from caller text.
pub fn query_books(conn: &Connection, query: &BookQuery) -> LibraryResult<Vec<Book>> {
    // LIKE patterns have to outlive the parameter slice below.
    let title_like = query.title.as_ref().map(|t| format!("%{t}%"));
    let press_like = query.press.as_ref().map(|p| format!("%{p}%"));
    let author_like = query.author.as_ref().map(|a| format!("%{a}%"));

    let mut clauses: Vec<&'static str> = Vec::new();
    let mut values: Vec<&dyn ToSql> = Vec::new();
    if let Some(category) = &query.category {
        clauses.push("category = ?");
        values.push(category);
    }
    if let Some(pattern) = &title_like {
        clauses.push("title LIKE ?");
        values.push(pattern);
    }
    if let Some(pattern) = &press_like {
        clauses.push("press LIKE ?");
        values.push(pattern);
    }
    if let Some(pattern) = &author_like {
        clauses.push("author LIKE ?");
        values.push(pattern);
    }
    if let Some(year) = &query.min_publish_year {
        clauses.push("publish_year >= ?");
        values.push(year);
    }
    if let Some(year) = &query.max_publish_year {
        clauses.push("publish_year <= ?");
        values.push(year);
    }
    if let Some(price) = &query.min_price {
        clauses.push("price >= ?");
        values.push(price);
    }
    if let Some(price) = &query.max_price {
        clauses.push("price <= ?");
        values.push(price);
    }

    let filter = if clauses.is_empty() {
        String::from("1=1")
    } else {
        clauses.join(" AND ")
    };
    let sql = format!(
        "SELECT book_id, category, title, press, publish_year, author, price, stock
         FROM book WHERE {filter}
         ORDER BY {} {}, book_id ASC",
        query.sort_by.column(),
        query.order.keyword()
    );

    let mut stmt = conn.prepare(&sql)?;
    let books = stmt
        .query_map(values.as_slice(), read_book_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}

fn read_book_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        category: row.get(1)?,
        title: row.get(2)?,
        press: row.get(3)?,
        publish_year: row.get(4)?,
        author: row.get(5)?,
        price: row.get(6)?,
        stock: row.get(7)?,
    })
}
