//! Borrow and return lifecycle. A (card, book) pair is either available or
//! out on exactly one open loan; the open state is a `return_time` of zero on
//! the loan row. Both operations compose the catalog's stock adjustment
//! inside their own transaction so a failure at any step leaves stock and
//! loan rows exactly as they were.

use rusqlite::{params, Connection, Transaction};

use super::books::adjust_stock_in;
use super::error::{LibraryError, LibraryResult};
use crate::models::HistoryEntry;

/// `return_time` value marking a loan as not yet returned.
const OPEN_LOAN: i64 = 0;

/// Record a borrow: refuse if the card already holds an open loan of this
/// book, take one copy off the shelf, then write the loan row. Commits only
/// after both writes succeed.
pub fn borrow_book(
    conn: &mut Connection,
    card_id: i64,
    book_id: i64,
    borrow_time: i64,
) -> LibraryResult<()> {
    let tx = conn.transaction()?;

    if open_loan_exists(&tx, card_id, book_id)? {
        return Err(LibraryError::AlreadyBorrowed { card_id, book_id });
    }

    adjust_stock_in(&tx, book_id, -1)?;

    tx.execute(
        "INSERT INTO borrow (card_id, book_id, borrow_time, return_time)
         VALUES (?1, ?2, ?3, ?4)",
        params![card_id, book_id, borrow_time, OPEN_LOAN],
    )?;

    tx.commit()?;
    Ok(())
}

/// Record a return: the loan is matched by its exact (card, book, borrow
/// time) key and must still be open, the copy goes back on the shelf, and
/// the return time is stamped onto the row. A return dated before the borrow
/// is refused outright.
pub fn return_book(
    conn: &mut Connection,
    card_id: i64,
    book_id: i64,
    borrow_time: i64,
    return_time: i64,
) -> LibraryResult<()> {
    if return_time < borrow_time {
        return Err(LibraryError::ReturnBeforeBorrow {
            borrow_time,
            return_time,
        });
    }

    let tx = conn.transaction()?;

    let open = {
        let mut stmt = tx.prepare(
            "SELECT 1 FROM borrow
             WHERE card_id = ?1 AND book_id = ?2 AND borrow_time = ?3 AND return_time = ?4",
        )?;
        stmt.exists(params![card_id, book_id, borrow_time, OPEN_LOAN])?
    };
    if !open {
        return Err(LibraryError::BorrowNotFound {
            card_id,
            book_id,
            borrow_time,
        });
    }

    adjust_stock_in(&tx, book_id, 1)?;

    tx.execute(
        "UPDATE borrow SET return_time = ?1
         WHERE card_id = ?2 AND book_id = ?3 AND borrow_time = ?4 AND return_time = ?5",
        params![return_time, card_id, book_id, borrow_time, OPEN_LOAN],
    )?;

    tx.commit()?;
    Ok(())
}

/// A card's full borrow history joined with the books it refers to, most
/// recent borrow first, book id breaking ties.
pub fn borrow_history(conn: &Connection, card_id: i64) -> LibraryResult<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT b.card_id, b.book_id, b.borrow_time, b.return_time,
                k.category, k.title, k.press, k.publish_year, k.author, k.price
         FROM borrow b
         INNER JOIN book k ON k.book_id = b.book_id
         WHERE b.card_id = ?1
         ORDER BY b.borrow_time DESC, b.book_id ASC",
    )?;
    let entries = stmt
        .query_map(params![card_id], |row| {
            Ok(HistoryEntry {
                card_id: row.get(0)?,
                book_id: row.get(1)?,
                borrow_time: row.get(2)?,
                return_time: row.get(3)?,
                category: row.get(4)?,
                title: row.get(5)?,
                press: row.get(6)?,
                publish_year: row.get(7)?,
                author: row.get(8)?,
                price: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Whether this card currently holds an open loan of this book.
fn open_loan_exists(
    tx: &Transaction<'_>,
    card_id: i64,
    book_id: i64,
) -> rusqlite::Result<bool> {
    let mut stmt = tx.prepare(
        "SELECT 1 FROM borrow WHERE card_id = ?1 AND book_id = ?2 AND return_time = ?3",
    )?;
    stmt.exists(params![card_id, book_id, OPEN_LOAN])
}

/// Whether any copy of the book is still out. Blocks catalog deletion.
pub(crate) fn book_has_open_loan(
    tx: &Transaction<'_>,
    book_id: i64,
) -> rusqlite::Result<bool> {
    let mut stmt =
        tx.prepare("SELECT 1 FROM borrow WHERE book_id = ?1 AND return_time = ?2")?;
    stmt.exists(params![book_id, OPEN_LOAN])
}

/// Whether the card still holds any unreturned book. Blocks card deletion.
pub(crate) fn card_has_open_loan(
    tx: &Transaction<'_>,
    card_id: i64,
) -> rusqlite::Result<bool> {
    let mut stmt =
        tx.prepare("SELECT 1 FROM borrow WHERE card_id = ?1 AND return_time = ?2")?;
    stmt.exists(params![card_id, OPEN_LOAN])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::books::{query_books, remove_book, store_book};
    use crate::db::cards::{register_card, remove_card};
    use crate::db::connection::open_memory;
    use crate::models::{Book, BookQuery, Card, CardKind};

    /// One card and one ten-copy book, ids 1 and 1.
    fn lending_fixture(conn: &mut Connection) -> (i64, i64) {
        let mut card = Card::new("PaperCloud", "CS", CardKind::Student);
        register_card(conn, &mut card).unwrap();
        let mut book = Book::new(
            "Computer Science",
            "Database System Concepts",
            "Machine Industry Press",
            2023,
            "Mike",
            188.88,
            10,
        );
        store_book(conn, &mut book).unwrap();
        (card.id, book.id)
    }

    fn stock_of(conn: &Connection, book_id: i64) -> i64 {
        let books = query_books(conn, &BookQuery::default()).unwrap();
        books.iter().find(|b| b.id == book_id).unwrap().stock
    }

    #[test]
    fn borrow_takes_one_copy_and_return_puts_it_back() {
        let mut conn = open_memory().unwrap();
        let (card, book) = lending_fixture(&mut conn);

        borrow_book(&mut conn, card, book, 20230423).unwrap();
        assert_eq!(stock_of(&conn, book), 9);

        return_book(&mut conn, card, book, 20230423, 20230424).unwrap();
        assert_eq!(stock_of(&conn, book), 10);
    }

    #[test]
    fn second_borrow_of_same_book_is_refused_and_stock_drops_once() {
        let mut conn = open_memory().unwrap();
        let (card, book) = lending_fixture(&mut conn);

        borrow_book(&mut conn, card, book, 20230423).unwrap();
        let err = borrow_book(&mut conn, card, book, 20230423).unwrap_err();
        assert!(matches!(
            err,
            LibraryError::AlreadyBorrowed { card_id: 1, book_id: 1 }
        ));
        assert_eq!(stock_of(&conn, book), 9);

        // A different card can still take the same title.
        let mut other = Card::new("fr20011021", "Math", CardKind::Student);
        register_card(&mut conn, &mut other).unwrap();
        borrow_book(&mut conn, other.id, book, 20230423).unwrap();
        assert_eq!(stock_of(&conn, book), 8);
    }

    #[test]
    fn borrowing_the_last_copy_works_but_not_one_more() {
        let mut conn = open_memory().unwrap();
        let mut card = Card::new("itolfy", "CS", CardKind::Student);
        register_card(&mut conn, &mut card).unwrap();
        let mut book = Book::new("Math", "Real Analysis", "Unknown", 2023, "Folland", 100.0, 1);
        store_book(&mut conn, &mut book).unwrap();

        borrow_book(&mut conn, card.id, book.id, 1).unwrap();
        assert_eq!(stock_of(&conn, book.id), 0);

        let mut other = Card::new("PaperCloud", "CS", CardKind::Student);
        register_card(&mut conn, &mut other).unwrap();
        let err = borrow_book(&mut conn, other.id, book.id, 2).unwrap_err();
        assert!(matches!(err, LibraryError::StockUnderflow { stock: 0, .. }));

        // The failed borrow wrote no loan row for the second card.
        assert!(borrow_history(&conn, other.id).unwrap().is_empty());
    }

    #[test]
    fn borrowing_a_missing_book_writes_nothing() {
        let mut conn = open_memory().unwrap();
        let mut card = Card::new("itolfy", "CS", CardKind::Student);
        register_card(&mut conn, &mut card).unwrap();

        let err = borrow_book(&mut conn, card.id, 77, 1).unwrap_err();
        assert!(matches!(err, LibraryError::BookNotFound(77)));
        assert!(borrow_history(&conn, card.id).unwrap().is_empty());
    }

    #[test]
    fn return_before_borrow_is_refused() {
        let mut conn = open_memory().unwrap();
        let (card, book) = lending_fixture(&mut conn);
        borrow_book(&mut conn, card, book, 20230423).unwrap();

        let err = return_book(&mut conn, card, book, 20230423, 20230422).unwrap_err();
        assert!(matches!(err, LibraryError::ReturnBeforeBorrow { .. }));
        assert_eq!(stock_of(&conn, book), 9);
    }

    #[test]
    fn return_must_match_the_exact_borrow_time() {
        let mut conn = open_memory().unwrap();
        let (card, book) = lending_fixture(&mut conn);
        borrow_book(&mut conn, card, book, 20230423).unwrap();

        let err = return_book(&mut conn, card, book, 20230425, 20230426).unwrap_err();
        assert!(matches!(err, LibraryError::BorrowNotFound { .. }));
        assert_eq!(stock_of(&conn, book), 9);
    }

    #[test]
    fn returning_twice_fails_and_stock_rises_once() {
        let mut conn = open_memory().unwrap();
        let (card, book) = lending_fixture(&mut conn);
        borrow_book(&mut conn, card, book, 20230423).unwrap();

        return_book(&mut conn, card, book, 20230423, 20230424).unwrap();
        let err = return_book(&mut conn, card, book, 20230423, 20230425).unwrap_err();
        assert!(matches!(err, LibraryError::BorrowNotFound { .. }));
        assert_eq!(stock_of(&conn, book), 10);
    }

    #[test]
    fn closed_loan_allows_borrowing_the_same_book_again() {
        let mut conn = open_memory().unwrap();
        let (card, book) = lending_fixture(&mut conn);

        borrow_book(&mut conn, card, book, 100).unwrap();
        return_book(&mut conn, card, book, 100, 200).unwrap();
        borrow_book(&mut conn, card, book, 300).unwrap();

        let history = borrow_history(&conn, card).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].borrow_time, 300);
        assert_eq!(history[0].return_time, 0);
        assert_eq!(history[1].borrow_time, 100);
        assert_eq!(history[1].return_time, 200);
    }

    #[test]
    fn history_sorts_by_time_desc_then_book_id() {
        let mut conn = open_memory().unwrap();
        let mut card = Card::new("PaperCloud", "CS", CardKind::Student);
        register_card(&mut conn, &mut card).unwrap();
        let mut first = Book::new("CS", "Databases", "Alpha Press", 2005, "Ada", 30.0, 5);
        let mut second = Book::new("CS", "Compilers", "Beta House", 2010, "Bob", 60.0, 2);
        store_book(&mut conn, &mut first).unwrap();
        store_book(&mut conn, &mut second).unwrap();

        // Both borrowed at the same instant, then one more later.
        borrow_book(&mut conn, card.id, second.id, 100).unwrap();
        borrow_book(&mut conn, card.id, first.id, 100).unwrap();
        return_book(&mut conn, card.id, first.id, 100, 150).unwrap();
        borrow_book(&mut conn, card.id, first.id, 200).unwrap();

        let history = borrow_history(&conn, card.id).unwrap();
        let keys: Vec<(i64, i64)> = history.iter().map(|h| (h.borrow_time, h.book_id)).collect();
        assert_eq!(keys, vec![(200, 1), (100, 1), (100, 2)]);
        assert_eq!(history[0].title, "Databases");
        assert_eq!(history[2].author, "Bob");
    }

    #[test]
    fn open_loan_blocks_book_and_card_deletion_until_returned() {
        let mut conn = open_memory().unwrap();
        let (card, book) = lending_fixture(&mut conn);
        borrow_book(&mut conn, card, book, 20230423).unwrap();

        let err = remove_book(&mut conn, book).unwrap_err();
        assert!(matches!(err, LibraryError::BookOnLoan(1)));
        let err = remove_card(&mut conn, card).unwrap_err();
        assert!(matches!(err, LibraryError::CardOnLoan(1)));

        return_book(&mut conn, card, book, 20230423, 20230424).unwrap();
        remove_card(&mut conn, card).unwrap();
        remove_book(&mut conn, book).unwrap();
    }
}
