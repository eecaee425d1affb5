use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;

use super::error::LibraryResult;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-lending-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "library.sqlite";

/// Ensure the database file exists, run lazy migrations, and return a live
/// connection. The function also toggles `PRAGMA foreign_keys = ON` so loan
/// rows can never point at books or cards that were dropped out from under
/// them, during tests and production runs alike.
pub fn ensure_schema() -> Result<Connection> {
    let db_path = db_path()?;
    open_at(&db_path)
}

/// Open (creating if necessary) a database at an explicit path. Embedders
/// that manage their own data directory use this instead of
/// [`ensure_schema`].
pub fn open_at(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;
    create_tables(&conn).context("failed to create schema")?;
    Ok(conn)
}

/// Open a throwaway in-memory database with the full schema applied. Every
/// test runs against one of these so fixtures never collide.
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;
    create_tables(&conn).context("failed to create schema")?;
    Ok(conn)
}

/// Create the three tables when they are missing. `card` and `book` must come
/// before `borrow`, which references both.
fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS card (
            card_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            department TEXT NOT NULL,
            type TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS book (
            book_id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            title TEXT NOT NULL,
            press TEXT NOT NULL,
            publish_year INTEGER NOT NULL,
            author TEXT NOT NULL,
            price REAL NOT NULL,
            stock INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS borrow (
            card_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            borrow_time INTEGER NOT NULL,
            return_time INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (card_id, book_id, borrow_time),
            FOREIGN KEY(card_id) REFERENCES card(card_id) ON DELETE CASCADE,
            FOREIGN KEY(book_id) REFERENCES book(book_id) ON DELETE CASCADE
        )",
        [],
    )?;

    Ok(())
}

/// Drop and recreate all three tables inside one transaction, leaving an
/// empty but fully usable schema. Meant for establishing clean test fixtures,
/// not for normal operation. `borrow` is dropped first and created last
/// because it references the other two tables.
pub fn reset_tables(conn: &mut Connection) -> LibraryResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        "DROP TABLE IF EXISTS borrow;
         DROP TABLE IF EXISTS book;
         DROP TABLE IF EXISTS card;",
    )?;
    create_tables(&tx)?;
    tx.commit()?;
    Ok(())
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn reset_wipes_rows_and_keeps_schema_usable() {
        let mut conn = open_memory().unwrap();
        conn.execute(
            "INSERT INTO card (name, department, type) VALUES (?1, ?2, ?3)",
            params!["Ann", "CS", "S"],
        )
        .unwrap();

        reset_tables(&mut conn).unwrap();

        let cards: i64 = conn
            .query_row("SELECT COUNT(*) FROM card", [], |row| row.get(0))
            .unwrap();
        assert_eq!(cards, 0);

        // Schema is still in place after the reset.
        conn.execute(
            "INSERT INTO card (name, department, type) VALUES (?1, ?2, ?3)",
            params!["Bob", "Math", "T"],
        )
        .unwrap();
    }
}
