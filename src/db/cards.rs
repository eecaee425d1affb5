//! Membership card operations. The `models` module stays free of any
//! rusqlite types, so the SQL conversions for [`CardKind`] live here next to
//! the queries that need them.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ToSql};

use super::borrows::card_has_open_loan;
use super::error::{LibraryError, LibraryResult};
use crate::models::{Card, CardKind};

impl ToSql for CardKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for CardKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;
        CardKind::from_code(code)
            .ok_or_else(|| FromSqlError::Other(format!("unknown card type code {code:?}").into()))
    }
}

/// Register a membership card. Fails when a card with the same name,
/// department and kind already exists; on success the generated id is
/// written back onto the record.
pub fn register_card(conn: &mut Connection, card: &mut Card) -> LibraryResult<()> {
    let tx = conn.transaction()?;

    let duplicate = {
        let mut stmt = tx.prepare(
            "SELECT 1 FROM card WHERE name = ?1 AND department = ?2 AND type = ?3",
        )?;
        stmt.exists(params![card.name, card.department, card.kind])?
    };
    if duplicate {
        return Err(LibraryError::DuplicateCard);
    }

    tx.execute(
        "INSERT INTO card (name, department, type) VALUES (?1, ?2, ?3)",
        params![card.name, card.department, card.kind],
    )?;
    card.id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(())
}

/// Delete a membership card. Refused while the card still holds any
/// unreturned book; cards with only closed loans delete fine.
pub fn remove_card(conn: &mut Connection, card_id: i64) -> LibraryResult<()> {
    let tx = conn.transaction()?;
    if card_has_open_loan(&tx, card_id)? {
        return Err(LibraryError::CardOnLoan(card_id));
    }
    let deleted = tx.execute("DELETE FROM card WHERE card_id = ?1", params![card_id])?;
    if deleted == 0 {
        return Err(LibraryError::CardNotFound(card_id));
    }
    tx.commit()?;
    Ok(())
}

/// All registered cards in id order.
pub fn list_cards(conn: &Connection) -> LibraryResult<Vec<Card>> {
    let mut stmt = conn.prepare("SELECT card_id, name, department, type FROM card")?;
    let cards = stmt
        .query_map([], |row| {
            Ok(Card {
                id: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                kind: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cards)
}
