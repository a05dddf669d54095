//! Defines the transaction model and its table.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{category::CategoryId, database_id::TransactionId};

/// A single financial record, e.g. a purchase at the supermarket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// How much money changed hands. Always greater than zero.
    pub amount: f64,
    /// When the transaction happened, in local wall-clock time.
    pub date: PrimitiveDateTime,
    /// The code of the currency `amount` is in, e.g. "USD".
    pub currency: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
}

/// The columns selected by every transaction query, in the order
/// [map_transaction_row] expects.
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, amount, date, currency, description, category_id";

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL CHECK (amount > 0),
                date TEXT NOT NULL,
                currency TEXT NOT NULL DEFAULT 'USD',
                description TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Used by the list page's ordering and the category filter.
    connection.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        date: row.get(2)?,
        currency: row.get(3)?,
        description: row.get(4)?,
        category_id: row.get(5)?,
    })
}
