//! Persistence for transactions.

use rusqlite::{Connection, params_from_iter, types::Value};
use time::PrimitiveDateTime;

use crate::{Error, category::CategoryId, database_id::TransactionId};

use super::{
    core::{TRANSACTION_COLUMNS, Transaction, map_transaction_row},
    query::TransactionFilter,
};

/// A validated transaction that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// How much money changed hands, greater than zero.
    pub amount: f64,
    /// When the transaction happened, in local time.
    pub date: PrimitiveDateTime,
    /// The currency code of `amount`.
    pub currency: String,
    /// What the transaction was for.
    pub description: String,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
}

/// The fields an update replaces. The category of a saved transaction is
/// kept as is.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionChanges {
    /// The new amount, greater than zero.
    pub amount: f64,
    /// The new date.
    pub date: PrimitiveDateTime,
    /// The new currency code.
    pub currency: String,
    /// The new description.
    pub description: String,
}

impl From<NewTransaction> for TransactionChanges {
    fn from(transaction: NewTransaction) -> Self {
        Self {
            amount: transaction.amount,
            date: transaction.date,
            currency: transaction.currency,
            description: transaction.description,
        }
    }
}

/// Handles the creation, retrieval and search of transactions.
pub trait TransactionStore {
    /// Save a new transaction and return it with its generated ID.
    ///
    /// # Errors
    /// Returns [Error::InvalidCategory] if the category does not exist.
    fn insert(&self, transaction: NewTransaction) -> Result<Transaction, Error>;

    /// # Errors
    /// Returns [Error::NotFound] if there is no transaction with `id`.
    fn get(&self, id: TransactionId) -> Result<Transaction, Error>;

    /// Replace the amount, date, currency and description of a transaction.
    ///
    /// # Errors
    /// Returns [Error::UpdateMissingTransaction] if there is no transaction
    /// with `id`.
    fn update(&self, id: TransactionId, changes: &TransactionChanges)
    -> Result<Transaction, Error>;

    /// Delete a transaction, returning whether anything was deleted.
    fn delete(&self, id: TransactionId) -> Result<bool, Error>;

    /// Get up to `limit` transactions matching `filter`, skipping the first
    /// `offset`, newest first with ties broken by ascending ID.
    fn query(
        &self,
        filter: &TransactionFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Transaction>, Error>;

    /// Count the transactions matching `filter`.
    fn count(&self, filter: &TransactionFilter) -> Result<u64, Error>;

    /// Whether there is a category with `category_id`.
    fn category_exists(&self, category_id: CategoryId) -> Result<bool, Error>;

    /// Run `f` so that either all of its writes are kept or none are.
    ///
    /// The writes are kept only if `f` returns `Ok`.
    fn in_transaction<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Self) -> Result<T, Error>;
}

/// Stores transactions in a SQLite database.
#[derive(Debug, Clone, Copy)]
pub struct SQLiteTransactionStore<'a> {
    connection: &'a Connection,
}

impl<'a> SQLiteTransactionStore<'a> {
    /// Create a store that reads and writes through `connection`.
    ///
    /// The tables must already exist, see [crate::initialize_db].
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore<'_> {
    fn insert(&self, transaction: NewTransaction) -> Result<Transaction, Error> {
        self.connection
            .prepare(&format!(
                "INSERT INTO \"transaction\" (amount, date, currency, description, category_id) \
                VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    transaction.amount,
                    transaction.date,
                    &transaction.currency,
                    &transaction.description,
                    transaction.category_id,
                ),
                map_transaction_row,
            )
            .map_err(Error::from)
    }

    fn get(&self, id: TransactionId) -> Result<Transaction, Error> {
        self.connection
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
            ))?
            .query_row(&[(":id", &id)], map_transaction_row)
            .map_err(Error::from)
    }

    fn update(
        &self,
        id: TransactionId,
        changes: &TransactionChanges,
    ) -> Result<Transaction, Error> {
        self.connection
            .prepare(&format!(
                "UPDATE \"transaction\" \
                SET amount = ?1, date = ?2, currency = ?3, description = ?4 \
                WHERE id = ?5 RETURNING {TRANSACTION_COLUMNS}"
            ))?
            .query_row(
                (
                    changes.amount,
                    changes.date,
                    &changes.currency,
                    &changes.description,
                    id,
                ),
                map_transaction_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
                error => error.into(),
            })
    }

    fn delete(&self, id: TransactionId) -> Result<bool, Error> {
        let rows_affected = self
            .connection
            .execute("DELETE FROM \"transaction\" WHERE id = ?1", (id,))?;

        Ok(rows_affected > 0)
    }

    fn query(
        &self,
        filter: &TransactionFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Transaction>, Error> {
        let (where_clause, mut params) = filter_clause(filter);
        params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        params.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

        self.connection
            .prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"{where_clause} \
                ORDER BY date DESC, id ASC LIMIT ? OFFSET ?"
            ))?
            .query_map(params_from_iter(params), map_transaction_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    fn count(&self, filter: &TransactionFilter) -> Result<u64, Error> {
        let (where_clause, params) = filter_clause(filter);

        let count: i64 = self
            .connection
            .prepare(&format!(
                "SELECT COUNT(1) FROM \"transaction\"{where_clause}"
            ))?
            .query_row(params_from_iter(params), |row| row.get(0))?;

        Ok(count.max(0) as u64)
    }

    fn category_exists(&self, category_id: CategoryId) -> Result<bool, Error> {
        self.connection
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM category WHERE id = ?1)",
                (category_id,),
                |row| row.get(0),
            )
            .map_err(Error::from)
    }

    fn in_transaction<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&Self) -> Result<T, Error>,
    {
        // Dropping the transaction without committing rolls it back.
        let transaction = self.connection.unchecked_transaction()?;
        let result = f(self)?;
        transaction.commit()?;

        Ok(result)
    }
}

/// Build the `WHERE` clause for `filter` and the values for its placeholders.
///
/// The clause is empty when the filter is empty, otherwise it starts with a
/// space.
fn filter_clause(filter: &TransactionFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if let Some(text) = &filter.text {
        conditions.push("description LIKE '%' || ? || '%' ESCAPE '\\'");
        params.push(Value::Text(escape_like(text)));
    }

    if let Some(category_id) = filter.category_id {
        conditions.push("category_id = ?");
        params.push(Value::Integer(category_id));
    }

    if let Some(date) = filter.date {
        // Dates are stored as text starting with "YYYY-MM-DD".
        conditions.push("substr(date, 1, 10) = ?");
        params.push(Value::Text(date.to_string()));
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), params)
    }
}

/// Escape the LIKE wildcards in `text` so that it matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for character in text.chars() {
        if matches!(character, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(character);
    }

    escaped
}
