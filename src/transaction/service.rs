//! The create, update, delete and lookup operations behind the transaction
//! endpoints.

use time::PrimitiveDateTime;

use crate::{Error, currency::CurrencyConfig, database_id::TransactionId};

use super::{
    core::Transaction,
    store::{TransactionChanges, TransactionStore},
    validation::{TransactionInput, ValidationErrors},
};

/// The result of a valid update request.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The transaction as saved after the update.
    Updated(Transaction),
    /// The input broke the transaction rules. Nothing was changed.
    Rejected {
        /// The transaction as it was before the attempted update.
        original: Transaction,
        /// Every rule the input broke.
        errors: ValidationErrors,
    },
}

/// The result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The transaction with this ID was deleted.
    Deleted(TransactionId),
    /// There was nothing to delete.
    NoOp,
}

/// Validate `input` and save it as a new transaction.
///
/// A missing date defaults to `now`. The lookup and insert run in their own
/// store transaction, so callers must not already be inside one.
///
/// # Errors
/// Returns [Error::InvalidTransaction] if the input breaks any rule.
pub fn create_transaction(
    store: &impl TransactionStore,
    input: &TransactionInput,
    currencies: &CurrencyConfig,
    now: PrimitiveDateTime,
) -> Result<Transaction, Error> {
    store.in_transaction(|store| {
        let transaction = input.validate(currencies, now, store)?;

        store.insert(transaction)
    })
}

/// Replace the amount, date, currency and description of transaction `id`.
///
/// A missing date keeps the transaction's current date. The transaction's
/// category never changes, but the submitted category must still be valid.
/// The read and write run in their own store transaction, so callers must not
/// already be inside one.
///
/// # Errors
/// Returns [Error::UpdateMissingTransaction] if there is no transaction with
/// `id`.
pub fn update_transaction(
    store: &impl TransactionStore,
    id: TransactionId,
    input: &TransactionInput,
    currencies: &CurrencyConfig,
) -> Result<UpdateOutcome, Error> {
    store.in_transaction(|store| {
        let original = store.get(id).map_err(|error| match error {
            Error::NotFound => Error::UpdateMissingTransaction,
            error => error,
        })?;

        let changes = match input.validate(currencies, original.date, store) {
            Ok(transaction) => TransactionChanges::from(transaction),
            Err(Error::InvalidTransaction(errors)) => {
                return Ok(UpdateOutcome::Rejected { original, errors });
            }
            Err(error) => return Err(error),
        };

        store.update(id, &changes).map(UpdateOutcome::Updated)
    })
}

/// Delete transaction `id` if it exists.
pub fn delete_transaction(
    store: &impl TransactionStore,
    id: TransactionId,
) -> Result<DeleteOutcome, Error> {
    if store.delete(id)? {
        Ok(DeleteOutcome::Deleted(id))
    } else {
        Ok(DeleteOutcome::NoOp)
    }
}

/// Look up a single transaction.
///
/// # Errors
/// Returns [Error::NotFound] if there is no transaction with `id`.
pub fn get_transaction(
    store: &impl TransactionStore,
    id: TransactionId,
) -> Result<Transaction, Error> {
    store.get(id)
}
