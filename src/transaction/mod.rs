//! Transaction management for the budget tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its table and the `TransactionStore` interface
//! - Validation of submitted transactions and the create, update and delete
//!   operations built on it
//! - Searching and paging through transactions
//! - The pages and endpoints for listing, adding, editing and deleting
//!   transactions

mod core;
mod create_endpoint;
mod delete;
mod edit;
mod form;
mod notice;
mod query;
mod service;
mod store;
mod transactions_page;
mod validation;
mod view;

pub use core::{Transaction, create_transaction_table};
pub use create_endpoint::create_transaction_endpoint;
pub use delete::{delete_transaction_endpoint, get_delete_transaction_page};
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use query::{TransactionFilter, TransactionPage, list_transactions};
pub use service::{
    DeleteOutcome, UpdateOutcome, create_transaction, delete_transaction, get_transaction,
    update_transaction,
};
pub use store::{NewTransaction, SQLiteTransactionStore, TransactionChanges, TransactionStore};
pub use transactions_page::{get_search_page, get_transactions_page};
pub use validation::{Field, FieldError, TransactionInput, ValidationErrors};
