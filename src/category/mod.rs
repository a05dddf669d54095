//! Categories that transactions are grouped under.
//!
//! Categories are read-only in the web app: they are seeded into the database
//! and looked up to fill in selection inputs and label transactions.

mod db;
mod domain;
mod list;

pub use db::{
    count_transactions_per_category, create_category, create_category_table, get_all_categories,
    get_category,
};
pub use domain::{Category, CategoryId, CategoryName};
pub use list::{get_categories_json, get_categories_page, get_currencies_json};
