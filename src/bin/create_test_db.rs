use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, macros::datetime};

use budget_tracker::{
    CategoryName, NewTransaction, SQLiteTransactionStore, TransactionStore, create_category,
    initialize_db,
};

const CATEGORY_NAMES: [&str; 5] = ["Food", "Rent", "Salary", "Transport", "Utilities"];

const DESCRIPTIONS: [&str; 6] = [
    "Weekly groceries",
    "Monthly rent",
    "Paycheck deposit",
    "Bus pass top up",
    "Electricity bill",
    "Coffee with friends",
];

const CURRENCIES: [&str; 3] = ["USD", "EUR", "GBP"];

/// A utility for creating a test database for the budget tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The number of sample transactions to add.
    #[arg(long, short, default_value_t = 0)]
    transactions: u32,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating categories...");

    let mut categories = Vec::with_capacity(CATEGORY_NAMES.len());
    for name in CATEGORY_NAMES {
        categories.push(create_category(CategoryName::new(name)?, &conn)?);
    }

    if args.transactions > 0 {
        println!("Creating {} transactions...", args.transactions);

        let store = SQLiteTransactionStore::new(&conn);
        let start = datetime!(2025-01-01 9:00);

        for i in 0..args.transactions as usize {
            let category = &categories[i % categories.len()];

            store.insert(NewTransaction {
                amount: 5.0 + (i % 40) as f64 * 2.5,
                date: start + Duration::hours(7 * i as i64),
                currency: CURRENCIES[i % CURRENCIES.len()].to_owned(),
                description: DESCRIPTIONS[i % DESCRIPTIONS.len()].to_owned(),
                category_id: category.id,
            })?;
        }
    }

    println!("Success!");

    Ok(())
}
