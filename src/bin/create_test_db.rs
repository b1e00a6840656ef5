use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, macros::date};

use kakeibo_rs::{
    Category, Transaction, TransactionBuilder, TransactionKind, UserId, create_sub_category,
    create_transaction, get_category_by_name, initialize_db,
};

/// A utility for creating a test database for kakeibo_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The ID of the test user that owns the sample data.
    #[arg(long, short, default_value = "test-user")]
    user_id: String,
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

    let user_id = UserId::new(&args.user_id)?;
    println!("Creating sample data for {user_id}...");

    let salary = get_category_by_name("給与", TransactionKind::Income, &conn)?;
    let side_job = get_category_by_name("副業", TransactionKind::Income, &conn)?;
    let housing = get_category_by_name("住居費", TransactionKind::Expense, &conn)?;
    let food = get_category_by_name("食費", TransactionKind::Expense, &conn)?;

    let rent = create_sub_category(&user_id, &housing.id, "家賃", &conn)?;
    let groceries = create_sub_category(&user_id, &food.id, "食料品", &conn)?;
    let eating_out = create_sub_category(&user_id, &food.id, "外食", &conn)?;

    // January 2025: 330,000 income and 85,000 of expenses.
    let january = [
        sample(&salary, "給料", 280_000, date!(2025 - 01 - 01)),
        sample(&side_job, "副業", 50_000, date!(2025 - 01 - 10)),
        sample(&housing, "家賃", 85_000, date!(2025 - 01 - 15))
            .sub_category_id(Some(&rent.id)),
    ];

    // A few earlier months so the trend has some shape.
    let history = [
        sample(&salary, "給料", 270_000, date!(2024 - 11 - 25)),
        sample(&housing, "家賃", 85_000, date!(2024 - 11 - 27))
            .sub_category_id(Some(&rent.id)),
        sample(&food, "スーパー", 20_000, date!(2024 - 12 - 03))
            .sub_category_id(Some(&groceries.id)),
        sample(&food, "忘年会", 15_000, date!(2024 - 12 - 20))
            .sub_category_id(Some(&eating_out.id)),
        sample(&salary, "給料", 275_000, date!(2024 - 12 - 25)),
    ];

    for builder in january.into_iter().chain(history) {
        create_transaction(builder, &user_id, &conn)?;
    }

    println!("Success!");

    Ok(())
}

/// A sample record in `category`, expenses are marked as paid.
fn sample(category: &Category, title: &str, amount: i64, date: Date) -> TransactionBuilder {
    Transaction::build(category.kind, amount, date, &category.id)
        .title(title)
        .paid(category.kind == TransactionKind::Expense)
}
