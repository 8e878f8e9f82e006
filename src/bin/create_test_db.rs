use std::{collections::HashMap, error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use budgello::{
    Amount,
    auth::PasswordHash,
    budget::{Frequency, NewBudget, create_budget},
    category::{CategoryId, CategoryName, create_category},
    initialize_db,
    transaction::{Transaction, create_transaction},
    user::{Role, UserID, Username, create_user},
};

/// A utility for creating a test database for the REST API server of budgello.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
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

    println!("Creating test users...");
    let alice = create_test_user("alice", "password123", Role::Admin, &conn)?;
    let bob = create_test_user("bob", "password456", Role::User, &conn)?;

    println!("Creating categories...");
    let alice_categories = create_categories(
        alice,
        &["Groceries", "Transport", "Entertainment", "Utilities", "Rent"],
        &conn,
    )?;
    let bob_categories = create_categories(
        bob,
        &["Groceries", "Bus Pass", "Concerts", "Health", "Food"],
        &conn,
    )?;

    println!("Creating transactions...");
    let transactions = [
        (alice, "Weekly grocery run", 12550, 5, alice_categories["Groceries"]),
        (alice, "Gas for car", 4500, 4, alice_categories["Transport"]),
        (alice, "Movie tickets", 3200, 3, alice_categories["Entertainment"]),
        (alice, "Electricity bill", 8575, 2, alice_categories["Utilities"]),
        (alice, "Monthly rent", 120000, 1, alice_categories["Rent"]),
        (bob, "Supermarket", 7890, 6, bob_categories["Groceries"]),
        (bob, "Monthly bus pass", 5500, 5, bob_categories["Bus Pass"]),
        (bob, "Rock concert", 15000, 2, bob_categories["Concerts"]),
        (bob, "Pharmacy", 2530, 1, bob_categories["Health"]),
    ];
    let now = OffsetDateTime::now_utc();

    for (user_id, description, cents, days_ago, category_id) in transactions {
        create_transaction(
            user_id,
            Transaction::build(Amount::new(Decimal::new(cents, 2))?, description)
                .date(Some(now - Duration::days(days_ago)))
                .category_id(Some(category_id)),
            &conn,
        )?;
    }

    println!("Creating budgets...");
    let budgets = [
        (alice, Frequency::Monthly, 2500),
        (alice, Frequency::Yearly, 30000),
        (bob, Frequency::Monthly, 2200),
    ];

    for (user_id, frequency, dollars) in budgets {
        create_budget(
            user_id,
            NewBudget {
                frequency,
                amount: Amount::new(Decimal::from(dollars))?,
                period: now.date(),
            },
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}

fn create_test_user(
    username: &str,
    password: &str,
    role: Role,
    conn: &Connection,
) -> Result<UserID, budgello::Error> {
    let password_hash = PasswordHash::from_raw_password(password, PasswordHash::DEFAULT_COST)?;

    create_user(Username::new(username)?, password_hash, role, conn).map(|user| user.id)
}

fn create_categories(
    user_id: UserID,
    names: &[&str],
    conn: &Connection,
) -> Result<HashMap<String, CategoryId>, budgello::Error> {
    names
        .iter()
        .map(|name| {
            create_category(user_id, CategoryName::new(name)?, conn)
                .map(|category| (category.name.to_string(), category.id))
        })
        .collect()
}
