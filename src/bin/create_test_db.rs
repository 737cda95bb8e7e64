use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::str::FromStr;

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use time::{Date, OffsetDateTime};

use moneyflow::{
    PasswordHash, Transaction, ValidatedPassword, create_credentialed_user, create_transaction,
    ensure_default_categories, get_categories, initialize_db,
};

/// A utility for creating a test database for the MoneyFlow server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Sample expenses as (day of month, category index, amount, item, store).
const SAMPLE_EXPENSES: [(u8, usize, i64, &str, &str); 8] = [
    (1, 0, 1280, "スーパーの買い物", "まいばすけっと"),
    (2, 1, 3200, "電車の定期", "JR"),
    (3, 0, 880, "ランチ", "定食屋"),
    (5, 2, 4500, "シャンプー", "ドラッグストア"),
    (6, 3, 2400, "映画", "シネマ"),
    (8, 0, 6400, "週末のまとめ買い", "イオン"),
    (10, 4, 1650, "本", "書店"),
    (12, 0, 560, "コーヒー", "カフェ"),
];

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

    println!("Creating test user demo@example.com with the password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_credentialed_user(
        EmailAddress::from_str("demo@example.com")?,
        password_hash,
        &conn,
    )?;

    println!("Creating default categories...");
    ensure_default_categories(user.id, &conn)?;
    let categories = get_categories(user.id, &conn)?;

    println!("Creating sample transactions...");
    let today = OffsetDateTime::now_utc().date();

    for (day, category_index, amount, item_name, store) in SAMPLE_EXPENSES {
        let Some(category) = categories.get(category_index).or(categories.first()) else {
            continue;
        };
        let date = Date::from_calendar_date(today.year(), today.month(), day)?.min(today);

        create_transaction(
            Transaction::build(user.id, amount, category.id, date)
                .item_name(item_name)
                .store(Some(store)),
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
