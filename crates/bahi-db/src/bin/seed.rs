//! # Seed Data Generator
//!
//! Stocks an owner's inventory with everyday kirana items for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default owner in ./bahi_dev.db
//! cargo run -p bahi-db --bin seed
//!
//! # Specify owner and database path
//! cargo run -p bahi-db --bin seed -- --owner shop-42 --db ./data/bahi.db
//! ```
//!
//! Items that already exist for the owner are skipped, so the seed can be
//! re-run safely.

use std::path::PathBuf;

use bahi_core::{CoreError, Money, NewInventoryItem, OwnerId};
use bahi_db::{Database, DbConfig, DbError};
use clap::Parser;

/// (category, name, stock, cost in paise)
const ITEMS: &[(&str, &str, i64, i64)] = &[
    ("Beverages", "Pepsi", 48, 2000),
    ("Beverages", "Coca-Cola", 48, 2000),
    ("Beverages", "Frooti", 36, 1000),
    ("Beverages", "Bisleri 1L", 60, 1500),
    ("Snacks", "Lays Classic", 40, 1800),
    ("Snacks", "Kurkure", 40, 1800),
    ("Snacks", "Parle-G", 100, 450),
    ("Snacks", "Good Day", 60, 900),
    ("Staples", "Aashirvaad Atta 5kg", 12, 24500),
    ("Staples", "Basmati Rice 1kg", 25, 9500),
    ("Staples", "Toor Dal 1kg", 20, 14000),
    ("Staples", "Sugar 1kg", 30, 4200),
    ("Staples", "Tata Salt", 40, 2200),
    ("Dairy", "Amul Butter 100g", 20, 5200),
    ("Dairy", "Amul Milk 500ml", 30, 2700),
    ("Personal Care", "Lux Soap", 36, 3200),
    ("Personal Care", "Colgate 100g", 24, 5000),
    ("Household", "Surf Excel 1kg", 15, 11500),
];

/// Stock an owner's shelf with common kirana items
#[derive(Parser, Debug)]
#[command(name = "seed")]
struct Args {
    /// Owner whose inventory is filled
    #[arg(long, short = 'o', default_value = "default-owner")]
    owner: String,

    /// Ledger file, created if missing
    #[arg(long, short = 'd', default_value = "./bahi_dev.db")]
    db: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let db = Database::new(DbConfig::new(args.db.clone())).await?;
    println!("Seeding {} for owner {}", args.db.display(), args.owner);

    let owner = OwnerId::new(args.owner);
    let mut created = 0;
    let mut skipped = 0;

    for (category, name, stock, cost) in ITEMS {
        let item = NewInventoryItem {
            item_name: name.to_string(),
            quantity: *stock,
            price_per_unit: Money::from_paise(*cost),
            category: category.to_string(),
        };

        match db.inventory().create(&owner, &item).await {
            Ok(_) => created += 1,
            Err(DbError::Domain(CoreError::DuplicateItem(_))) => skipped += 1,
            Err(e) => eprintln!("skipping {}: {}", name, e),
        }
    }

    println!(
        "{} added, {} already on the shelf, {} items total",
        created,
        skipped,
        db.inventory().count(&owner).await?
    );

    db.close().await;
    Ok(())
}
