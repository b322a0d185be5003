//! # Seed Data Generator
//!
//! Populates the database with products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p inventory-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p inventory-db --bin seed -- --count 1000
//!
//! # Specify database path (otherwise INVENTORY_DB_PATH or ./inventory.db)
//! cargo run -p inventory-db --bin seed -- --db ./data/inventory.db
//! ```
//!
//! After seeding, every product in the first category is restocked with a
//! single batch update.

use std::collections::BTreeMap;
use std::env;
use std::error::Error;
use std::num::ParseIntError;
use std::path::PathBuf;

use inventory_db::{Database, DbConfig, InventoryUpdates, Product};
use tracing_subscriber::EnvFilter;

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "tools",
        &["Hammer", "Screwdriver", "Wrench", "Pliers", "Tape Measure", "Level"],
    ),
    (
        "electronics",
        &["Cable", "Charger", "Adapter", "Battery Pack", "Headphones"],
    ),
    (
        "garden",
        &["Trowel", "Hose", "Rake", "Seed Packet", "Planter"],
    ),
    (
        "office",
        &["Stapler", "Notebook", "Pen Set", "Desk Lamp", "Binder"],
    ),
];

/// Size variants for products, with price multipliers in percent
const SIZES: &[(&str, i64)] = &[("Small", 100), ("Medium", 140), ("Large", 190)];

/// Quantity every product of the first category is restocked to.
const RESTOCK_LEVEL: i64 = 50;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let seed_args = parse_args(&args)?;

    if seed_args.help {
        print_help();
        return Ok(());
    }

    let count = seed_args.count;
    let mut config = DbConfig::from_env()?;
    if let Some(path) = seed_args.db_path {
        config.database_path = path;
    }

    println!("Inventory Seed Data Generator");
    println!("=============================");
    println!("Database: {}", config.database_path.display());
    println!("Products: {}", count);
    println!();

    let db = Database::new(config).await?;
    let store = db.products();

    println!("✓ Connected to database");

    let existing = store.count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (category, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size, multiplier) in SIZES {
                if generated >= count {
                    break 'outer;
                }

                let seed = category_idx * 100 + name_idx * 10 + generated;
                let mut product = generate_product(category, name, size, *multiplier, seed);

                if let Err(e) = store.create_product(&mut product).await {
                    eprintln!("Failed to insert {}: {}", product.name, error_chain(&e));
                    continue;
                }

                generated += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let mut per_category: BTreeMap<String, usize> = BTreeMap::new();
    for product in store.list_products("").await? {
        *per_category.entry(product.category).or_default() += 1;
    }

    println!();
    for (category, n) in &per_category {
        println!("  {:<12} {:>5} products", category, n);
    }

    let (restock_category, _) = CATEGORIES[0];
    let updates: InventoryUpdates = store
        .list_products(restock_category)
        .await?
        .into_iter()
        .map(|p| (p.id, RESTOCK_LEVEL))
        .collect();

    println!();
    match store.batch_update_inventory(&updates).await {
        Ok(()) => println!(
            "✓ Restocked {} '{}' products to {}",
            updates.len(),
            restock_category,
            RESTOCK_LEVEL
        ),
        Err(e) => {
            eprintln!("✗ Restock failed: {}", error_chain(&e));
            if e.is_state_unknown() {
                eprintln!("  Transaction outcome unknown; verify stock levels before retrying.");
            }
            return Err(e.into());
        }
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Parsed command line options.
#[derive(Debug, PartialEq)]
struct SeedArgs {
    count: usize,
    db_path: Option<PathBuf>,
    help: bool,
}

/// Parses `args` (including the program name). A bad `--count` is an error.
fn parse_args(args: &[String]) -> Result<SeedArgs, ParseIntError> {
    let mut parsed = SeedArgs {
        count: 200,
        db_path: None,
        help: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    parsed.count = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    parsed.db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => parsed.help = true,
            _ => {}
        }
        i += 1;
    }

    Ok(parsed)
}

fn print_help() {
    println!("Inventory Seed Data Generator");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --count <N>    Number of products to generate (default: 200)");
    println!("  -d, --db <PATH>    Database file path (default: $INVENTORY_DB_PATH or ./inventory.db)");
    println!("  -h, --help         Show this help message");
}

/// Generates a single product with deterministic data.
fn generate_product(category: &str, name: &str, size: &str, multiplier: i64, seed: usize) -> Product {
    // Base price $1.99 - $9.98, scaled by size
    let base_cents = 199 + ((seed * 17) % 800) as i64;
    let price = (base_cents * multiplier / 100) as f64 / 100.0;

    let quantity = (seed % 101) as i64;

    Product::new(format!("{} {}", name, size), price, quantity, category)
}

/// Renders an error with its `source()` chain on one line.
fn error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}
