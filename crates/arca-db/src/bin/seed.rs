//! # Seed Data Generator
//!
//! Populates the database with stocked products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p arca-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p arca-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p arca-db --bin seed -- --db ./data/arca.db
//! ```
//!
//! Each product gets a unique code `{CATEGORY}-{NNN}`, a price derived
//! from the seed index and a stock level between 0 and 100.

use chrono::Utc;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arca_core::Product;
use arca_db::repository::product::generate_product_id;
use arca_db::{Database, DbConfig};

/// Product categories for realistic test data.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEV",
        &[
            "Coffee Beans", "Ground Coffee", "Black Tea", "Green Tea", "Sparkling Water",
            "Still Water", "Orange Juice", "Apple Juice", "Lemonade", "Cola",
        ],
    ),
    (
        "SNK",
        &[
            "Potato Chips", "Tortilla Chips", "Salted Peanuts", "Trail Mix", "Granola Bar",
            "Chocolate Bar", "Gummy Bears", "Crackers", "Pretzels", "Cookies",
        ],
    ),
    (
        "GRO",
        &[
            "White Rice", "Brown Rice", "Spaghetti", "Penne", "Canned Beans",
            "Canned Corn", "Olive Oil", "Flour", "Sugar", "Salt",
        ],
    ),
];

/// Size variants for products.
const SIZES: &[(&str, i64)] = &[
    ("250g", 0),
    ("500g", 150),
    ("1kg", 400),
    ("Small", 0),
    ("Large", 250),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./arca_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Arca POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./arca_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, count, "Seeding development data");

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        info!(existing, "Database already has products; skipping seed");
        return Ok(());
    }

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_code, products) in CATEGORIES {
        for (product_idx, product_name) in products.iter().enumerate() {
            for (size_idx, (size_name, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = generated + product_idx * 10 + size_idx;
                let product =
                    generate_product(category_code, product_name, size_name, *price_addon, seed);

                db.products().insert(&product).await?;
                generated += 1;
            }
        }
    }

    info!(
        generated,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    Ok(())
}

/// Generates a single product with deterministic pseudo-random data.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    let code = format!("{}-{:03}", category, seed);

    // Base price $1.99 - $9.99 plus the size addon
    let base_price = 199 + ((seed * 17) % 800) as i64;
    let price_cents = base_price + price_addon;

    // Cost at 60-80% of price
    let cost_pct = 60 + (seed % 20) as i64;
    let cost_cents = Some(price_cents * cost_pct / 100);

    Product {
        id: generate_product_id(),
        code,
        name: format!("{} {}", name, size),
        price_cents,
        cost_cents,
        stock: (seed % 101) as i64,
        created_at: now,
        updated_at: now,
    }
}
