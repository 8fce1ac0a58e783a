//! # Catalog Seeder
//!
//! Fills a development database with products so the cart API has
//! something to sell.
//!
//! ## Usage
//! ```bash
//! # 200 products into ./cartledger.db (default)
//! cargo run -p cartledger-db --bin seed
//!
//! # Custom amount and path
//! cargo run -p cartledger-db --bin seed -- --count 1000 --db ./data/cartledger.db
//!
//! # Also fill a sample cart for customer "demo"
//! cargo run -p cartledger-db --bin seed -- --demo-cart
//! ```
//!
//! Product ids are `{AISLE}-{NNNN}` so they are easy to type into requests.
//! Prices run $0.99 to $21.98; stock runs 0 to 50, so some products are
//! deliberately out of stock.

use std::env;
use std::time::Instant;

use cartledger_core::Product;
use cartledger_db::{Database, DbConfig, EngineConfig};

/// Aisles and the base names stocked in them.
const AISLES: &[(&str, &[&str])] = &[
    (
        "PAN",
        &[
            "Basmati Rice",
            "Rolled Oats",
            "Chickpeas",
            "Olive Oil",
            "Penne",
            "Lentils",
            "Honey",
            "Peanut Butter",
        ],
    ),
    (
        "BAK",
        &["Sourdough", "Bagels", "Croissant", "Rye Loaf", "Pita", "Muffin"],
    ),
    (
        "PRD",
        &["Apples", "Bananas", "Spinach", "Tomatoes", "Avocado", "Lemons", "Carrots"],
    ),
    (
        "HOM",
        &["Dish Soap", "Paper Towels", "Sponges", "Trash Bags", "Laundry Pods"],
    ),
];

/// Pack sizes with their price uplift in cents.
const PACKS: &[(&str, i64)] = &[("Single", 0), ("Family", 350), ("Bulk", 900)];

const DEFAULT_COUNT: usize = 200;
const DEFAULT_DB: &str = "./cartledger.db";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count = DEFAULT_COUNT;
    let mut db_path = String::from(DEFAULT_DB);
    let mut demo_cart = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    count = value.parse()?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--demo-cart" => demo_cart = true,
            "--help" | "-h" => {
                println!("Cartledger catalog seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products (default: {DEFAULT_COUNT})");
                println!("  -d, --db <PATH>    Database file path (default: {DEFAULT_DB})");
                println!("      --demo-cart    Add a few items to customer \"demo\"");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {other}");
            }
        }
        i += 1;
    }

    println!("Cartledger catalog seeder");
    println!("Database: {db_path}");
    println!("Products: {count}");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {existing} products, skipping.");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    let start = Instant::now();
    let mut inserted = 0;

    for product in catalog().take(count) {
        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {e}", product.id);
            continue;
        }
        inserted += 1;
    }

    println!("Inserted {inserted} products in {:?}", start.elapsed());

    if demo_cart {
        let engine = db.engine(EngineConfig::default());
        let in_stock: Vec<Product> = db
            .products()
            .list(50)
            .await?
            .into_iter()
            .filter(|p| p.stock_quantity > 0)
            .take(3)
            .collect();

        for product in &in_stock {
            engine.add_item("demo", &product.id, 1).await?;
        }

        let cart = engine.get_cart("demo").await?;
        println!(
            "Demo cart: {} items, total {}",
            cart.item_count,
            cart.total()
        );
    }

    db.close().await;
    Ok(())
}

/// Endless, deterministic product stream; the caller decides how many.
fn catalog() -> impl Iterator<Item = Product> {
    let base: Vec<(&'static str, &'static str, &'static str, i64)> = AISLES
        .iter()
        .flat_map(|(aisle, names)| {
            names.iter().flat_map(move |name| {
                PACKS
                    .iter()
                    .map(move |(pack, uplift)| (*aisle, *name, *pack, *uplift))
            })
        })
        .collect();

    (0..).map(move |seq: usize| {
        let (aisle, name, pack, uplift) = base[seq % base.len()];
        let batch = seq / base.len();

        let display = if batch == 0 {
            format!("{name} ({pack})")
        } else {
            format!("{name} ({pack}) #{}", batch + 1)
        };

        let price_cents = 99 + ((seq * 37) % 1200) as i64 + uplift;
        let stock = (seq * 7 % 51) as i64;

        Product::new(format!("{aisle}-{seq:04}"), display, price_cents, stock)
    })
}
