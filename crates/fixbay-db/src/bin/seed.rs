//! # Seed Data Generator
//!
//! Populates the database with demo repair-shop inventory for development.
//!
//! ## Usage
//! ```bash
//! # Default: 40 products, ./fixbay_dev.db
//! cargo run -p fixbay-db --bin seed
//!
//! cargo run -p fixbay-db --bin seed -- --count 200 --db ./data/fixbay.db
//! ```
//!
//! ## Generated Data
//! - Products across parts, batteries, accessories and tools, alternating
//!   FIFO and weighted-average costing
//! - Stock levels at two branches, received 0-150 days ago so every aging
//!   bucket is populated
//! - Cost layers (and some consumptions) for FIFO products
//! - Invoices over the last 90 days; roughly one in five is not completed

use chrono::{Duration, NaiveDate, Utc};
use std::env;
use fixbay_core::{CostingMethod, InvoiceStatus, Product, StockLevel};
use fixbay_db::repository::invoice::generate_invoice_id;
use fixbay_db::repository::product::generate_product_id;
use fixbay_db::{Database, DbConfig, InvoiceItemRecord, InvoiceRecord};
use uuid::Uuid;

/// (category, SKU prefix, names)
const CATALOG: &[(&str, &str, &[&str])] = &[
    (
        "Parts",
        "LCD",
        &[
            "iPhone 12 Screen",
            "iPhone 13 Screen",
            "iPhone 14 Screen",
            "Galaxy S21 Screen",
            "Galaxy S22 Screen",
            "Pixel 7 Screen",
            "iPad 9 Digitizer",
            "Charging Port Flex",
            "Rear Camera Module",
            "Earpiece Speaker",
        ],
    ),
    (
        "Batteries",
        "BAT",
        &[
            "iPhone 11 Battery",
            "iPhone 12 Battery",
            "iPhone 13 Battery",
            "Galaxy S20 Battery",
            "Galaxy S21 Battery",
            "Pixel 6 Battery",
            "MacBook Air Battery",
            "iPad Air Battery",
        ],
    ),
    (
        "Accessories",
        "ACC",
        &[
            "USB-C Cable 1m",
            "Lightning Cable 1m",
            "20W Charger",
            "Tempered Glass",
            "Silicone Case",
            "Wireless Charger",
            "Car Mount",
            "Power Bank 10000mAh",
        ],
    ),
    (
        "Tools",
        "TLS",
        &[
            "Pentalobe Screwdriver",
            "Spudger Set",
            "Suction Cup",
            "Heat Mat",
            "B7000 Adhesive",
            "Anti-Static Wrist Strap",
        ],
    ),
];

const BRANCHES: &[&str] = &["main", "north"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./fixbay_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
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
                println!("Fixbay Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./fixbay_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Fixbay Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let start = std::time::Instant::now();

    // -------------------------------------------------------------------------
    // Products and stock
    // -------------------------------------------------------------------------
    println!();
    println!("Generating products and stock...");

    let mut products: Vec<Product> = Vec::new();
    let mut layer_count = 0;

    'catalog: for (category, prefix, names) in CATALOG {
        for name in names.iter() {
            if products.len() >= count {
                break 'catalog;
            }
            let seed = products.len();
            let product = generate_product(category, prefix, name, seed);

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.sku, e);
                continue;
            }

            for (branch_idx, branch) in BRANCHES.iter().enumerate() {
                let level = generate_stock_level(&product, branch, seed + branch_idx * 7, today);
                db.products().insert_stock_level(&level).await?;

                if product.costing_method == CostingMethod::Fifo && level.quantity_on_hand > 0 {
                    layer_count += seed_layers(&db, &product, &level, seed).await?;
                }
            }

            products.push(product);
        }
    }

    println!("  ✓ {} products", products.len());
    println!("  ✓ {} stock levels", products.len() * BRANCHES.len());
    println!("  ✓ {} cost layers", layer_count);

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------
    if products.is_empty() {
        println!();
        println!("✓ Nothing else to generate");
        return Ok(());
    }

    println!();
    println!("Generating invoices...");

    let invoice_count = products.len() * 3;
    for n in 0..invoice_count {
        let status = if n % 5 == 4 {
            if n % 2 == 0 {
                InvoiceStatus::Draft
            } else {
                InvoiceStatus::Cancelled
            }
        } else {
            InvoiceStatus::Completed
        };

        let invoice = InvoiceRecord {
            id: generate_invoice_id(),
            invoice_number: format!("INV-{:05}", n + 1),
            invoice_date: today - Duration::days((n * 13 % 90) as i64),
            status,
            branch_id: BRANCHES[n % BRANCHES.len()].to_string(),
            created_at: Utc::now(),
        };
        db.invoices().insert_invoice(&invoice).await?;

        for line in 0..(1 + n % 3) {
            let product = &products[(n * 7 + line * 11) % products.len()];
            let quantity = 1 + ((n + line) % 3) as i64;
            // 35-75% markup over cost, occasional line discount
            let unit_price = product.cost_price_cents * (135 + ((n * 17) % 40) as i64) / 100;
            let discount = if n % 6 == 0 { unit_price / 10 } else { 0 };

            db.invoices()
                .insert_item(&InvoiceItemRecord {
                    id: generate_invoice_id(),
                    invoice_id: invoice.id.clone(),
                    product_id: product.id.clone(),
                    quantity,
                    unit_price_cents: unit_price,
                    total_cents: unit_price * quantity - discount,
                })
                .await?;
        }
    }

    println!("  ✓ {} invoices", invoice_count);

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seed complete in {:?}", elapsed);

    Ok(())
}

/// Generates a single product with plausible costs.
fn generate_product(category: &str, prefix: &str, name: &str, seed: usize) -> Product {
    // $2.00 - $89.99
    let cost_price_cents = 200 + ((seed * 733) % 8800) as i64;
    // Average drifts a few percent from the list cost; some products have none
    let average_cost_cents = (seed % 4 != 0).then(|| cost_price_cents * (95 + (seed % 8) as i64) / 100);

    Product {
        id: generate_product_id(),
        sku: format!("{}-{:04}", prefix, seed + 1),
        name: name.to_string(),
        category: Some(category.to_string()),
        cost_price_cents,
        average_cost_cents,
        costing_method: if seed % 2 == 0 {
            CostingMethod::Fifo
        } else {
            CostingMethod::WeightedAverage
        },
        is_active: true,
        created_at: Utc::now() - Duration::days(180),
    }
}

fn generate_stock_level(product: &Product, branch: &str, seed: usize, today: NaiveDate) -> StockLevel {
    let on_hand = ((seed * 37) % 60) as i64;
    let reserved = if on_hand > 5 { (seed % 4) as i64 } else { 0 };
    // 0-150 days so every aging bucket is represented
    let received_days_ago = ((seed * 29) % 151) as i64;

    StockLevel {
        product_id: product.id.clone(),
        branch_id: branch.to_string(),
        quantity_on_hand: on_hand,
        quantity_reserved: reserved,
        average_unit_cost_cents: (seed % 3 != 0).then(|| product.cost_price_cents * (97 + (seed % 6) as i64) / 100),
        last_received_date: Some(today - Duration::days(received_days_ago)),
        updated_at: Utc::now(),
    }
}

/// Writes cost layers covering the branch's on-hand quantity, plus one
/// exhausted layer with its consumption.
///
/// Layer creation belongs to the backend; the seed stands in for it with
/// raw SQL.
async fn seed_layers(
    db: &Database,
    product: &Product,
    level: &StockLevel,
    seed: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let received = level.last_received_date.unwrap_or_else(|| Utc::now().date_naive());
    let older = received - Duration::days(20 + (seed % 30) as i64);
    let oldest = older - Duration::days(30);

    let first_qty = level.quantity_on_hand / 2;
    let second_qty = level.quantity_on_hand - first_qty;

    let layers = [
        (oldest, 5, 0, product.cost_price_cents * 90 / 100),
        (older, first_qty + 3, first_qty, product.cost_price_cents * 97 / 100),
        (received, second_qty, second_qty, product.cost_price_cents),
    ];

    let mut written = 0;
    for (date, received_qty, remaining_qty, unit_cost) in layers {
        if received_qty == 0 {
            continue;
        }
        let layer_id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO cost_layers (
                id, product_id, branch_id, source_type, grn_id, received_qty,
                remaining_qty, unit_cost_cents, received_date, is_exhausted, created_at
            ) VALUES (?1, ?2, ?3, 'grn', ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&layer_id)
        .bind(&product.id)
        .bind(&level.branch_id)
        .bind(format!("GRN-{}", date.format("%Y%m%d")))
        .bind(received_qty)
        .bind(remaining_qty)
        .bind(unit_cost)
        .bind(date)
        .bind(remaining_qty == 0)
        .bind(Utc::now())
        .execute(db.pool())
        .await?;

        let consumed = received_qty - remaining_qty;
        if consumed > 0 {
            sqlx::query(
                r#"
                INSERT INTO cost_layer_consumptions (
                    id, layer_id, product_id, quantity, unit_cost_cents, consumed_at,
                    reference_type, reference_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'invoice', NULL)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&layer_id)
            .bind(&product.id)
            .bind(consumed)
            .bind(unit_cost)
            .bind(Utc::now() - Duration::days((seed % 10) as i64))
            .execute(db.pool())
            .await?;
        }

        written += 1;
    }

    Ok(written)
}
