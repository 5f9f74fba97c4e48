//! # Seed Data Generator
//!
//! Populates a database with a small demo catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p mostrador-db --bin seed
//!
//! # Specify database path and tenant
//! cargo run -p mostrador-db --bin seed -- --db ./data/mostrador.db --tenant acme
//! ```
//!
//! ## Generated Data
//! - Categories, some with their own margin override
//! - Products spread across categories with USD costs and stock
//! - A handful of customers with social handles

use std::env;

use mostrador_core::{Margin, Money, NewCustomer, DEFAULT_TENANT_ID};
use mostrador_db::{Database, DbConfig, NewProduct};

/// (category, margin override in bps, products as (name, cost cents, stock))
const CATALOG: &[(&str, Option<u32>, &[(&str, i64, i64)])] = &[
    (
        "Almacén",
        None,
        &[
            ("Yerba Mate 1kg", 420, 40),
            ("Azúcar 1kg", 110, 60),
            ("Harina 000 1kg", 90, 35),
            ("Fideos Spaghetti 500g", 130, 50),
            ("Aceite Girasol 1.5L", 380, 18),
            ("Dulce de Leche 400g", 240, 22),
        ],
    ),
    (
        "Bebidas",
        Some(2500),
        &[
            ("Agua Mineral 2L", 80, 72),
            ("Gaseosa Cola 2.25L", 210, 48),
            ("Vino Malbec 750ml", 650, 24),
            ("Cerveza Lata 473ml", 120, 96),
        ],
    ),
    (
        "Limpieza",
        Some(4000),
        &[
            ("Lavandina 1L", 95, 30),
            ("Detergente 750ml", 180, 25),
            ("Esponja x3", 70, 4),
        ],
    ),
    (
        "Electrónica",
        Some(1500),
        &[
            ("Auriculares Bluetooth", 1850, 6),
            ("Cargador USB-C 20W", 1200, 3),
            ("Cable HDMI 2m", 450, 12),
        ],
    ),
];

const CUSTOMERS: &[(&str, Option<&str>, Option<&str>)] = &[
    ("Lucía Fernández", Some("+54 9 11 5555-0101"), Some("@lu.fernandez")),
    ("Martín Gómez", Some("+54 9 351 555-0202"), None),
    ("Sofía Ramírez", None, Some("@sofi.ramirez")),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./mostrador.db");
    let mut tenant = String::from(DEFAULT_TENANT_ID);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mostrador Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./mostrador.db)");
                println!("  -t, --tenant <ID>     Tenant id (default: {DEFAULT_TENANT_ID})");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Mostrador Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Tenant:   {}", tenant);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products(&tenant).count().await?;
    if existing > 0 {
        println!("⚠ Tenant already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut products = 0;
    for (category_name, margin_bps, items) in CATALOG {
        let category = db
            .categories(&tenant)
            .create(category_name, margin_bps.map(Margin::from_bps))
            .await?;

        for (name, cost_cents, stock) in items.iter() {
            let new = NewProduct {
                name: name.to_string(),
                cost: Money::from_cents(*cost_cents),
                stock: *stock,
                category_id: Some(category.id.clone()),
                image_url: None,
            };
            if let Err(e) = db.products(&tenant).create(&new).await {
                eprintln!("Failed to insert {}: {}", name, e);
                continue;
            }
            products += 1;
        }
    }
    println!("✓ {} categories, {} products", CATALOG.len(), products);

    for (name, whatsapp, instagram) in CUSTOMERS {
        db.customers(&tenant)
            .create(&NewCustomer {
                name: name.to_string(),
                whatsapp: whatsapp.map(str::to_string),
                instagram: instagram.map(str::to_string),
                facebook: None,
            })
            .await?;
    }
    println!("✓ {} customers", CUSTOMERS.len());

    let low = db.products(&tenant).low_stock(5).await?;
    println!("  Low stock (≤ 5): {}", low.len());

    println!();
    println!("✓ Seed complete!");
    db.close().await;

    Ok(())
}
