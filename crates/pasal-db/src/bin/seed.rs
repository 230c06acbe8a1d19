//! # Seed Data Generator
//!
//! Populates a database with a small pasal catalogue for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p pasal-db --bin seed
//! cargo run -p pasal-db --bin seed -- --db ./data/pasal.db
//! ```
//!
//! ## Generated Data
//! - Everyday goods across noodles, dairy, beverages, snacks and staples
//! - Momo and Coke with variants (half/full plate, 500 ml/1 L)
//! - Rice and fresh vegetables VAT-exempt, everything else at 13%
//! - Two khata customers

use chrono::Utc;
use std::env;
use uuid::Uuid;

use pasal_core::{Product, ProductVariant};
use pasal_db::{Database, DbConfig};

/// (sku, name, category, price in paisa, VAT bps, tracked stock)
const CATALOGUE: &[(&str, &str, &str, i64, u32, Option<i64>)] = &[
    ("WAIWAI-75", "Wai Wai Noodles 75g", "Noodles", 2_500, 1300, Some(240)),
    ("RUMPUM-70", "Rum Pum Noodles 70g", "Noodles", 2_000, 1300, Some(180)),
    ("MAYOS-70", "Mayos Noodles 70g", "Noodles", 2_000, 1300, Some(120)),
    ("DAHI-500", "DDC Dahi 500g", "Dairy", 11_300, 1300, Some(20)),
    ("MILK-500", "DDC Milk 500ml", "Dairy", 5_500, 1300, Some(40)),
    ("GHEE-1L", "Ghee 1L", "Dairy", 120_000, 1300, Some(6)),
    ("CHIYA", "Chiya (cup)", "Beverages", 2_500, 1300, None),
    ("COKE", "Coca-Cola", "Beverages", 7_000, 1300, Some(48)),
    ("KURKURE", "Kurkure Masala", "Snacks", 2_000, 1300, Some(60)),
    ("BISCUIT-GLC", "Glucose Biscuit", "Snacks", 1_500, 1300, Some(90)),
    ("MOMO", "Buff Momo", "Kitchen", 18_000, 1300, None),
    ("CHATAMARI", "Chatamari", "Kitchen", 15_000, 1300, None),
    ("RICE-JEERA-5", "Jeera Masino Rice 5kg", "Staples", 95_000, 0, Some(15)),
    ("DAL-MAS-1", "Masoor Dal 1kg", "Staples", 18_500, 1300, Some(25)),
    ("TARKARI-ALOO", "Aloo (per kg)", "Vegetables", 8_000, 0, None),
];

/// (parent sku, variant sku, label, price in paisa)
const VARIANTS: &[(&str, &str, &str, i64)] = &[
    ("MOMO", "MOMO-HALF", "Half plate", 10_000),
    ("MOMO", "MOMO-FULL", "Full plate", 18_000),
    ("MOMO", "MOMO-JHOL", "Jhol, full plate", 20_000),
    ("COKE", "COKE-500", "500 ml", 7_000),
    ("COKE", "COKE-1L", "1 L", 12_000),
];

const CUSTOMERS: &[(&str, Option<&str>)] = &[
    ("Ram Bahadur Thapa", Some("9841000001")),
    ("Sita Gurung", Some("9851000002")),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./pasal_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Pasal POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./pasal_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Pasal POS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
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

    let products = db.products();
    let mut generated = 0;

    for &(sku, name, category, price_paisa, tax_rate_bps, stock) in CATALOGUE {
        let product = catalogue_product(sku, name, category, price_paisa, tax_rate_bps, stock);
        if let Err(e) = products.insert(&product).await {
            eprintln!("Failed to insert {}: {}", sku, e);
            continue;
        }
        generated += 1;

        for &(_, variant_sku, label, variant_price) in
            VARIANTS.iter().filter(|(parent, ..)| *parent == sku)
        {
            let variant = ProductVariant {
                id: Uuid::new_v4().to_string(),
                product_id: product.id.clone(),
                sku: variant_sku.to_string(),
                name: label.to_string(),
                price_paisa: variant_price,
            };
            if let Err(e) = products.insert_variant(&variant).await {
                eprintln!("Failed to insert variant {}: {}", variant_sku, e);
            }
        }
    }

    println!("✓ Generated {} products, {} variants", generated, VARIANTS.len());

    for &(name, phone) in CUSTOMERS {
        let customer = db.khata().create_customer(name, phone).await?;
        println!("✓ Customer {} ({})", customer.name, customer.id);
    }

    println!();
    println!("Verifying search...");
    let results = products.search("noodles", 10).await?;
    println!("  Search 'noodles': {} results", results.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn catalogue_product(
    sku: &str,
    name: &str,
    category: &str,
    price_paisa: i64,
    tax_rate_bps: u32,
    stock: Option<i64>,
) -> Product {
    let now = Utc::now();

    Product {
        id: Uuid::new_v4().to_string(),
        sku: sku.to_string(),
        barcode: None,
        name: name.to_string(),
        category: Some(category.to_string()),
        price_paisa,
        // Roughly 80% of shelf price
        cost_paisa: Some(price_paisa * 4 / 5),
        tax_rate_bps,
        track_inventory: stock.is_some(),
        current_stock: stock.unwrap_or(0),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
