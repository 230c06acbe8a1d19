//! `pasal product` - catalogue maintenance.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::{money, print_json};
use crate::config::PasalConfig;
use crate::error::{CliError, CliResult};
use pasal_core::validation::{validate_name, validate_price, validate_sku, validate_tax_rate_bps};
use pasal_core::{CoreError, Money, Product, ProductVariant};
use pasal_db::repository::product::generate_product_id;
use pasal_db::Database;

/// Fields for a new catalogue product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub price: Money,
    pub cost: Option<Money>,
    pub category: Option<String>,
    pub barcode: Option<String>,
    pub tax_rate_bps: u32,
    /// Opening stock; setting it turns on stock tracking.
    pub stock: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductDetail {
    #[serde(flatten)]
    product: Product,
    variants: Vec<ProductVariant>,
}

pub async fn list(
    config: &PasalConfig,
    db: &Database,
    query: Option<&str>,
    limit: u32,
    json: bool,
) -> CliResult<()> {
    let products = db.products().search(query.unwrap_or(""), limit).await?;

    if json {
        return print_json(&products);
    }

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    println!("{:<16}{:<32}{:>14}{:>8}", "SKU", "Name", "Price", "Stock");
    for product in &products {
        let stock = if product.track_inventory {
            product.current_stock.to_string()
        } else {
            "-".to_string()
        };
        println!(
            "{:<16}{:<32}{:>14}{:>8}",
            product.sku,
            product.name,
            money(config, product.price()),
            stock
        );
    }
    Ok(())
}

pub async fn show(config: &PasalConfig, db: &Database, sku: &str, json: bool) -> CliResult<()> {
    let product = find_product(db, sku).await?;
    let variants = db.products().variants_for(&product.id).await?;

    if json {
        return print_json(&ProductDetail { product, variants });
    }

    println!("{} ({})", product.name, product.sku);
    println!("  Price:    {}", money(config, product.price()));
    if let Some(cost) = product.cost_paisa {
        println!("  Cost:     {}", money(config, Money::from_paisa(cost)));
    }
    println!("  VAT:      {}%", product.tax_rate().percentage());
    if let Some(category) = &product.category {
        println!("  Category: {category}");
    }
    if let Some(barcode) = &product.barcode {
        println!("  Barcode:  {barcode}");
    }
    if product.track_inventory {
        println!("  Stock:    {}", product.current_stock);
    }
    if !product.is_active {
        println!("  (inactive)");
    }
    for variant in &variants {
        println!(
            "  - {:<14}{:<24}{:>14}",
            variant.sku,
            variant.name,
            money(config, variant.price())
        );
    }
    Ok(())
}

pub async fn add(config: &PasalConfig, db: &Database, new: NewProduct, json: bool) -> CliResult<()> {
    let product = build_product(new, Utc::now())?;
    let product = db.products().insert(&product).await?;

    info!(sku = %product.sku, "Product added");

    if json {
        return print_json(&product);
    }

    println!("Added {} ({}) at {}", product.name, product.sku, money(config, product.price()));
    Ok(())
}

pub async fn add_variant(
    config: &PasalConfig,
    db: &Database,
    product_sku: &str,
    sku: &str,
    name: &str,
    price: Money,
    json: bool,
) -> CliResult<()> {
    validate_sku(sku).map_err(CoreError::from)?;
    validate_name("name", name).map_err(CoreError::from)?;
    validate_price(price).map_err(CoreError::from)?;

    let product = find_product(db, product_sku).await?;
    let variant = db
        .products()
        .insert_variant(&ProductVariant {
            id: generate_product_id(),
            product_id: product.id.clone(),
            sku: sku.trim().to_string(),
            name: name.trim().to_string(),
            price_paisa: price.paisa(),
        })
        .await?;

    if json {
        return print_json(&variant);
    }

    println!(
        "Added {} ({}) to {} at {}",
        variant.name,
        variant.sku,
        product.name,
        money(config, variant.price())
    );
    Ok(())
}

/// Restocks (positive) or writes off (negative) stock.
pub async fn adjust_stock(db: &Database, sku: &str, delta: i64, json: bool) -> CliResult<()> {
    if delta == 0 {
        return Err(CliError::invalid("stock adjustment must not be zero"));
    }

    let product = find_product(db, sku).await?;
    if !product.track_inventory {
        return Err(CliError::invalid(format!(
            "{} does not track stock",
            product.sku
        )));
    }

    db.products().adjust_stock(&product.id, delta).await?;
    let product = find_product(db, sku).await?;

    if json {
        return print_json(&product);
    }

    println!("{}: stock now {}", product.sku, product.current_stock);
    Ok(())
}

pub async fn set_price(
    config: &PasalConfig,
    db: &Database,
    sku: &str,
    price: Money,
    json: bool,
) -> CliResult<()> {
    validate_price(price).map_err(CoreError::from)?;

    let mut product = find_product(db, sku).await?;
    let old = product.price();
    product.price_paisa = price.paisa();
    product.updated_at = Utc::now();
    db.products().update(&product).await?;

    info!(sku = %product.sku, old = %old, new = %price, "Price changed");

    if json {
        return print_json(&product);
    }

    println!(
        "{}: {} -> {}",
        product.sku,
        money(config, old),
        money(config, price)
    );
    Ok(())
}

/// Hides a product from the till.
pub async fn remove(db: &Database, sku: &str) -> CliResult<()> {
    let product = find_product(db, sku).await?;
    db.products().soft_delete(&product.id).await?;

    println!("{} removed from sale", product.sku);
    Ok(())
}

async fn find_product(db: &Database, sku: &str) -> CliResult<Product> {
    db.products()
        .get_by_sku(sku.trim())
        .await?
        .ok_or_else(|| CliError::not_found("Product", sku))
}

/// Validates operator input and builds the product row.
pub fn build_product(new: NewProduct, now: DateTime<Utc>) -> CliResult<Product> {
    validate_sku(&new.sku).map_err(CoreError::from)?;
    validate_name("name", &new.name).map_err(CoreError::from)?;
    validate_price(new.price).map_err(CoreError::from)?;
    validate_tax_rate_bps(new.tax_rate_bps).map_err(CoreError::from)?;

    if let Some(stock) = new.stock {
        if stock < 0 {
            return Err(CliError::invalid("opening stock cannot be negative"));
        }
    }

    let blank_to_none = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    Ok(Product {
        id: generate_product_id(),
        sku: new.sku.trim().to_string(),
        barcode: blank_to_none(new.barcode),
        name: new.name.trim().to_string(),
        category: blank_to_none(new.category),
        price_paisa: new.price.paisa(),
        cost_paisa: new.cost.map(|c| c.paisa()),
        tax_rate_bps: new.tax_rate_bps,
        track_inventory: new.stock.is_some(),
        current_stock: new.stock.unwrap_or(0),
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_config;
    use pasal_db::DbConfig;

    fn new_product(sku: &str) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: "Wai Wai Noodles 75g".to_string(),
            price: Money::from_rupees(25),
            cost: None,
            category: Some("  ".to_string()),
            barcode: None,
            tax_rate_bps: 1300,
            stock: Some(48),
        }
    }

    #[test]
    fn test_build_product() {
        let product = build_product(new_product(" WAIWAI-75 "), Utc::now()).unwrap();
        assert_eq!(product.sku, "WAIWAI-75");
        assert_eq!(product.category, None);
        assert!(product.track_inventory);
        assert_eq!(product.current_stock, 48);

        let mut untracked = new_product("RICE-1KG");
        untracked.stock = None;
        untracked.tax_rate_bps = 0;
        let product = build_product(untracked, Utc::now()).unwrap();
        assert!(!product.track_inventory);
        assert!(product.tax_rate().is_zero());
    }

    #[test]
    fn test_build_product_rejects_bad_input() {
        let mut bad = new_product("");
        assert!(matches!(
            build_product(bad.clone(), Utc::now()),
            Err(CliError::Core(CoreError::Validation(_)))
        ));

        bad.sku = "OK-1".to_string();
        bad.tax_rate_bps = 10_001;
        assert!(build_product(bad.clone(), Utc::now()).is_err());

        bad.tax_rate_bps = 1300;
        bad.stock = Some(-1);
        assert!(matches!(
            build_product(bad, Utc::now()),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_add_adjust_and_reprice() {
        let config = test_config();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        add(&config, &db, new_product("WAIWAI-75"), true).await.unwrap();
        assert!(matches!(
            add(&config, &db, new_product("WAIWAI-75"), true).await,
            Err(CliError::Db(pasal_db::DbError::UniqueViolation { .. }))
        ));

        adjust_stock(&db, "WAIWAI-75", -8, true).await.unwrap();
        set_price(&config, &db, "WAIWAI-75", Money::from_rupees(30), true)
            .await
            .unwrap();

        let product = find_product(&db, "WAIWAI-75").await.unwrap();
        assert_eq!(product.current_stock, 40);
        assert_eq!(product.price(), Money::from_rupees(30));

        assert!(matches!(
            adjust_stock(&db, "WAIWAI-75", 0, true).await,
            Err(CliError::InvalidInput(_))
        ));
        assert!(matches!(
            adjust_stock(&db, "NOPE", 5, true).await,
            Err(CliError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_variant_resolves_by_code() {
        let config = test_config();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut momo = new_product("MOMO");
        momo.name = "Buff Momo".to_string();
        momo.stock = None;
        add(&config, &db, momo, true).await.unwrap();

        add_variant(&config, &db, "MOMO", "MOMO-JHOL", "Jhol", Money::from_rupees(200), true)
            .await
            .unwrap();

        let (product, variant) = db.products().resolve_sku("MOMO-JHOL").await.unwrap().unwrap();
        assert_eq!(product.sku, "MOMO");
        assert_eq!(variant.unwrap().price(), Money::from_rupees(200));
    }

    #[tokio::test]
    async fn test_remove_hides_product() {
        let config = test_config();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        add(&config, &db, new_product("DAHI"), true).await.unwrap();

        remove(&db, "DAHI").await.unwrap();
        assert!(db.products().search("", 10).await.unwrap().is_empty());
    }
}
