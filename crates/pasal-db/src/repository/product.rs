//! # Product Repository
//!
//! Catalogue reads and writes: products, their variants, and stock.
//!
//! ## SKU Resolution
//! ```text
//! resolve_sku("MOMO-HALF")
//!       │
//!       ├── products.sku = ?          → (product, None)
//!       │
//!       └── product_variants.sku = ?  → (parent product, Some(variant))
//! ```
//! Cart files and the scanner both hand us a single code; the caller should
//! not need to know whether it names a product or one of its variants.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pasal_core::{Product, ProductVariant};

const PRODUCT_COLUMNS: &str = "id, sku, barcode, name, category, price_paisa, cost_paisa, \
     tax_rate_bps, track_inventory, current_stock, is_active, created_at, updated_at";

const VARIANT_COLUMNS: &str = "id, product_id, sku, name, price_paisa";

/// Repository for product database operations.
///
/// ```rust,ignore
/// let repo = db.products();
/// let results = repo.search("wai", 20).await?;
/// let product = repo.get_by_sku("WAIWAI-75").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products by name, SKU or barcode.
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{}%", escape_like(query));

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = 1
              AND (name LIKE ?1 ESCAPE '\' OR sku LIKE ?1 ESCAPE '\' OR barcode LIKE ?1 ESCAPE '\')
            ORDER BY name
            LIMIT ?2
            "#
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Resolves a product or variant SKU (or a product barcode) to the
    /// product and, for variant codes, the variant.
    pub async fn resolve_sku(&self, code: &str) -> DbResult<Option<(Product, Option<ProductVariant>)>> {
        let code = code.trim();

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1 OR barcode = ?1 LIMIT 1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(product) = product {
            return Ok(Some((product, None)));
        }

        let variant = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE sku = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match variant {
            Some(variant) => {
                let product = self
                    .get_by_id(&variant.product_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Product", &variant.product_id))?;
                Ok(Some((product, Some(variant))))
            }
            None => Ok(None),
        }
    }

    /// Inserts a new product.
    ///
    /// Returns `DbError::UniqueViolation` if the SKU already exists.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, barcode, name, category,
                price_paisa, cost_paisa, tax_rate_bps,
                track_inventory, current_stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_paisa)
        .bind(product.cost_paisa)
        .bind(product.tax_rate_bps)
        .bind(product.track_inventory)
        .bind(product.current_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_as_duplicate(e, "sku", &product.sku))?;

        Ok(product.clone())
    }

    /// Updates name, pricing and inventory settings of an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                barcode = ?3,
                name = ?4,
                category = ?5,
                price_paisa = ?6,
                cost_paisa = ?7,
                tax_rate_bps = ?8,
                track_inventory = ?9,
                is_active = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_paisa)
        .bind(product.cost_paisa)
        .bind(product.tax_rate_bps)
        .bind(product.track_inventory)
        .bind(product.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Applies a stock delta: negative for sales, positive for restocking.
    ///
    /// Deltas rather than absolute values, so concurrent counters don't
    /// overwrite each other's sales.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let result = sqlx::query(
            "UPDATE products SET current_stock = current_stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Hides a product from the till. Past sales keep their snapshots.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Variants
    // -------------------------------------------------------------------------

    pub async fn insert_variant(&self, variant: &ProductVariant) -> DbResult<ProductVariant> {
        debug!(product_id = %variant.product_id, sku = %variant.sku, "Inserting variant");

        sqlx::query(
            "INSERT INTO product_variants (id, product_id, sku, name, price_paisa) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&variant.id)
        .bind(&variant.product_id)
        .bind(&variant.sku)
        .bind(&variant.name)
        .bind(variant.price_paisa)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_as_duplicate(e, "sku", &variant.sku))?;

        Ok(variant.clone())
    }

    pub async fn get_variant(&self, id: &str) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Variants of a product, cheapest first.
    pub async fn variants_for(&self, product_id: &str) -> DbResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE product_id = ?1 \
             ORDER BY price_paisa, name"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }
}

/// Reports a unique violation with the offending value rather than the
/// bare column name SQLite gives us.
fn unique_as_duplicate(err: sqlx::Error, field: &str, value: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate(field, value),
        other => other,
    }
}

/// Escapes `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn product(sku: &str, name: &str, price_paisa: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            barcode: None,
            name: name.to_string(),
            category: None,
            price_paisa,
            cost_paisa: None,
            tax_rate_bps: 1300,
            track_inventory: false,
            current_stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let dahi = product("DAHI-500", "Dahi 500g", 11_300);
        repo.insert(&dahi).await.unwrap();

        let by_id = repo.get_by_id(&dahi.id).await.unwrap().unwrap();
        assert_eq!(by_id.sku, "DAHI-500");
        assert_eq!(by_id.price_paisa, 11_300);
        assert_eq!(by_id.tax_rate_bps, 1300);
        assert!(by_id.is_active);

        let by_sku = repo.get_by_sku("DAHI-500").await.unwrap().unwrap();
        assert_eq!(by_sku.id, dahi.id);

        assert!(repo.get_by_sku("NOPE").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&product("CHIYA", "Chiya", 2_500)).await.unwrap();
        let err = repo
            .insert(&product("CHIYA", "Milk Chiya", 3_000))
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "CHIYA");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_matches_name_and_sku() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&product("WAIWAI-75", "Wai Wai Noodles", 2_500)).await.unwrap();
        repo.insert(&product("RUMPUM-70", "Rum Pum Noodles", 2_000)).await.unwrap();
        repo.insert(&product("COKE-500", "Coca-Cola 500ml", 7_000)).await.unwrap();

        let noodles = repo.search("noodles", 10).await.unwrap();
        assert_eq!(noodles.len(), 2);
        assert_eq!(noodles[0].name, "Rum Pum Noodles");

        let coke = repo.search("coke", 10).await.unwrap();
        assert_eq!(coke.len(), 1);

        // Wildcards in the query are literal
        assert!(repo.search("%", 10).await.unwrap().is_empty());

        // Empty query lists everything active
        assert_eq!(repo.search("  ", 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_search() {
        let db = db().await;
        let repo = db.products();

        let p = product("SUNTALI", "Suntali", 1_000);
        repo.insert(&p).await.unwrap();
        repo.soft_delete(&p.id).await.unwrap();

        assert!(repo.search("suntali", 10).await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);
        // Still reachable by id for history
        assert!(!repo.get_by_id(&p.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_update_product() {
        let db = db().await;
        let repo = db.products();

        let mut p = product("CHAU-1", "Chauchau", 2_000);
        repo.insert(&p).await.unwrap();

        p.price_paisa = 2_200;
        p.track_inventory = true;
        repo.update(&p).await.unwrap();

        let stored = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.price_paisa, 2_200);
        assert!(stored.track_inventory);

        p.id = "missing".to_string();
        assert!(matches!(repo.update(&p).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = db().await;
        let repo = db.products();

        let mut p = product("DAHI-1L", "Dahi 1L", 20_000);
        p.track_inventory = true;
        p.current_stock = 10;
        repo.insert(&p).await.unwrap();

        repo.adjust_stock(&p.id, -3).await.unwrap();
        repo.adjust_stock(&p.id, 5).await.unwrap();

        let stored = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.current_stock, 12);

        assert!(matches!(
            repo.adjust_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_variants_and_resolve_sku() {
        let db = db().await;
        let repo = db.products();

        let momo = product("MOMO", "Buff Momo", 18_000);
        repo.insert(&momo).await.unwrap();

        let half = ProductVariant {
            id: Uuid::new_v4().to_string(),
            product_id: momo.id.clone(),
            sku: "MOMO-HALF".to_string(),
            name: "Half plate".to_string(),
            price_paisa: 10_000,
        };
        repo.insert_variant(&half).await.unwrap();

        let variants = repo.variants_for(&momo.id).await.unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].sku, "MOMO-HALF");
        assert!(repo.get_variant(&half.id).await.unwrap().is_some());

        let (p, v) = repo.resolve_sku("MOMO").await.unwrap().unwrap();
        assert_eq!(p.id, momo.id);
        assert!(v.is_none());

        let (p, v) = repo.resolve_sku("MOMO-HALF").await.unwrap().unwrap();
        assert_eq!(p.id, momo.id);
        assert_eq!(v.unwrap().price_paisa, 10_000);

        assert!(repo.resolve_sku("MOMO-JHOL").await.unwrap().is_none());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}
