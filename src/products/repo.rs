use sqlx::{types::Json, PgPool, Postgres, Transaction};

use super::repo_types::{NewProduct, Product};
use crate::store::StoreError;

const PRODUCT_COLUMNS: &str = r#"
    barcode, product_name, brand, categories,
    calories, protein_g, carbs_g, sugar_g, fiber_g, fat_g, saturated_fat_g, sodium_g,
    ingredients_text, ingredients_parsed, nova_group, allergens, image_url, data_source,
    created_at, updated_at
"#;

/// Find a product by its barcode.
pub async fn find_by_barcode(db: &PgPool, barcode: &str) -> Result<Option<Product>, StoreError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = $1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(barcode)
        .fetch_optional(db)
        .await?;
    Ok(product)
}

/// Insert a new product within a transaction.
///
/// A second insert for the same barcode fails with [`StoreError::Conflict`].
pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    p: &NewProduct,
) -> Result<Product, StoreError> {
    let sql = format!(
        r#"
        INSERT INTO products (
            barcode, product_name, brand, categories,
            calories, protein_g, carbs_g, sugar_g, fiber_g, fat_g, saturated_fat_g, sodium_g,
            ingredients_text, ingredients_parsed, nova_group, allergens, image_url, data_source
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING {PRODUCT_COLUMNS}
        "#
    );
    let n = &p.nutrition;
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(&p.barcode)
        .bind(&p.product_name)
        .bind(&p.brand)
        .bind(&p.categories)
        .bind(n.calories)
        .bind(n.protein_g)
        .bind(n.carbs_g)
        .bind(n.sugar_g)
        .bind(n.fiber_g)
        .bind(n.fat_g)
        .bind(n.saturated_fat_g)
        .bind(n.sodium_g)
        .bind(&p.ingredients_text)
        .bind(Json(&p.ingredients_parsed))
        .bind(p.nova_group)
        .bind(&p.allergens)
        .bind(&p.image_url)
        .bind(&p.data_source)
        .fetch_one(&mut **tx)
        .await
        .map_err(StoreError::from_insert)?;
    Ok(product)
}
