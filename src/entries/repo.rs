use sqlx::{PgPool, Postgres, Transaction};
use time::Date;

use super::repo_types::{FoodEntry, NewFoodEntry};
use crate::store::StoreError;

const ENTRY_COLUMNS: &str = r#"
    id, user_id, barcode, entry_date, meal_type, servings_grams,
    calories, protein_g, carbs_g, sugar_g, fiber_g, fat_g,
    custom_food_name, notes, created_at
"#;

/// Find an entry by id, only if it belongs to `user_id`.
pub async fn find_owned(
    db: &PgPool,
    id: i64,
    user_id: &str,
) -> Result<Option<FoodEntry>, StoreError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM food_entries WHERE id = $1 AND user_id = $2");
    let entry = sqlx::query_as::<_, FoodEntry>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(entry)
}

/// List a user's entries, newest first, optionally for a single day.
pub async fn list_by_user(
    db: &PgPool,
    user_id: &str,
    date: Option<Date>,
) -> Result<Vec<FoodEntry>, StoreError> {
    let sql = format!(
        r#"
        SELECT {ENTRY_COLUMNS}
          FROM food_entries
         WHERE user_id = $1
           AND ($2::date IS NULL OR entry_date = $2)
         ORDER BY created_at DESC, id DESC
        "#
    );
    let rows = sqlx::query_as::<_, FoodEntry>(&sql)
        .bind(user_id)
        .bind(date)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Insert a new entry within a transaction.
pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    e: &NewFoodEntry,
) -> Result<FoodEntry, StoreError> {
    let sql = format!(
        r#"
        INSERT INTO food_entries (
            user_id, barcode, entry_date, meal_type, servings_grams,
            calories, protein_g, carbs_g, sugar_g, fiber_g, fat_g,
            custom_food_name, notes, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING {ENTRY_COLUMNS}
        "#
    );
    let n = &e.nutrition;
    let entry = sqlx::query_as::<_, FoodEntry>(&sql)
        .bind(&e.user_id)
        .bind(&e.barcode)
        .bind(e.entry_date)
        .bind(&e.meal_type)
        .bind(e.servings_grams)
        .bind(n.calories)
        .bind(n.protein_g)
        .bind(n.carbs_g)
        .bind(n.sugar_g)
        .bind(n.fiber_g)
        .bind(n.fat_g)
        .bind(&e.custom_food_name)
        .bind(&e.notes)
        .bind(e.created_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(StoreError::from_insert)?;
    Ok(entry)
}

/// Delete an entry within a transaction. Ownership is re-checked in the
/// statement itself.
pub async fn delete_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    user_id: &str,
) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM food_entries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Missing);
    }
    Ok(())
}
