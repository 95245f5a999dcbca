use rust_decimal::Decimal;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

use crate::nutrition::NutritionSnapshot;

/// Diary entry record in the database. Immutable once written.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct FoodEntry {
    pub id: i64,
    pub user_id: String,
    pub barcode: String,
    pub entry_date: Date,
    pub meal_type: Option<String>,
    pub servings_grams: Decimal,
    #[sqlx(flatten)]
    pub nutrition: NutritionSnapshot,
    pub custom_food_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodEntry {
    pub user_id: String,
    pub barcode: String,
    pub entry_date: Date,
    pub meal_type: Option<String>,
    pub servings_grams: Decimal,
    pub nutrition: NutritionSnapshot,
    pub custom_food_name: Option<String>,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}
