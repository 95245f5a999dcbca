use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;

use crate::external::{Ingredient, NormalizedProduct};
use crate::nutrition::NutritionProfile;

/// Product record in the database, keyed by barcode.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Product {
    pub barcode: String,
    pub product_name: String,
    pub brand: Option<String>,
    pub categories: Vec<String>,
    #[sqlx(flatten)]
    pub nutrition: NutritionProfile, // per 100 g
    pub ingredients_text: Option<String>,
    pub ingredients_parsed: Json<Vec<Ingredient>>,
    pub nova_group: Option<i16>,
    pub allergens: Vec<String>,
    pub image_url: Option<String>,
    pub data_source: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Product about to be inserted; timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub barcode: String,
    pub product_name: String,
    pub brand: Option<String>,
    pub categories: Vec<String>,
    pub nutrition: NutritionProfile,
    pub ingredients_text: Option<String>,
    pub ingredients_parsed: Vec<Ingredient>,
    pub nova_group: Option<i16>,
    pub allergens: Vec<String>,
    pub image_url: Option<String>,
    pub data_source: String,
}

impl NewProduct {
    /// Keys the record by the barcode that was asked for, not by whatever
    /// code the source echoes back.
    pub fn from_normalized(barcode: &str, data_source: &str, p: NormalizedProduct) -> Self {
        Self {
            barcode: barcode.to_string(),
            product_name: p.name,
            brand: p.brand,
            categories: p.categories,
            nutrition: p.nutrition,
            ingredients_text: p.ingredients_text,
            ingredients_parsed: p.ingredients,
            nova_group: p.nova_group,
            allergens: p.allergens,
            image_url: p.image_url,
            data_source: data_source.to_string(),
        }
    }
}
