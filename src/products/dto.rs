use serde::Serialize;
use time::OffsetDateTime;

use super::repo_types::Product;
use crate::external::Ingredient;
use crate::nutrition::NutritionProfile;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub barcode: String,
    pub product_name: String,
    pub brand: Option<String>,
    pub categories: Vec<String>,
    pub nutrition_per_100g: NutritionProfile,
    pub ingredients_text: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub nova_group: Option<i16>,
    pub allergens: Vec<String>,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            barcode: p.barcode,
            product_name: p.product_name,
            brand: p.brand,
            categories: p.categories,
            nutrition_per_100g: p.nutrition,
            ingredients_text: p.ingredients_text,
            ingredients: p.ingredients_parsed.0,
            nova_group: p.nova_group,
            allergens: p.allergens,
            image_url: p.image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
