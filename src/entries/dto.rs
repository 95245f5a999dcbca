use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::repo_types::FoodEntry;
use crate::nutrition::NutritionSnapshot;

/// Body of `POST /food-entries`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodEntryRequest {
    pub barcode: String,
    #[serde(alias = "serving_size_g")]
    pub serving_grams: Decimal,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub entry_date: Option<Date>, // defaults to today (UTC)
}

#[derive(Debug, Deserialize)]
pub struct EntryFilter {
    #[serde(default)]
    pub date: Option<Date>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntryResponse {
    pub id: i64,
    pub user_id: String,
    pub barcode: String,
    pub entry_date: Date,
    pub meal_type: Option<String>,
    pub serving_grams: Decimal,
    #[serde(flatten)]
    pub nutrition: NutritionSnapshot,
    pub custom_food_name: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<FoodEntry> for FoodEntryResponse {
    fn from(e: FoodEntry) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            barcode: e.barcode,
            entry_date: e.entry_date,
            meal_type: e.meal_type,
            serving_grams: e.servings_grams,
            nutrition: e.nutrition,
            custom_food_name: e.custom_food_name,
            notes: e.notes,
            created_at: e.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn request_accepts_camel_case_and_numbers() {
        let req: CreateFoodEntryRequest = serde_json::from_value(json!({
            "barcode": "737628064502",
            "servingGrams": 50,
            "mealType": "snack",
            "entryDate": "2025-03-14"
        }))
        .unwrap();
        assert_eq!(req.serving_grams, Decimal::from(50));
        assert_eq!(req.meal_type.as_deref(), Some("snack"));
        assert_eq!(req.entry_date, Some(time::macros::date!(2025 - 03 - 14)));
        assert!(req.notes.is_none());
    }

    #[test]
    fn request_accepts_string_grams() {
        let req: CreateFoodEntryRequest = serde_json::from_value(json!({
            "barcode": "1",
            "serving_size_g": "12.5"
        }))
        .unwrap();
        assert_eq!(req.serving_grams, Decimal::from_str("12.5").unwrap());
    }

    #[test]
    fn response_flattens_snapshot() {
        let entry = FoodEntry {
            id: 7,
            user_id: "u1".into(),
            barcode: "737628064502".into(),
            entry_date: time::macros::date!(2025 - 03 - 14),
            meal_type: None,
            servings_grams: Decimal::from(50),
            nutrition: NutritionSnapshot {
                calories: Some(Decimal::from_str("250.00").unwrap()),
                ..Default::default()
            },
            custom_food_name: None,
            notes: None,
            created_at: time::macros::datetime!(2025-03-14 12:00 UTC),
        };
        let v = serde_json::to_value(FoodEntryResponse::from(entry)).unwrap();
        assert_eq!(v["id"], 7);
        assert_eq!(v["calories"], "250.00");
        assert_eq!(v["proteinG"], serde_json::Value::Null);
        assert_eq!(v["entryDate"], "2025-03-14");
        assert_eq!(v["createdAt"], "2025-03-14T12:00:00Z");
    }
}
