//! Adapters to third-party nutrition databases.

pub mod open_food_facts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::nutrition::NutritionProfile;

pub use open_food_facts::OpenFoodFactsClient;

/// One parsed ingredient of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
}

/// A product record as delivered by an external source, already normalized
/// to the canonical per-100g shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProduct {
    pub name: String,
    pub brand: Option<String>,
    pub categories: Vec<String>,
    pub nutrition: NutritionProfile,
    pub ingredients_text: Option<String>,
    pub ingredients: Vec<Ingredient>,
    pub nova_group: Option<i16>,
    pub allergens: Vec<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    Url(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// A nutrition database that can be asked for a single product by barcode.
///
/// `Ok(None)` means the source answered and does not know the barcode.
/// One attempt per call, no retries.
#[async_trait]
pub trait FoodSource: Send + Sync {
    /// Short tag persisted as the product's `data_source`.
    fn name(&self) -> &'static str;

    async fn fetch(&self, barcode: &str) -> Result<Option<NormalizedProduct>, FetchError>;
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rust_decimal::Decimal;

    use super::*;

    /// Answers from a fixed table and counts every call.
    #[derive(Default)]
    pub struct ScriptedFoodSource {
        answers: HashMap<String, Result<Option<NormalizedProduct>, FetchError>>,
        calls: AtomicUsize,
    }

    impl ScriptedFoodSource {
        pub fn with(mut self, barcode: &str, product: NormalizedProduct) -> Self {
            self.answers.insert(barcode.into(), Ok(Some(product)));
            self
        }

        pub fn failing(mut self, barcode: &str, err: FetchError) -> Self {
            self.answers.insert(barcode.into(), Err(err));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FoodSource for ScriptedFoodSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch(&self, barcode: &str) -> Result<Option<NormalizedProduct>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers.get(barcode).cloned().unwrap_or(Ok(None))
        }
    }

    pub fn cookies() -> NormalizedProduct {
        NormalizedProduct {
            name: "Cookies".into(),
            brand: Some("Acme".into()),
            categories: vec!["snacks".into(), "biscuits".into()],
            nutrition: NutritionProfile {
                calories: Some(Decimal::from_str("500").unwrap()),
                protein_g: Some(Decimal::from_str("5").unwrap()),
                ..Default::default()
            },
            ingredients_text: Some("Wheat flour, sugar".into()),
            ingredients: vec![
                Ingredient {
                    name: "wheat flour".into(),
                },
                Ingredient {
                    name: "sugar".into(),
                },
            ],
            nova_group: Some(4),
            allergens: vec!["gluten".into()],
            image_url: None,
        }
    }
}
