//! Open Food Facts client.
//!
//! `GET {base_url}/product/{barcode}.json` answers with an envelope
//! `{"status": 0|1, "product": {...}}`. A zero status means the barcode is
//! unknown; everything else that is not a well-formed product is a
//! [`FetchError`].

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{StatusCode, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{FetchError, FoodSource, Ingredient, NormalizedProduct};
use crate::config::FoodSourceConfig;
use crate::nutrition::NutritionProfile;

const UNKNOWN_PRODUCT: &str = "Unknown Product";
const MAX_CATEGORIES: usize = 5;

lazy_static! {
    // locale tag in front of taxonomy ids, e.g. "en:" in "en:wheat-flour"
    static ref LANG_PREFIX: Regex = Regex::new(r"^[a-z]{2,3}:").unwrap();
}

#[derive(Clone)]
pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OpenFoodFactsClient {
    pub fn new(config: &FoodSourceConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("parse food source url {}", config.base_url))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("build food source http client")?;
        Ok(Self { http, base_url })
    }

    fn product_url(&self, barcode: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .push("product")
            .push(&format!("{barcode}.json"));
        Ok(url)
    }
}

#[async_trait]
impl FoodSource for OpenFoodFactsClient {
    fn name(&self) -> &'static str {
        "openfoodfacts"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, barcode: &str) -> Result<Option<NormalizedProduct>, FetchError> {
        let url = self.product_url(barcode)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();

        // the v2 API pairs an unknown barcode with a 404 and a status-0 body
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let envelope: ProductEnvelope = match serde_json::from_slice(&body) {
            Ok(env) => env,
            Err(_) if status == StatusCode::NOT_FOUND => {
                return Err(FetchError::Status(status.as_u16()))
            }
            Err(e) => return Err(FetchError::Decode(e.to_string())),
        };

        let product = envelope.into_product()?;
        debug!(found = product.is_some(), %status, "open food facts answered");
        Ok(product)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    product: Option<RawProduct>,
}

impl ProductEnvelope {
    /// `Ok(None)` for a not-found status. Any other answer must carry a product.
    pub(crate) fn into_product(self) -> Result<Option<NormalizedProduct>, FetchError> {
        let not_found = match &self.status {
            Some(Value::Number(n)) => n.as_i64() == Some(0),
            Some(Value::String(s)) => s == "0" || s == "failure",
            _ => false,
        };
        if not_found {
            return Ok(None);
        }
        match self.product {
            Some(raw) => Ok(Some(normalize(raw))),
            None => Err(FetchError::Decode("product missing from response".into())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProduct {
    product_name: Option<String>,
    brands: Option<String>,
    image_url: Option<String>,
    image_front_url: Option<String>,
    nutriments: Option<HashMap<String, Value>>,
    ingredients_text: Option<String>,
    ingredients: Option<Vec<RawIngredient>>,
    nova_group: Option<Value>,
    allergens_tags: Option<Vec<String>>,
    categories_tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIngredient {
    text: Option<String>,
    id: Option<String>,
}

fn normalize(raw: RawProduct) -> NormalizedProduct {
    let nutriments = raw.nutriments.unwrap_or_default();
    let nutrition = NutritionProfile {
        calories: nutrient(&nutriments, "energy-kcal_100g"),
        protein_g: nutrient(&nutriments, "proteins_100g"),
        carbs_g: nutrient(&nutriments, "carbohydrates_100g"),
        sugar_g: nutrient(&nutriments, "sugars_100g"),
        fiber_g: nutrient(&nutriments, "fiber_100g"),
        fat_g: nutrient(&nutriments, "fat_100g"),
        saturated_fat_g: nutrient(&nutriments, "saturated-fat_100g"),
        sodium_g: nutrient(&nutriments, "sodium_100g"),
    };

    let name = raw
        .product_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());

    let brand = raw.brands.as_deref().and_then(|b| {
        let first = b.split(',').next().unwrap_or_default().trim();
        (!first.is_empty()).then(|| first.to_string())
    });

    let ingredients = raw
        .ingredients
        .unwrap_or_default()
        .into_iter()
        .filter_map(normalize_ingredient)
        .collect();

    let allergens = raw
        .allergens_tags
        .unwrap_or_default()
        .iter()
        .map(|t| normalize_tag(t))
        .collect();

    let categories = raw
        .categories_tags
        .unwrap_or_default()
        .iter()
        .take(MAX_CATEGORIES)
        .map(|t| normalize_tag(t))
        .collect();

    let image_url = raw
        .image_url
        .filter(|u| !u.is_empty())
        .or_else(|| raw.image_front_url.filter(|u| !u.is_empty()));

    NormalizedProduct {
        name,
        brand,
        categories,
        nutrition,
        ingredients_text: raw.ingredients_text.filter(|t| !t.trim().is_empty()),
        ingredients,
        nova_group: nova_group(raw.nova_group.as_ref()),
        allergens,
        image_url,
    }
}

fn strip_lang(tag: &str) -> &str {
    match LANG_PREFIX.find(tag) {
        Some(m) => &tag[m.end()..],
        None => tag,
    }
}

fn normalize_tag(tag: &str) -> String {
    strip_lang(tag).replace('-', " ")
}

fn normalize_ingredient(raw: RawIngredient) -> Option<Ingredient> {
    let name = match (raw.text, raw.id) {
        (Some(text), _) => text.trim().to_lowercase(),
        (None, Some(id)) => strip_lang(id.trim()).to_lowercase(),
        (None, None) => return None,
    };
    (!name.is_empty()).then_some(Ingredient { name })
}

/// Reads a nutrient that may be sent as a number or a numeric string.
/// Anything else is treated as unknown.
fn nutrient(nutriments: &HashMap<String, Value>, key: &str) -> Option<Decimal> {
    match nutriments.get(key)? {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn nova_group(value: Option<&Value>) -> Option<i16> {
    let n = match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (1..=4).contains(&n).then_some(n as i16)
}
