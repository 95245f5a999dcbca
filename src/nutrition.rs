//! Per-100g nutrition profiles and serving-size scaling.
//!
//! Every value is optional: an absent nutrient means "unknown" and is never
//! coerced to zero, neither when a product is normalized nor when it is scaled.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Decimal places kept in a scaled snapshot.
pub const SNAPSHOT_SCALE: u32 = 2;

/// Largest serving accepted for a single diary entry.
pub const MAX_SERVING_GRAMS: i64 = 10_000;

/// Snapshot columns are NUMERIC(10, 2); magnitudes at or above this do not fit.
const SNAPSHOT_LIMIT: i64 = 100_000_000;

/// Nutrition facts of a product per 100 g.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NutritionProfile {
    pub calories: Option<Decimal>,
    pub protein_g: Option<Decimal>,
    pub carbs_g: Option<Decimal>,
    pub sugar_g: Option<Decimal>,
    pub fiber_g: Option<Decimal>,
    pub fat_g: Option<Decimal>,
    pub saturated_fat_g: Option<Decimal>,
    pub sodium_g: Option<Decimal>,
}

/// Nutrition copied into a diary entry, already scaled to the serving.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NutritionSnapshot {
    pub calories: Option<Decimal>,
    pub protein_g: Option<Decimal>,
    pub carbs_g: Option<Decimal>,
    pub sugar_g: Option<Decimal>,
    pub fiber_g: Option<Decimal>,
    pub fat_g: Option<Decimal>,
}

/// A serving size in grams, in `(0, MAX_SERVING_GRAMS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServingGrams(Decimal);

impl ServingGrams {
    pub fn new(grams: Decimal) -> Option<Self> {
        let in_range = grams > Decimal::ZERO && grams <= Decimal::from(MAX_SERVING_GRAMS);
        in_range.then_some(Self(grams))
    }

    pub fn get(self) -> Decimal {
        self.0
    }
}

/// Scales a per-100g profile to `grams`.
///
/// Each field is rounded on its own to two decimal places, half-up
/// (midpoint away from zero). Absent fields stay absent, and so does a value
/// too large to be represented in a snapshot.
pub fn scale(profile: &NutritionProfile, grams: ServingGrams) -> NutritionSnapshot {
    let multiplier = grams.get() / Decimal::ONE_HUNDRED;
    let limit = Decimal::from(SNAPSHOT_LIMIT);
    let scaled = |value: Option<Decimal>| {
        value
            .and_then(|v| v.checked_mul(multiplier))
            .map(round_snapshot)
            .filter(|v| v.abs() < limit)
    };

    NutritionSnapshot {
        calories: scaled(profile.calories),
        protein_g: scaled(profile.protein_g),
        carbs_g: scaled(profile.carbs_g),
        sugar_g: scaled(profile.sugar_g),
        fiber_g: scaled(profile.fiber_g),
        fat_g: scaled(profile.fat_g),
    }
}

fn round_snapshot(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(SNAPSHOT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // pad to a fixed scale so "250" is stored and rendered as "250.00"
    rounded.rescale(SNAPSHOT_SCALE);
    rounded
}
