use std::sync::Arc;

use axum::extract::FromRef;
use time::{Date, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use super::dto::CreateFoodEntryRequest;
use super::repo_types::{FoodEntry, NewFoodEntry};
use crate::{
    auth::services::UserIdentity,
    error::AppError,
    nutrition::{self, ServingGrams, MAX_SERVING_GRAMS},
    products::services::{normalize_barcode, ProductResolver},
    state::AppState,
    store::{Store, StoreError},
};

const MAX_MEAL_TYPE_LEN: usize = 20;

/// Food diary operations, always scoped to the calling user.
#[derive(Clone)]
pub struct DiaryEntryService {
    store: Arc<dyn Store>,
    resolver: ProductResolver,
}

impl FromRef<AppState> for DiaryEntryService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), ProductResolver::from_ref(state))
    }
}

struct ValidEntry {
    barcode: String,
    grams: ServingGrams,
    meal_type: Option<String>,
    notes: Option<String>,
    entry_date: Option<Date>,
}

fn validate(req: CreateFoodEntryRequest) -> Result<ValidEntry, AppError> {
    let barcode = normalize_barcode(&req.barcode)?;

    let grams = ServingGrams::new(req.serving_grams).ok_or_else(|| {
        AppError::invalid(format!(
            "servingGrams must be greater than zero and at most {MAX_SERVING_GRAMS}"
        ))
    })?;

    let meal_type = req
        .meal_type
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty());
    if meal_type.as_ref().is_some_and(|m| m.len() > MAX_MEAL_TYPE_LEN) {
        return Err(AppError::invalid("mealType is too long"));
    }

    let notes = req
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(ValidEntry {
        barcode,
        grams,
        meal_type,
        notes,
        entry_date: req.entry_date,
    })
}

impl DiaryEntryService {
    pub fn new(store: Arc<dyn Store>, resolver: ProductResolver) -> Self {
        Self { store, resolver }
    }

    /// Logs a serving of the product behind `req.barcode`.
    ///
    /// The nutrition snapshot is computed once here and stored with the
    /// entry; later product changes do not touch it.
    #[instrument(skip(self, req, user), fields(user_id = %user.id))]
    pub async fn add_entry(
        &self,
        req: CreateFoodEntryRequest,
        user: &UserIdentity,
    ) -> Result<FoodEntry, AppError> {
        let entry = validate(req)?;

        let product = self
            .resolver
            .resolve(&entry.barcode)
            .await?
            .ok_or_else(|| {
                warn!(barcode = %entry.barcode, "product not found");
                AppError::ProductNotFound(entry.barcode.clone())
            })?;

        let snapshot = nutrition::scale(&product.nutrition, entry.grams);
        let now = OffsetDateTime::now_utc();
        let new_entry = NewFoodEntry {
            user_id: user.id.clone(),
            barcode: product.barcode,
            entry_date: entry.entry_date.unwrap_or_else(|| now.date()),
            meal_type: entry.meal_type,
            servings_grams: entry.grams.get(),
            nutrition: snapshot,
            custom_food_name: None,
            notes: entry.notes,
            created_at: now,
        };

        let saved = self.store.insert_entry(new_entry).await.map_err(|e| {
            error!(error = %e, "insert food entry failed");
            AppError::from(e)
        })?;
        info!(entry_id = saved.id, barcode = %saved.barcode, "food entry created");
        Ok(saved)
    }

    /// Deletes one of the user's entries. A missing id and someone else's
    /// id look the same to the caller.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete_entry(&self, entry_id: i64, user: &UserIdentity) -> Result<(), AppError> {
        let Some(entry) = self.store.find_entry(entry_id, &user.id).await? else {
            warn!("food entry not found for user");
            return Err(AppError::NotFoundOrForbidden);
        };

        match self.store.delete_entry(&entry).await {
            Ok(()) => {
                info!("food entry deleted");
                Ok(())
            }
            Err(StoreError::Missing) => Err(AppError::NotFoundOrForbidden),
            Err(e) => {
                error!(error = %e, "delete food entry failed");
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list_entries(
        &self,
        user: &UserIdentity,
        date: Option<Date>,
    ) -> Result<Vec<FoodEntry>, AppError> {
        Ok(self.store.list_entries(&user.id, date).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use time::macros::date;

    use super::*;
    use crate::external::testing::{cookies, ScriptedFoodSource};
    use crate::products::repo_types::NewProduct;
    use crate::store::memory::MemoryStore;

    const COOKIES: &str = "737628064502";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn user(id: &str) -> UserIdentity {
        UserIdentity {
            id: id.into(),
            email: Some(format!("{id}@example.com")),
            display_name: None,
        }
    }

    fn request(barcode: &str, grams: &str) -> CreateFoodEntryRequest {
        CreateFoodEntryRequest {
            barcode: barcode.into(),
            serving_grams: dec(grams),
            meal_type: None,
            notes: None,
            entry_date: None,
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        source: Arc<ScriptedFoodSource>,
        service: DiaryEntryService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(ScriptedFoodSource::default().with(COOKIES, cookies()));
        let resolver = ProductResolver::new(store.clone(), source.clone());
        let service = DiaryEntryService::new(store.clone(), resolver);
        Fixture {
            store,
            source,
            service,
        }
    }

    #[tokio::test]
    async fn add_entry_fetches_scales_and_persists() {
        let f = fixture();
        let mut req = request(COOKIES, "50");
        req.meal_type = Some(" Snack ".into());
        req.notes = Some("after lunch".into());

        let entry = f.service.add_entry(req, &user("u1")).await.unwrap();

        assert_eq!(entry.user_id, "u1");
        assert_eq!(entry.barcode, COOKIES);
        assert_eq!(entry.servings_grams, dec("50"));
        assert_eq!(entry.nutrition.calories, Some(dec("250.00")));
        assert_eq!(entry.nutrition.protein_g, Some(dec("2.50")));
        assert_eq!(entry.nutrition.carbs_g, None);
        assert_eq!(entry.meal_type.as_deref(), Some("snack"));
        assert_eq!(entry.notes.as_deref(), Some("after lunch"));
        assert_eq!(entry.custom_food_name, None);
        assert_eq!(entry.entry_date, entry.created_at.date());
        assert_eq!(f.store.entries(), vec![entry]);
        assert_eq!(f.source.calls(), 1);
    }

    #[tokio::test]
    async fn second_entry_reuses_stored_product() {
        let f = fixture();
        f.service.add_entry(request(COOKIES, "50"), &user("u1")).await.unwrap();
        f.service.add_entry(request(COOKIES, "20"), &user("u2")).await.unwrap();

        assert_eq!(f.source.calls(), 1);
        assert_eq!(f.store.product_count(), 1);
        assert_eq!(f.store.entries().len(), 2);
    }

    #[tokio::test]
    async fn non_positive_serving_is_rejected_before_io() {
        let f = fixture();
        for grams in ["0", "-5"] {
            let err = f
                .service
                .add_entry(request(COOKIES, grams), &user("u1"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)));
        }
        assert_eq!(f.store.calls(), 0);
        assert_eq!(f.source.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_serving_is_rejected_before_io() {
        let f = fixture();
        for grams in ["10000.01", "79228162514264337593543950335"] {
            let err = f
                .service
                .add_entry(request(COOKIES, grams), &user("u1"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)));
        }
        assert_eq!(f.store.calls(), 0);
        assert_eq!(f.source.calls(), 0);
    }

    #[tokio::test]
    async fn largest_serving_is_accepted() {
        let f = fixture();
        let entry = f
            .service
            .add_entry(request(COOKIES, "10000"), &user("u1"))
            .await
            .unwrap();
        assert_eq!(entry.nutrition.calories, Some(dec("50000.00")));
    }

    #[tokio::test]
    async fn blank_barcode_is_rejected_before_io() {
        let f = fixture();
        let err = f
            .service
            .add_entry(request("   ", "50"), &user("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(f.store.calls(), 0);
    }

    #[tokio::test]
    async fn overlong_meal_type_is_rejected() {
        let f = fixture();
        let mut req = request(COOKIES, "50");
        req.meal_type = Some("x".repeat(21));
        let err = f.service.add_entry(req, &user("u1")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unknown_product_creates_no_entry() {
        let f = fixture();
        let err = f
            .service
            .add_entry(request("4006381333931", "50"), &user("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProductNotFound(ref b) if b == "4006381333931"));
        assert!(f.store.entries().is_empty());
        assert_eq!(f.store.product_count(), 0);
    }

    #[tokio::test]
    async fn failed_insert_surfaces_persistence_error() {
        let f = fixture();
        f.store
            .seed_product(NewProduct::from_normalized(COOKIES, "seed", cookies()));
        f.store.fail_writes();

        let err = f
            .service
            .add_entry(request(COOKIES, "50"), &user("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert!(f.store.entries().is_empty());
        assert_eq!(f.source.calls(), 0);
    }

    #[tokio::test]
    async fn snapshot_ignores_later_product_changes() {
        let f = fixture();
        let entry = f.service.add_entry(request(COOKIES, "50"), &user("u1")).await.unwrap();

        let mut changed = NewProduct::from_normalized(COOKIES, "seed", cookies());
        changed.nutrition.calories = Some(dec("900"));
        f.store.seed_product(changed);

        let listed = f.service.list_entries(&user("u1"), None).await.unwrap();
        assert_eq!(listed[0].nutrition.calories, Some(dec("250.00")));
        assert_eq!(listed[0], entry);
    }

    #[tokio::test]
    async fn delete_someone_elses_entry_is_not_found() {
        let f = fixture();
        let entry = f.service.add_entry(request(COOKIES, "50"), &user("u2")).await.unwrap();

        let err = f.service.delete_entry(entry.id, &user("u1")).await.unwrap_err();

        assert!(matches!(err, AppError::NotFoundOrForbidden));
        assert_eq!(f.store.entries(), vec![entry]);
    }

    #[tokio::test]
    async fn delete_missing_entry_is_not_found() {
        let f = fixture();
        let err = f.service.delete_entry(7, &user("u1")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFoundOrForbidden));
    }

    #[tokio::test]
    async fn delete_own_entry() {
        let f = fixture();
        let entry = f.service.add_entry(request(COOKIES, "50"), &user("u1")).await.unwrap();

        f.service.delete_entry(entry.id, &user("u1")).await.unwrap();

        assert!(f.store.entries().is_empty());
        let again = f.service.delete_entry(entry.id, &user("u1")).await.unwrap_err();
        assert!(matches!(again, AppError::NotFoundOrForbidden));
    }

    #[tokio::test]
    async fn list_is_scoped_to_user_and_date() {
        let f = fixture();
        let mut dated = request(COOKIES, "10");
        dated.entry_date = Some(date!(2025 - 01 - 02));
        f.service.add_entry(dated, &user("u1")).await.unwrap();
        f.service.add_entry(request(COOKIES, "20"), &user("u1")).await.unwrap();
        f.service.add_entry(request(COOKIES, "30"), &user("u2")).await.unwrap();

        let all = f.service.list_entries(&user("u1"), None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|e| e.user_id == "u1"));

        let day = f
            .service
            .list_entries(&user("u1"), Some(date!(2025 - 01 - 02)))
            .await
            .unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].servings_grams, dec("10"));
    }
}
