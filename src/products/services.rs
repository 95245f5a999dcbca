use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, instrument, warn};

use super::repo_types::{NewProduct, Product};
use crate::{
    error::AppError,
    external::FoodSource,
    state::AppState,
    store::{Store, StoreError},
};

/// Barcodes are stored as VARCHAR(50).
pub const MAX_BARCODE_LEN: usize = 50;

/// Trims a client-supplied barcode and checks it fits the product key.
pub fn normalize_barcode(raw: &str) -> Result<String, AppError> {
    let barcode = raw.trim();
    if barcode.is_empty() {
        return Err(AppError::invalid("barcode must not be empty"));
    }
    if barcode.chars().count() > MAX_BARCODE_LEN {
        return Err(AppError::invalid("barcode is too long"));
    }
    Ok(barcode.to_string())
}

/// Read-through cache over the product table.
///
/// A stored product is authoritative and is never re-fetched. On a miss the
/// external source is asked once; whatever it cannot deliver is reported as
/// "not found".
#[derive(Clone)]
pub struct ProductResolver {
    store: Arc<dyn Store>,
    source: Arc<dyn FoodSource>,
}

impl FromRef<AppState> for ProductResolver {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone(), state.food_source.clone())
    }
}

impl ProductResolver {
    pub fn new(store: Arc<dyn Store>, source: Arc<dyn FoodSource>) -> Self {
        Self { store, source }
    }

    /// Returns the product for `barcode`, or `None` if neither the store nor
    /// the external source knows it.
    #[instrument(skip(self))]
    pub async fn resolve(&self, barcode: &str) -> Result<Option<Product>, AppError> {
        if let Some(product) = self.store.find_product_by_barcode(barcode).await? {
            info!("product found in store");
            return Ok(Some(product));
        }

        info!(source = self.source.name(), "fetching product from external source");
        let normalized = match self.source.fetch(barcode).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                warn!("product unknown to external source");
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "external fetch failed; treating as not found");
                return Ok(None);
            }
        };

        let new_product = NewProduct::from_normalized(barcode, self.source.name(), normalized);
        match self.store.insert_product(new_product).await {
            Ok(product) => {
                info!("product saved to store");
                Ok(Some(product))
            }
            Err(StoreError::Conflict) => {
                // a concurrent resolver inserted it first
                info!("lost insert race; re-reading product");
                Ok(self.store.find_product_by_barcode(barcode).await?)
            }
            Err(e) => Err(e.into()),
        }
    }
}
