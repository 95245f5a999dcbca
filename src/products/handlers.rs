use axum::{
    extract::{FromRef, Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{dto::ProductResponse, services::{normalize_barcode, ProductResolver}};
use crate::{auth::services::AuthUser, error::AppError, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/products/:barcode", get(get_product))
}

/// GET /products/:barcode, resolved through the store and, on a miss,
/// the external food source.
#[instrument(skip(state, _user))]
pub async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(barcode): Path<String>,
) -> Result<Json<ProductResponse>, AppError> {
    let barcode = normalize_barcode(&barcode)?;

    let resolver = ProductResolver::from_ref(&state);
    let product = resolver
        .resolve(&barcode)
        .await?
        .ok_or(AppError::ProductNotFound(barcode))?;
    Ok(Json(product.into()))
}
