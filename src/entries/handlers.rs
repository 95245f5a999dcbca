use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRef, Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateFoodEntryRequest, EntryFilter, FoodEntryResponse},
    services::DiaryEntryService,
};
use crate::{auth::services::AuthUser, error::AppError, state::AppState};

pub fn entry_routes() -> Router<AppState> {
    Router::new()
        .route("/food-entries", get(list_entries).post(create_entry))
        .route("/food-entries/:id", delete(delete_entry))
}

/// POST /food-entries
#[instrument(skip(state, user, body))]
pub async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: Result<Json<CreateFoodEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<FoodEntryResponse>), AppError> {
    let Json(body) = body?;
    let service = DiaryEntryService::from_ref(&state);
    let entry = service.add_entry(body, &user).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/food-entries/{}", entry.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(entry.into())))
}

/// DELETE /food-entries/:id
#[instrument(skip(state, user, id))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    DiaryEntryService::from_ref(&state)
        .delete_entry(id, &user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /food-entries?date=YYYY-MM-DD
#[instrument(skip(state, user, filter))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    filter: Result<Query<EntryFilter>, QueryRejection>,
) -> Result<Json<Vec<FoodEntryResponse>>, AppError> {
    let Query(filter) = filter?;
    let entries = DiaryEntryService::from_ref(&state)
        .list_entries(&user, filter.date)
        .await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
