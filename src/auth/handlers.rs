use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::{
        dto::{SyncResponse, SyncStatus},
        services::{AuthUser, UserIdentity},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/sync", post(sync_user))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Mirrors the authenticated identity into the local `users` table.
#[instrument(skip_all)]
pub async fn sync_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<SyncResponse>, AppError> {
    let (user, created) = state.store.sync_user(&identity).await.map_err(|e| {
        error!(error = %e, user_id = %identity.id, "sync user failed");
        AppError::from(e)
    })?;

    let status = if created {
        SyncStatus::Created
    } else {
        SyncStatus::Exists
    };
    info!(user_id = %user.id, ?status, "user synced");
    Ok(Json(SyncResponse {
        status,
        user: user.into(),
    }))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(identity): AuthUser) -> Json<UserIdentity> {
    Json(identity)
}
