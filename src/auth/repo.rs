use sqlx::{Postgres, Transaction};

use super::repo_types::{SyncedUser, User};
use super::services::UserIdentity;
use crate::store::StoreError;

/// Create the user on first sight, otherwise refresh its profile and
/// `updated_at`. Returns the row and whether it was created.
pub async fn sync_tx(
    tx: &mut Transaction<'_, Postgres>,
    identity: &UserIdentity,
) -> Result<(User, bool), StoreError> {
    let row = sqlx::query_as::<_, SyncedUser>(
        r#"
        INSERT INTO users (id, email, display_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE
            SET email        = COALESCE(EXCLUDED.email, users.email),
                display_name = COALESCE(EXCLUDED.display_name, users.display_name),
                updated_at   = now()
        RETURNING id, email, display_name, created_at, updated_at,
                  (xmax = 0) AS inserted
        "#,
    )
    .bind(&identity.id)
    .bind(&identity.email)
    .bind(&identity.display_name)
    .fetch_one(&mut **tx)
    .await
    .map_err(StoreError::from_insert)?;
    Ok((row.user, row.inserted))
}
