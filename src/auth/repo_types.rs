use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database, mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: String,                   // identity provider UID
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,   // bumped on every sync
}

#[derive(Debug, FromRow)]
pub(crate) struct SyncedUser {
    #[sqlx(flatten)]
    pub user: User,
    pub inserted: bool,
}
