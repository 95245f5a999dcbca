use serde::Serialize;
use time::OffsetDateTime;

use super::repo_types::User;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Created,
    Exists,
}

/// Public part of a user record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            created_at: u.created_at,
        }
    }
}

/// Response of `POST /auth/sync`.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub status: SyncStatus,
    pub user: PublicUser,
}
