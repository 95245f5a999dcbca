use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{auth::claims::Claims, config::AuthConfig, error::AppError, state::AppState};

/// Verified identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token verification failed: {0}")]
    Verification(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken(msg) => AppError::Unauthorized(msg),
            AuthError::Verification(msg) => AppError::Internal(msg),
        }
    }
}

/// Holds the verification key with issuer/audience expectations.
#[derive(Clone)]
pub struct IdentityKeys {
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl IdentityKeys {
    pub fn new(cfg: &AuthConfig) -> Self {
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }

    /// Decodes a bearer token into the caller's identity.
    ///
    /// Bad, expired or foreign tokens are [`AuthError::InvalidToken`]; a key
    /// or crypto failure on our side is [`AuthError::Verification`].
    pub fn verify(&self, token: &str) -> Result<UserIdentity, AuthError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidKeyFormat
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::InvalidEcdsaKey
                | ErrorKind::Crypto(_) => AuthError::Verification(e.to_string()),
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }
        debug!(user_id = %claims.sub, "token verified");
        Ok(UserIdentity {
            id: claims.sub,
            email: claims.email,
            display_name: claims.name,
        })
    }
}

impl FromRef<AppState> for IdentityKeys {
    fn from_ref(state: &AppState) -> Self {
        IdentityKeys::new(&state.config.auth)
    }
}

/// Extracts and verifies the bearer token, yielding the caller's identity.
pub struct AuthUser(pub UserIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    IdentityKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = IdentityKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("invalid auth scheme".into()))?;

        match keys.verify(token.trim()) {
            Ok(identity) => Ok(AuthUser(identity)),
            Err(e @ AuthError::InvalidToken(_)) => {
                warn!(error = %e, "rejected bearer token");
                Err(e.into())
            }
            Err(e) => {
                error!(error = %e, "token verification error");
                Err(e.into())
            }
        }
    }
}
