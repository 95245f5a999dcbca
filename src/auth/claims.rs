use serde::{Deserialize, Serialize};

/// Bearer token payload issued by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>, // display name
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}
