use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct FoodSourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub auth: AuthConfig,
    pub food_source: FoodSourceConfig,
}

impl Default for FoodSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://world.openfoodfacts.org/api/v2".into(),
            timeout_secs: 10,
            user_agent: concat!("cleaneats/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let auth = AuthConfig {
            secret: std::env::var("AUTH_JWT_SECRET").context("AUTH_JWT_SECRET is not set")?,
            issuer: std::env::var("AUTH_JWT_ISSUER").unwrap_or_else(|_| "cleaneats".into()),
            audience: std::env::var("AUTH_JWT_AUDIENCE")
                .unwrap_or_else(|_| "cleaneats-users".into()),
        };

        let defaults = FoodSourceConfig::default();
        let food_source = FoodSourceConfig {
            base_url: std::env::var("OPEN_FOOD_FACTS_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            timeout_secs: std::env::var("OPEN_FOOD_FACTS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.timeout_secs),
            user_agent: std::env::var("OPEN_FOOD_FACTS_USER_AGENT")
                .unwrap_or(defaults.user_agent),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            auth,
            food_source,
        })
    }
}
