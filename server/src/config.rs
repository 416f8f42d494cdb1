use anyhow::{Context, Result, anyhow};
use platform_authn::AuthConfig;

const DEFAULT_SESSION_TTL_MINUTES: i64 = 60 * 24;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let jwt_secret = env_required("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err(anyhow!("JWT_SECRET must not be empty"));
        }

        let session_ttl_minutes = match std::env::var("SESSION_TTL_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("invalid SESSION_TTL_MINUTES {raw:?}"))?,
            Err(_) => DEFAULT_SESSION_TTL_MINUTES,
        };

        let cors_allowed_origins = parse_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into()),
        );

        Ok(Self {
            auth: AuthConfig {
                jwt_secret,
                session_ttl_minutes,
            },
            cors_allowed_origins,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn env_required(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing env {}", key))
}
