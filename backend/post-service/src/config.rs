/// Configuration management for Post Service
///
/// All settings come from environment variables (a `.env` file is loaded by
/// `main` via `dotenvy` when present).
use db_pool::DbConfig as DbPoolConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis (rate limit store) configuration
    pub redis: RedisConfig,
    /// Identity provider backend API
    pub identity: IdentityConfig,
    /// Session token verification
    pub auth: AuthConfig,
    /// Write-path rate limiting
    pub rate_limit: RateLimitSettings,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Pool settings for `service_name`. `DATABASE_MAX_CONNECTIONS` sizes the
    /// pool; the remaining `DB_*` variables tune timeouts.
    pub fn pool_config(&self, service_name: &str) -> DbPoolConfig {
        let mut pool = DbPoolConfig::from_env(service_name, &self.url);
        pool.max_connections = self.max_connections;
        pool
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// Identity provider (Clerk-compatible backend API)
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL, e.g. `https://api.clerk.com/v1`
    pub api_url: String,
    /// Backend secret key sent as bearer token
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub request_timeout_ms: u64,
}

impl fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_url", &self.api_url)
            .field("secret_key", &"<redacted>")
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// Session token verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// PEM encoded RS256 public key; when absent every request is anonymous
    pub jwt_public_key_pem: Option<String>,
    /// Expected `iss` claim, if any
    pub jwt_issuer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
    pub key_prefix: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("POST_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("POST_SERVICE_PORT", 8085)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if is_production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if is_production && allowed_origins.split(',').any(|o| o.trim() == "*") {
                    return Err("CORS_ALLOWED_ORIGINS cannot contain '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/chirp".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            redis: RedisConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            identity: {
                let secret_key = std::env::var("CLERK_SECRET_KEY").unwrap_or_default();
                if is_production && secret_key.trim().is_empty() {
                    return Err("CLERK_SECRET_KEY must be set in production".to_string());
                }

                IdentityConfig {
                    api_url: std::env::var("IDENTITY_API_URL")
                        .unwrap_or_else(|_| "https://api.clerk.com/v1".to_string()),
                    secret_key,
                    request_timeout_ms: parse_env_or_default("IDENTITY_REQUEST_TIMEOUT_MS", 5_000)?,
                }
            },
            auth: AuthConfig {
                jwt_public_key_pem: non_empty_env("JWT_PUBLIC_KEY_PEM")
                    .map(|pem| pem.replace("\\n", "\n")),
                jwt_issuer: non_empty_env("JWT_ISSUER"),
            },
            rate_limit: {
                let max_requests = parse_env_or_default("RATE_LIMIT_MAX_REQUESTS", 3u32)?;
                let window_secs = parse_env_or_default("RATE_LIMIT_WINDOW_SECS", 60u64)?;
                if max_requests == 0 || window_secs == 0 {
                    return Err(
                        "RATE_LIMIT_MAX_REQUESTS and RATE_LIMIT_WINDOW_SECS must be positive"
                            .to_string(),
                    );
                }

                RateLimitSettings {
                    max_requests,
                    window_secs,
                    key_prefix: std::env::var("RATE_LIMIT_PREFIX")
                        .unwrap_or_else(|_| "@upstash/ratelimit".to_string()),
                }
            },
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
