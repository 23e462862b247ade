/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, JWT 設定, CORS 許可など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// HS256 secrets shorter than the hash output are rejected at startup.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Credentials for the admin account ensured at startup.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // None -> in-memory user store (development only)
    pub database_url: Option<String>,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_ttl_seconds: u64,
    pub jwt_leeway_seconds: u64,

    pub principal_lookup_timeout: Duration,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,

    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the signing secret or the database credentials
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_ttl_seconds", &self.jwt_ttl_seconds)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("principal_lookup_timeout", &self.principal_lookup_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("request_body_limit_bytes", &self.request_body_limit_bytes)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// `from_env` is the production entry point; tests feed a map instead of
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8081,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let database_url = lookup("DATABASE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if database_url.is_none() && app_env.is_production() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let jwt_issuer = lookup("JWT_ISSUER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "qa-user-service".to_string());

        let jwt_ttl_seconds = parse_or(&lookup, "JWT_TTL_SECONDS", 86_400)?; // 24h
        if jwt_ttl_seconds == 0 {
            return Err(ConfigError::Invalid("JWT_TTL_SECONDS"));
        }
        let jwt_leeway_seconds = parse_or(&lookup, "JWT_LEEWAY_SECONDS", 0)?;

        let principal_lookup_timeout_ms = parse_or(&lookup, "PRINCIPAL_LOOKUP_TIMEOUT_MS", 2_000)?;
        if principal_lookup_timeout_ms == 0 {
            return Err(ConfigError::Invalid("PRINCIPAL_LOOKUP_TIMEOUT_MS"));
        }
        let principal_lookup_timeout = Duration::from_millis(principal_lookup_timeout_ms);

        let request_timeout =
            Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?);
        let request_body_limit_bytes =
            parse_or(&lookup, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)? as usize;

        let bootstrap_admin = match (
            lookup("BOOTSTRAP_ADMIN_USERNAME"),
            lookup("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_USERNAME")),
        };

        Ok(Self {
            addr,
            app_env,
            database_url,
            cors_allowed_origins,
            jwt_secret,
            jwt_issuer,
            jwt_ttl_seconds,
            jwt_leeway_seconds,
            principal_lookup_timeout,
            request_timeout,
            request_body_limit_bytes,
            bootstrap_admin,
        })
    }
}

fn parse_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = config_from(&[("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.addr.port(), 8081);
        assert_eq!(config.app_env, AppEnv::Development);
        assert!(config.database_url.is_none());
        assert_eq!(config.jwt_issuer, "qa-user-service");
        assert_eq!(config.jwt_ttl_seconds, 86_400);
        assert_eq!(config.jwt_leeway_seconds, 0);
        assert_eq!(config.principal_lookup_timeout, Duration::from_secs(2));
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn missing_or_short_secret_fails_startup() {
        assert_eq!(
            config_from(&[]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
        assert_eq!(
            config_from(&[("JWT_SECRET", "too-short")]).unwrap_err(),
            ConfigError::Invalid("JWT_SECRET")
        );
    }

    #[test]
    fn production_requires_database_url() {
        let err = config_from(&[("JWT_SECRET", SECRET), ("APP_ENV", "prod")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let config = config_from(&[
            ("JWT_SECRET", SECRET),
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://localhost/qa"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ])
        .unwrap();
        assert!(config.app_env.is_production());
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn invalid_numbers_are_reported_by_key() {
        let err = config_from(&[("JWT_SECRET", SECRET), ("JWT_TTL_SECONDS", "soon")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("JWT_TTL_SECONDS"));

        let err = config_from(&[("JWT_SECRET", SECRET), ("PORT", "70000")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("PORT"));
    }

    #[test]
    fn zero_durations_are_rejected() {
        let err = config_from(&[("JWT_SECRET", SECRET), ("JWT_TTL_SECONDS", "0")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid("JWT_TTL_SECONDS"));

        let err = config_from(&[("JWT_SECRET", SECRET), ("PRINCIPAL_LOOKUP_TIMEOUT_MS", "0")])
            .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("PRINCIPAL_LOOKUP_TIMEOUT_MS"));
    }

    #[test]
    fn bootstrap_admin_needs_both_halves() {
        let err = config_from(&[("JWT_SECRET", SECRET), ("BOOTSTRAP_ADMIN_USERNAME", "root")])
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD"));

        let config = config_from(&[
            ("JWT_SECRET", SECRET),
            ("BOOTSTRAP_ADMIN_USERNAME", "root"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "hunter22"),
        ])
        .unwrap();
        let admin = config.bootstrap_admin.unwrap();
        assert_eq!(admin.username, "root");
        assert!(!format!("{admin:?}").contains("hunter22"));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = config_from(&[("JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{config:?}").contains(SECRET));
    }
}
