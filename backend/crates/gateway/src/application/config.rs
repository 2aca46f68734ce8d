//! Gateway Configuration
//!
//! Immutable configuration built once at process start and handed to the
//! pipeline constructors. Nothing in the pipeline reads the environment.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::rate_limit::RateLimitConfig;
use thiserror::Error;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;
/// Body limit for JSON and URL-encoded payloads (10 KB)
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024;
/// Session lifetime measured from issuance
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 3600);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime mode, selected by `NODE_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Only the exact value `production` selects production mode
    pub fn from_node_env(value: Option<&str>) -> Self {
        match value {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Cookie signing and session secret
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Per-process random secret; sessions do not survive a restart
    pub fn random() -> Self {
        Self(platform::crypto::random_bytes(32))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Session cookie settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl: Duration,
    pub same_site: SameSite,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sid".to_string(),
            ttl: DEFAULT_SESSION_TTL,
            same_site: SameSite::Lax,
        }
    }
}

impl SessionConfig {
    pub fn ttl_ms(&self) -> i64 {
        self.ttl.as_millis() as i64
    }
}

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SECRET_KEY must be set when NODE_ENV=production")]
    MissingSecret,

    #[error("{var} has invalid value {value:?}: expected {expected}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Complete gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub environment: Environment,
    /// Origins allowed to make credentialed cross-origin requests
    pub allowed_origins: Vec<String>,
    pub secret_key: SecretKey,
    pub body_limit_bytes: usize,
    pub request_timeout: Duration,
    pub session: SessionConfig,
    /// Global per-client limit; `None` disables the stage
    pub rate_limit: Option<RateLimitConfig>,
    /// Stricter limit on the user router; `None` disables the stage
    pub auth_rate_limit: Option<RateLimitConfig>,
    /// Behind a trusted reverse proxy: rate limits key on forwarded headers
    pub trust_proxy: bool,
    pub sanitize_input: bool,
    pub compression: bool,
    pub security_headers: bool,
}

impl GatewayConfig {
    /// Local development defaults: random secret, every optional stage on
    pub fn development() -> Self {
        Self {
            port: DEFAULT_PORT,
            environment: Environment::Development,
            allowed_origins: Vec::new(),
            secret_key: SecretKey::random(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session: SessionConfig::default(),
            rate_limit: Some(global_rate_limit()),
            auth_rate_limit: Some(auth_rate_limit()),
            trust_proxy: false,
            sanitize_input: true,
            compression: true,
            security_headers: true,
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = Environment::from_node_env(get("NODE_ENV").as_deref());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value: raw,
                expected: "a TCP port number",
            })?,
            None => DEFAULT_PORT,
        };

        let allowed_origins = get("FRONTEND_URL")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();
        if allowed_origins.is_empty() {
            tracing::warn!("FRONTEND_URL is not set; every browser origin will be rejected");
        }

        let secret_key = match get("SECRET_KEY") {
            Some(secret) => SecretKey::new(secret.into_bytes()),
            None if environment.is_production() => return Err(ConfigError::MissingSecret),
            None => {
                tracing::warn!("SECRET_KEY is not set; using a random per-process secret");
                SecretKey::random()
            }
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "REQUEST_TIMEOUT_SECS",
                        value: raw,
                        expected: "a positive number of seconds",
                    });
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let rate_limits_on = parse_flag("RATE_LIMIT_ENABLED", get("RATE_LIMIT_ENABLED"), true)?;

        Ok(Self {
            port,
            environment,
            allowed_origins,
            secret_key,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            request_timeout,
            session: SessionConfig::default(),
            rate_limit: rate_limits_on.then(global_rate_limit),
            auth_rate_limit: rate_limits_on.then(auth_rate_limit),
            trust_proxy: parse_flag("TRUST_PROXY", get("TRUST_PROXY"), false)?,
            sanitize_input: parse_flag("SANITIZE_INPUT", get("SANITIZE_INPUT"), true)?,
            compression: parse_flag("COMPRESSION_ENABLED", get("COMPRESSION_ENABLED"), true)?,
            security_headers: parse_flag(
                "SECURITY_HEADERS_ENABLED",
                get("SECURITY_HEADERS_ENABLED"),
                true,
            )?,
        })
    }

    /// Whether failure messages may reach clients verbatim
    pub fn expose_error_detail(&self) -> bool {
        !self.environment.is_production()
    }

    /// Session cookie attributes; `Secure` only in production
    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.session.cookie_name.clone(),
            secure: self.environment.is_production(),
            http_only: true,
            same_site: self.session.same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.session.ttl.as_secs() as i64),
        }
    }
}

/// 100 requests per 10 minutes per client
pub fn global_rate_limit() -> RateLimitConfig {
    RateLimitConfig::new(
        100,
        10 * 60,
        "Too many requests from this IP, please try again later.",
    )
}

/// 30 requests per 15 minutes per client on the user router
pub fn auth_rate_limit() -> RateLimitConfig {
    RateLimitConfig::new(
        30,
        15 * 60,
        "Too many auth attempts, please try again after 15 minutes.",
    )
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(str::to_string)
        .collect()
}

fn parse_flag(var: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: raw,
            expected: "true or false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.allowed_origins.is_empty());
        assert_eq!(config.body_limit_bytes, 10 * 1024);
        assert_eq!(config.session.ttl, Duration::from_secs(86_400));
        assert!(config.rate_limit.is_some());
        assert!(!config.trust_proxy);
        assert!(config.expose_error_detail());
    }

    #[test]
    fn test_production_mode_requires_exact_value() {
        let config = load(&[("NODE_ENV", "production"), ("SECRET_KEY", "s3cret")]).unwrap();
        assert!(config.environment.is_production());
        assert!(!config.expose_error_detail());

        let config = load(&[("NODE_ENV", "Production")]).unwrap();
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_production_requires_secret() {
        let err = load(&[("NODE_ENV", "production")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret));
    }

    #[test]
    fn test_frontend_url_and_port() {
        let config = load(&[
            ("PORT", "8080"),
            ("FRONTEND_URL", "https://app.example/, https://admin.example"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.example", "https://admin.example"]
        );
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue { var: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("RATE_LIMIT_ENABLED", "maybe")]),
            Err(ConfigError::InvalidValue {
                var: "RATE_LIMIT_ENABLED",
                ..
            })
        ));
        assert!(load(&[("REQUEST_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn test_toggles() {
        let config = load(&[
            ("RATE_LIMIT_ENABLED", "false"),
            ("COMPRESSION_ENABLED", "off"),
            ("SANITIZE_INPUT", "0"),
            ("TRUST_PROXY", "true"),
        ])
        .unwrap();
        assert!(config.rate_limit.is_none());
        assert!(config.auth_rate_limit.is_none());
        assert!(!config.compression);
        assert!(!config.sanitize_input);
        assert!(config.trust_proxy);
        assert!(config.security_headers);
    }

    #[test]
    fn test_session_cookie_secure_follows_environment() {
        let mut config = GatewayConfig::development();
        let cookie = config.session_cookie();
        assert!(cookie.http_only);
        assert!(!cookie.secure);
        assert_eq!(cookie.max_age_secs, Some(86_400));

        config.environment = Environment::Production;
        assert!(config.session_cookie().secure);
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SecretKey::new(b"hunter2".to_vec());
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
