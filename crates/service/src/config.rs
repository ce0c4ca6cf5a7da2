//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `SECRET_KEY`: token signing secret (default: `"change-me"`)
/// - `BASE_URL`: prefix of activation links (default: `"http://localhost:8000"`)
/// - `ACTIVATION_TOKEN_LIFETIME_SECS`: activation link validity (default: `86400`)
/// - `AUTH_TOKEN_LIFETIME_SECS`: auth token validity (default: `3600`)
/// - `LOCK_TIMEOUT_MS`: how long to wait for a row lock (default: `5000`)
/// - `BCRYPT_COST`: password hashing cost (default: `12`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub base_url: String,
    pub activation_token_lifetime: Duration,
    pub auth_token_lifetime: Duration,
    pub lock_timeout: Duration,
    pub bcrypt_cost: u32,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |name: &str, default: Duration| {
            lookup(name)
                .and_then(|v| v.parse().ok())
                .map_or(default, Duration::from_secs)
        };

        Self {
            secret_key: lookup("SECRET_KEY").unwrap_or(defaults.secret_key),
            base_url: lookup("BASE_URL").unwrap_or(defaults.base_url),
            activation_token_lifetime: secs(
                "ACTIVATION_TOKEN_LIFETIME_SECS",
                defaults.activation_token_lifetime,
            ),
            auth_token_lifetime: secs("AUTH_TOKEN_LIFETIME_SECS", defaults.auth_token_lifetime),
            lock_timeout: lookup("LOCK_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map_or(defaults.lock_timeout, Duration::from_millis),
            bcrypt_cost: lookup("BCRYPT_COST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bcrypt_cost),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Returns the link a user follows to activate their account.
    pub fn activation_link(&self, token: &str) -> String {
        format!(
            "{}/users/activate/{}",
            self.base_url.trim_end_matches('/'),
            token
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: "change-me".to_string(),
            base_url: "http://localhost:8000".to_string(),
            activation_token_lifetime: Duration::from_secs(86_400),
            auth_token_lifetime: Duration::from_secs(3_600),
            lock_timeout: Duration::from_millis(5_000),
            bcrypt_cost: 12,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.activation_token_lifetime, Duration::from_secs(86_400));
        assert_eq!(config.auth_token_lifetime, Duration::from_secs(3_600));
        assert_eq!(config.lock_timeout, Duration::from_millis(5_000));
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_values_are_parsed() {
        let env: HashMap<&str, &str> = [
            ("SECRET_KEY", "s3cret"),
            ("AUTH_TOKEN_LIFETIME_SECS", "60"),
            ("LOCK_TIMEOUT_MS", "250"),
            ("BCRYPT_COST", "4"),
        ]
        .into_iter()
        .collect();
        let config = Config::from_lookup(|name| env.get(name).map(ToString::to_string));

        assert_eq!(config.secret_key, "s3cret");
        assert_eq!(config.auth_token_lifetime, Duration::from_secs(60));
        assert_eq!(config.lock_timeout, Duration::from_millis(250));
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.activation_token_lifetime, Duration::from_secs(86_400));
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = Config::from_lookup(|name| (name == "BCRYPT_COST").then(|| "lots".to_string()));
        assert_eq!(config.bcrypt_cost, 12);
    }

    #[test]
    fn test_activation_link_formatting() {
        let config = Config {
            base_url: "https://wishlists.example/".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.activation_link("abc"),
            "https://wishlists.example/users/activate/abc"
        );
    }
}
