//! Server configuration.

use anyhow::{Context, bail};

use tutor_llm::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your-secret-key",
];

/// Server configuration, read once at startup and handed to the router.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    /// LLM routes answer 500 while this is unset.
    pub mistral_api_key: Option<String>,
    pub mistral_model: String,
    pub mistral_base_url: String,
    /// Origin allowed by CORS.
    pub frontend_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("TUTOR_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("TUTOR_JWT_SECRET is unset or still a placeholder");
        }

        let port = var("TUTOR_PORT", "5000")
            .parse()
            .context("TUTOR_PORT must be a port number")?;
        let jwt_ttl_days = var("TUTOR_JWT_TTL_DAYS", "7")
            .parse()
            .context("TUTOR_JWT_TTL_DAYS must be a whole number of days")?;

        Ok(Self {
            host: var("TUTOR_HOST", "0.0.0.0"),
            port,
            db_path: var("TUTOR_DB_PATH", "tutor.db"),
            jwt_secret,
            jwt_ttl_days,
            mistral_api_key: lookup("MISTRAL_API_KEY").filter(|k| !k.is_empty()),
            mistral_model: var("MISTRAL_MODEL", DEFAULT_MODEL),
            mistral_base_url: var("MISTRAL_BASE_URL", DEFAULT_BASE_URL),
            frontend_url: var("TUTOR_FRONTEND_URL", "http://localhost:5173"),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup(&[("TUTOR_JWT_SECRET", "s3cret-value")])).unwrap();
        assert_eq!(config.server_addr(), "0.0.0.0:5000");
        assert_eq!(config.db_path, "tutor.db");
        assert_eq!(config.jwt_ttl_days, 7);
        assert_eq!(config.mistral_model, "mistral-medium");
        assert!(config.mistral_api_key.is_none());
    }

    #[test]
    fn missing_or_placeholder_secret_is_rejected() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("TUTOR_JWT_SECRET", "dev-secret-change-me")])).is_err());
    }

    #[test]
    fn bad_port_is_an_error() {
        let result = Config::from_lookup(lookup(&[
            ("TUTOR_JWT_SECRET", "s3cret-value"),
            ("TUTOR_PORT", "eighty"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn empty_api_key_counts_as_unset() {
        let config = Config::from_lookup(lookup(&[
            ("TUTOR_JWT_SECRET", "s3cret-value"),
            ("MISTRAL_API_KEY", ""),
        ]))
        .unwrap();
        assert!(config.mistral_api_key.is_none());
    }
}
