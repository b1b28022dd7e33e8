use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Longest token lifetime accepted, about ten years.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("WARBLER_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("WARBLER_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = lookup("WARBLER_DB_PATH")
            .unwrap_or_else(|| "warbler.db".into())
            .into();
        let host = lookup("WARBLER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("WARBLER_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("WARBLER_PORT is not a valid port")?;
        let token_ttl_days: i64 = lookup("WARBLER_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("WARBLER_TOKEN_TTL_DAYS is not a number")?;
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            bail!("WARBLER_TOKEN_TTL_DAYS must be between 1 and {MAX_TOKEN_TTL_DAYS}");
        }

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            token_ttl_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("WARBLER_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("warbler.db"));
        assert_eq!(cfg.addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(cfg.token_ttl_days, 30);
    }

    #[test]
    fn missing_or_placeholder_secret_is_fatal() {
        assert!(config(&[]).is_err());
        assert!(config(&[("WARBLER_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("WARBLER_JWT_SECRET", "s3cret"),
            ("WARBLER_DB_PATH", "/tmp/w.db"),
            ("WARBLER_HOST", "127.0.0.1"),
            ("WARBLER_PORT", "8080"),
            ("WARBLER_TOKEN_TTL_DAYS", "7"),
        ])
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/w.db"));
        assert_eq!(cfg.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.token_ttl_days, 7);
    }

    #[test]
    fn out_of_range_token_ttl_is_rejected() {
        let ttl = |days: &str| config(&[("WARBLER_JWT_SECRET", "s3cret"), ("WARBLER_TOKEN_TTL_DAYS", days)]);

        assert!(ttl("0").is_err());
        assert!(ttl("-5").is_err());
        assert!(ttl("3651").is_err());
        assert!(ttl("9223372036854775807").is_err());
        assert_eq!(ttl("3650").unwrap().token_ttl_days, 3650);
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(config(&[("WARBLER_JWT_SECRET", "s3cret"), ("WARBLER_PORT", "http")]).is_err());
    }
}
