//! Server configuration from the environment

use std::path::PathBuf;

pub const DEFAULT_DB: &str = "./data/hackrbac.mdb";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG: &str = "hackrbac=info";
/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// LMDB directory (`HACKRBAC_DB`)
    pub db_path: PathBuf,
    /// Listen port (`PORT`)
    pub port: u16,
    /// Session lifetime in seconds, None = never expires (`HACKRBAC_SESSION_TTL`)
    pub session_ttl: Option<u64>,
    /// tracing filter directive (`RUST_LOG`)
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: DEFAULT_DB.into(),
            port: DEFAULT_PORT,
            session_ttl: None,
            log_filter: DEFAULT_LOG.into(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let d = ServerConfig::default();
        ServerConfig {
            db_path: get("HACKRBAC_DB").map(PathBuf::from).unwrap_or(d.db_path),
            port: get("PORT").and_then(|p| p.parse().ok()).unwrap_or(d.port),
            session_ttl: get("HACKRBAC_SESSION_TTL")
                .and_then(|t| t.parse::<u64>().ok())
                .filter(|t| *t > 0)
                .map(|t| t.min(MAX_SESSION_TTL)),
            log_filter: get("RUST_LOG").filter(|f| !f.is_empty()).unwrap_or(d.log_filter),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let c = ServerConfig::from_lookup(|_| None);
        assert_eq!(c, ServerConfig::default());
        assert_eq!(c.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let env: HashMap<&str, &str> = [
            ("HACKRBAC_DB", "/tmp/x"),
            ("PORT", "not-a-port"),
            ("HACKRBAC_SESSION_TTL", "3600"),
        ]
        .into();
        let c = ServerConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.db_path, PathBuf::from("/tmp/x"));
        assert_eq!(c.port, DEFAULT_PORT);
        assert_eq!(c.session_ttl, Some(3600));
        assert_eq!(c.log_filter, DEFAULT_LOG);
    }

    #[test]
    fn session_ttl_is_clamped() {
        let huge = u64::MAX.to_string();
        let c = ServerConfig::from_lookup(|k| (k == "HACKRBAC_SESSION_TTL").then(|| huge.clone()));
        assert_eq!(c.session_ttl, Some(MAX_SESSION_TTL));
        let c = ServerConfig::from_lookup(|k| (k == "HACKRBAC_SESSION_TTL").then(|| "0".to_string()));
        assert_eq!(c.session_ttl, None);
    }
}
