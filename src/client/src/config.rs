use std::time::Duration;

use tracing::{warn, Level};

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base: String,
    pub db_path: String,
    pub request_timeout: Duration,
    pub log_level: Level,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_base: "http://127.0.0.1:5001".to_owned(),
            db_path: "checkers_session.db".to_owned(),
            request_timeout: Duration::from_secs(10),
            log_level: Level::INFO,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults, overridden by whatever `lookup` knows about. Bad values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ClientConfig::default();
        if let Some(api_base) = lookup("CHECKERS_API_BASE") {
            config.api_base = api_base;
        }
        if let Some(db_path) = lookup("CHECKERS_DB_PATH") {
            config.db_path = db_path;
        }
        if let Some(raw) = lookup("CHECKERS_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring CHECKERS_TIMEOUT_SECS={:?}", raw),
            }
        }
        if let Some(raw) = lookup("CHECKERS_LOG") {
            match raw.parse::<Level>() {
                Ok(level) => config.log_level = level,
                Err(_) => warn!("Ignoring CHECKERS_LOG={:?}", raw),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> ClientConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_without_overrides() {
        let config = config_from(&[]);
        assert_eq!(config.api_base, "http://127.0.0.1:5001");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn overrides_apply() {
        let config = config_from(&[
            ("CHECKERS_API_BASE", "https://checkers.example.com"),
            ("CHECKERS_DB_PATH", "/tmp/session.db"),
            ("CHECKERS_TIMEOUT_SECS", "3"),
            ("CHECKERS_LOG", "debug"),
        ]);
        assert_eq!(config.api_base, "https://checkers.example.com");
        assert_eq!(config.db_path, "/tmp/session.db");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = config_from(&[("CHECKERS_TIMEOUT_SECS", "soon"), ("CHECKERS_LOG", "loud")]);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.log_level, Level::INFO);
        let config = config_from(&[("CHECKERS_TIMEOUT_SECS", "0")]);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }
}
