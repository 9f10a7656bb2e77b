//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// SQLite store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file. Missing parent directories are
    /// created on open.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Busy timeout applied to SQLite connections, in seconds.
    #[serde(default)]
    pub busy_timeout_secs: Option<u64>,
}

/// Session and cookie configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Server-side session lifetime in seconds. Unset keeps sessions alive
    /// until logout.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    /// Set the Secure attribute on the session cookie. Enable whenever the
    /// server is reached over HTTPS.
    #[serde(default)]
    pub cookie_secure: bool,
}

impl SessionConfig {
    /// Get the session lifetime as a Duration, if one is configured.
    pub fn ttl(&self) -> Option<Duration> {
        // Saturate at i64::MAX to prevent overflow wrapping to negative
        self.ttl_secs
            .map(|secs| Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)))
    }
}

/// CORS configuration.
///
/// Session cookies require credentialed CORS, and browsers reject the `*`
/// origin for credentialed requests. Origins must therefore be listed
/// explicitly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to make credentialed requests.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("grove.db")
}

fn default_cookie_name() -> String {
    "grove_session".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_secs: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_secs: None,
            cookie_secure: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// SQLite store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Session and cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

impl AppConfig {
    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses an in-tree database path; tests override it
    /// with a temp directory before opening a store.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            session: SessionConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.store.path, PathBuf::from("grove.db"));
        assert_eq!(config.session.cookie_name, "grove_session");
        assert!(config.session.ttl_secs.is_none());
        assert!(!config.session.cookie_secure);
    }

    #[test]
    fn test_session_ttl_none_by_default() {
        let config = SessionConfig::default();
        assert!(
            config.ttl().is_none(),
            "sessions should not expire unless a ttl is configured"
        );
    }

    #[test]
    fn test_session_ttl_converts_seconds() {
        let config = SessionConfig {
            ttl_secs: Some(3600),
            ..SessionConfig::default()
        };
        assert_eq!(config.ttl(), Some(Duration::hours(1)));
    }

    #[test]
    fn test_session_ttl_saturates_on_overflow() {
        let config = SessionConfig {
            ttl_secs: Some(u64::MAX),
            ..SessionConfig::default()
        };
        assert_eq!(config.ttl(), Some(Duration::seconds(i64::MAX)));
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let json = r#"{"session": {"ttl_secs": 60}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.session.ttl_secs, Some(60));
        assert_eq!(config.session.cookie_name, "grove_session");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_cors_defaults_to_local_dev_origins() {
        let config = CorsConfig::default();
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
    }
}
