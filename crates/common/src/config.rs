use std::fmt;

/// Where the `SubNotify` table lives.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// A full `postgres://` connection string
    Url(String),
    /// Individual connection parameters
    Parts {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseConfig::Url(_) => f.debug_tuple("Url").field(&"<redacted>").finish(),
            DatabaseConfig::Parts {
                host,
                port,
                user,
                database,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"<redacted>")
                .field("database", database)
                .finish(),
        }
    }
}

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Store location (DATABASE_URL, or DB_HOST / DB_USER / DB_PASSWORD)
    pub database: DatabaseConfig,

    /// Maximum number of PostgreSQL connections (default: 1, the dispatcher polls sequentially)
    pub db_max_connections: u32,

    /// Seconds between two polls of the store (default: 300)
    pub poll_interval_secs: u64,

    /// How far ahead of now a poll claims events, in seconds (default: 600)
    pub lookahead_secs: i64,

    /// How long to wait for in-flight deliveries on shutdown (default: 0 = abandon them)
    pub shutdown_grace_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                anyhow::anyhow!("{key} environment variable is required when DATABASE_URL is not set")
            })
        };

        let database = match lookup("DATABASE_URL") {
            Some(url) => DatabaseConfig::Url(url),
            None => DatabaseConfig::Parts {
                host: required("DB_HOST")?,
                port: lookup("DB_PORT")
                    .unwrap_or_else(|| "5432".to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("DB_PORT must be a valid u16"))?,
                user: required("DB_USER")?,
                password: required("DB_PASSWORD")?,
                database: lookup("DB_NAME").unwrap_or_else(|| "postgres".to_string()),
            },
        };

        Ok(Self {
            database,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "1".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            poll_interval_secs: lookup("POLL_INTERVAL_SECS")
                .unwrap_or_else(|| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("POLL_INTERVAL_SECS must be a valid u64"))?,
            lookahead_secs: lookup("LOOKAHEAD_SECS")
                .unwrap_or_else(|| "600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LOOKAHEAD_SECS must be a valid i64"))?,
            shutdown_grace_secs: lookup("SHUTDOWN_GRACE_SECS")
                .unwrap_or_else(|| "0".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SHUTDOWN_GRACE_SECS must be a valid u64"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_parts() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "10.0.0.5"),
            ("DB_USER", "tracker"),
            ("DB_PASSWORD", "hunter2"),
        ]))
        .unwrap();

        assert_eq!(
            config.database,
            DatabaseConfig::Parts {
                host: "10.0.0.5".to_string(),
                port: 5432,
                user: "tracker".to_string(),
                password: "hunter2".to_string(),
                database: "postgres".to_string(),
            }
        );
        assert_eq!(config.db_max_connections, 1);
        assert_eq!(config.poll_interval_secs, 300);
        assert_eq!(config.lookahead_secs, 600);
        assert_eq!(config.shutdown_grace_secs, 0);
    }

    #[test]
    fn test_database_url_takes_precedence() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://a:b@localhost/db"),
            ("POLL_INTERVAL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(
            config.database,
            DatabaseConfig::Url("postgres://a:b@localhost/db".to_string())
        );
        assert_eq!(config.poll_interval_secs, 60);
    }

    #[test]
    fn test_missing_host_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("DB_USER", "u"), ("DB_PASSWORD", "p")]))
            .unwrap_err();
        assert!(err.to_string().contains("DB_HOST"));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("LOOKAHEAD_SECS", "ten minutes"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LOOKAHEAD_SECS"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DatabaseConfig::Parts {
            host: "h".to_string(),
            port: 5432,
            user: "u".to_string(),
            password: "hunter2".to_string(),
            database: "postgres".to_string(),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
