use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::template::is_valid_table_name;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    /// Required when `store.backend` is `postgres`
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Storage backend: "postgres" or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Timeout in seconds for each persistence operation
    #[serde(default = "default_store_timeout")]
    pub timeout: u64,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string, e.g. postgres://db.internal:5432
    pub url: String,
    pub username: String,
    pub password: String,
    /// Database name
    pub name: String,
    /// Table holding the email templates
    pub table: String,
    /// Maximum pool connections
    #[serde(default = "default_pool_size")]
    pub pool: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("pool", &self.pool)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backend() -> String {
    "postgres".to_string()
}

fn default_store_timeout() -> u64 {
    5
}

fn default_pool_size() -> u32 {
    10
}

/// String settings taken verbatim from the environment
const STRING_ENV_KEYS: [(&str, &str); 8] = [
    ("server.host", "SERVER_HOST"),
    ("store.backend", "STORE_BACKEND"),
    ("database.url", "DATABASE_URL"),
    ("database.username", "DATABASE_USERNAME"),
    ("database.password", "DATABASE_PASSWORD"),
    ("database.name", "DATABASE_NAME"),
    ("database.table", "DATABASE_TABLE"),
    ("api.key", "API_KEY"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("store.backend", "postgres")?
            .set_default("store.timeout", 5)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // SERVER_PORT, STORE_BACKEND, DATABASE_URL, DATABASE_TABLE, API_KEY, etc.
            .add_source(Environment::default().separator("_").try_parsing(true));

        // Numeric-looking strings ("007") must not go through number parsing
        for (key, var) in STRING_ENV_KEYS {
            builder = builder.set_override_option(key, env::var(var).ok())?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values the service cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.store.backend.as_str() {
            "memory" => {}
            "postgres" => {
                let database = self.database.as_ref().ok_or_else(|| {
                    ConfigError::Message(
                        "DATABASE_URL, DATABASE_USERNAME, DATABASE_PASSWORD, DATABASE_NAME and DATABASE_TABLE must be set".to_string(),
                    )
                })?;
                database.validate()?;
            }
            other => {
                return Err(ConfigError::Message(format!(
                    "Unknown store backend: {}",
                    other
                )))
            }
        }

        if self.store.timeout == 0 {
            return Err(ConfigError::Message(
                "store.timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("database.url", &self.url),
            ("database.username", &self.username),
            ("database.password", &self.password),
            ("database.name", &self.name),
            ("database.table", &self.table),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{} must not be empty", key)));
            }
        }

        if !is_valid_table_name(&self.table) {
            return Err(ConfigError::Message(format!(
                "database.table is not a valid table name: {}",
                self.table
            )));
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            timeout: default_store_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> DatabaseConfig {
        DatabaseConfig {
            url: "postgres://localhost:5432".to_string(),
            username: "templates".to_string(),
            password: "secret".to_string(),
            name: "templates".to_string(),
            table: "email_templates".to_string(),
            pool: default_pool_size(),
        }
    }

    fn settings(backend: &str, database: Option<DatabaseConfig>) -> Settings {
        Settings {
            server: ServerConfig::default(),
            store: StoreConfig {
                backend: backend.to_string(),
                ..Default::default()
            },
            database,
            api: ApiConfig::default(),
        }
    }

    #[test]
    fn test_default_values() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);

        let store = StoreConfig::default();
        assert_eq!(store.backend, "postgres");
        assert_eq!(store.timeout, 5);
    }

    #[test]
    fn test_postgres_requires_database() {
        assert!(settings("postgres", None).validate().is_err());
        assert!(settings("postgres", Some(database())).validate().is_ok());
    }

    #[test]
    fn test_memory_needs_no_database() {
        assert!(settings("memory", None).validate().is_ok());
    }

    #[test]
    fn test_unknown_backend() {
        assert!(settings("mongo", None).validate().is_err());
    }

    #[test]
    fn test_empty_database_value() {
        let mut db = database();
        db.password = String::new();
        assert!(settings("postgres", Some(db)).validate().is_err());
    }

    #[test]
    fn test_invalid_table_name() {
        let mut db = database();
        db.table = "templates; drop".to_string();
        assert!(settings("postgres", Some(db)).validate().is_err());
    }

    #[test]
    fn test_debug_masks_password() {
        let rendered = format!("{:?}", database());
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_numeric_looking_strings_kept_from_env() {
        let vars = [
            ("STORE_BACKEND", "postgres"),
            ("STORE_TIMEOUT", "7"),
            ("DATABASE_URL", "postgres://localhost:5432"),
            ("DATABASE_USERNAME", "0042"),
            ("DATABASE_PASSWORD", "007"),
            ("DATABASE_NAME", "templates"),
            ("DATABASE_TABLE", "email_templates"),
            ("DATABASE_POOL", "4"),
            ("API_KEY", "0123"),
        ];
        for (var, value) in vars {
            env::set_var(var, value);
        }

        let result = Settings::new();

        for (var, _) in vars {
            env::remove_var(var);
        }

        let settings = result.unwrap();
        let db = settings.database.unwrap();
        assert_eq!(db.password, "007");
        assert_eq!(db.username, "0042");
        assert_eq!(db.pool, 4);
        assert_eq!(settings.store.timeout, 7);
        assert_eq!(settings.api.key.as_deref(), Some("0123"));
    }

    #[test]
    fn test_server_addr() {
        assert_eq!(settings("memory", None).server_addr(), "0.0.0.0:8080");
    }
}
