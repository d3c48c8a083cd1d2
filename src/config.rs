use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration, layered from `config/default.toml` (optional)
/// and `APP_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_environment")]
    pub environment: String,

    /// Tracing filter directive, e.g. "info" or "shoestore_api=debug,info".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Create tables on startup when they do not exist. Intended for the
    /// SQLite dev/test profile; production schemas are managed externally.
    #[serde(default = "default_true")]
    pub auto_bootstrap_schema: bool,
}

fn default_database_url() -> String {
    "sqlite://shoestore.db?mode=rwc".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?
            .try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_settings() {
        let cfg: AppConfig = Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_min_connections, 1);
        assert!(cfg.auto_bootstrap_schema);
        assert!(!cfg.is_production());
    }

    #[test]
    fn server_addr_joins_host_and_port() {
        let cfg: AppConfig = Config::builder()
            .set_override("host", "0.0.0.0")
            .unwrap()
            .set_override("port", 9000)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.server_addr(), "0.0.0.0:9000");
    }
}
