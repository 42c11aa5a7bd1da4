use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub smoke: SmokeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "0.0.0.0")
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Per-request processing budget in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// CPU cores requested by the service; sizes the runtime worker pool
    #[serde(default = "default_cpu")]
    pub cpu: usize,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_cpu() -> usize {
    2
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Root directory of the on-disk model registry
    pub registry_dir: PathBuf,
    /// Model tag, "<name>:<version>" (e.g., "consommation_model:latest")
    pub tag: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily-rotated log files; console only when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmokeConfig {
    /// Prediction endpoint the smoke-test client posts to
    #[serde(default = "default_smoke_url")]
    pub url: String,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            url: default_smoke_url(),
        }
    }
}

fn default_smoke_url() -> String {
    "http://127.0.0.1:3000/predict".to_string()
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.request_timeout_secs", 10)?
            .set_default("server.cpu", 2)?
            .set_default("model.registry_dir", "models")?
            .set_default("model.tag", "consommation_model:latest")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("smoke.url", default_smoke_url())?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("CONSO_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (CONSO_SERVER__PORT, etc.)
            .add_source(
                Environment::with_prefix("CONSO")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Built-in configuration, used by tests and when no config directory exists
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                request_timeout_secs: default_request_timeout_secs(),
                cpu: default_cpu(),
            },
            model: ModelConfig {
                registry_dir: PathBuf::from("models"),
                tag: "consommation_model:latest".to_string(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                json: false,
                dir: None,
            },
            smoke: SmokeConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be non-zero".to_string());
        }

        if self.server.request_timeout_secs == 0 {
            errors.push("server.request_timeout_secs must be positive".to_string());
        }

        if self.server.cpu == 0 {
            errors.push("server.cpu must be at least 1".to_string());
        }

        if self.model.tag.trim().is_empty() {
            errors.push("model.tag must not be empty".to_string());
        }

        if !matches!(
            self.logging.level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            errors.push(format!("unknown logging.level: {}", self.logging.level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.server.cpu, 2);
        assert_eq!(config.model.tag, "consommation_model:latest");
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut config = AppConfig::default_config();
        config.server.cpu = 0;
        config.server.request_timeout_secs = 0;
        config.logging.level = "loud".to_string();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn load_from_missing_dir_uses_defaults() {
        let dir = std::env::temp_dir().join(format!("conso-config-{}", uuid::Uuid::new_v4()));
        let config = AppConfig::load_from(&dir).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.model.registry_dir, PathBuf::from("models"));
        assert_eq!(config.smoke.url, "http://127.0.0.1:3000/predict");
    }

    #[test]
    fn load_from_reads_default_toml() {
        let dir = std::env::temp_dir().join(format!("conso-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("default.toml"),
            "[server]\nport = 8081\n\n[model]\ntag = \"other_model:v2\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&dir).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.model.tag, "other_model:v2");
        assert_eq!(config.server.request_timeout_secs, 10);

        std::fs::remove_dir_all(&dir).ok();
    }
}
