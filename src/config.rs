use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration, read from a YAML file and overridden by CLI flags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub query: QueryLimits,
    pub client: ClientConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origin: None,
        }
    }
}

/// Which record store backend to open
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Sqlite {
        #[serde(default = "default_database")]
        database: String,
    },
    Memory {
        #[serde(default)]
        data_file: Option<PathBuf>,
    },
}

pub fn default_database() -> String {
    "drugs.db".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Sqlite {
            database: default_database(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimits {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        if config.query.default_page_size == 0 || config.query.max_page_size == 0 {
            anyhow::bail!("query page sizes must be at least 1");
        }
        if config.query.default_page_size > config.query.max_page_size {
            anyhow::bail!("query.default_page_size exceeds query.max_page_size");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization() {
        let config = AppConfig {
            store: StoreConfig::Memory {
                data_file: Some(PathBuf::from("drugs.json")),
            },
            ..Default::default()
        };

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("backend: memory"));
        assert_eq!(AppConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_deserialization() {
        let yaml = r#"
server:
  port: 8080
  cors_origin: "http://localhost:5173"
store:
  backend: sqlite
  database: "data/drugs.db"
query:
  default_page_size: 25
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.cors_origin.as_deref(), Some("http://localhost:5173"));
        assert_eq!(
            config.store,
            StoreConfig::Sqlite {
                database: "data/drugs.db".to_string()
            }
        );
        assert_eq!(config.query.default_page_size, 25);
        assert_eq!(config.query.max_page_size, 1000);
        assert_eq!(config.client, ClientConfig::default());
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn rejects_inconsistent_page_sizes() {
        assert!(AppConfig::from_yaml("query:\n  default_page_size: 0\n").is_err());
        assert!(AppConfig::from_yaml("query:\n  default_page_size: 200\n  max_page_size: 100\n").is_err());
    }
}
