use crate::error::{LaunchpadError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON file relative to the project root.
    Local {
        #[serde(default = "default_store_path")]
        path: String,
    },
    /// PostgREST endpoint; the API key is read from `api_key_env`.
    Rest {
        url: String,
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
    },
}

fn default_store_path() -> String {
    paths::STORE_FILE.to_string()
}

fn default_api_key_env() -> String {
    "LAUNCHPAD_API_KEY".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Local {
            path: default_store_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3142
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub slug: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                slug: slug.into(),
                name: name.into(),
            },
            store: StoreConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(LaunchpadError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if paths::validate_slug(&self.project.slug).is_err() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("project slug '{}' is not a valid slug", self.project.slug),
            });
        }

        match &self.store {
            StoreConfig::Local { path } => {
                if path.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: "store.path is empty".to_string(),
                    });
                }
            }
            StoreConfig::Rest { url, api_key_env } => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("store.url '{url}' must start with http:// or https://"),
                    });
                }
                if std::env::var(api_key_env).is_err() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("{api_key_env} is not set; requests will be anonymous"),
                    });
                }
            }
        }

        if self.server.port == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.port is 0; the OS will pick a port".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
