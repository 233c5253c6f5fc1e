//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::domain::{Catalog, Locale};
use crate::presenter::CollisionPolicy;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Locale used to render error messages
    pub locale: Locale,

    /// Tie-break for virtual names claimed by more than one slot
    pub collision_policy: CollisionPolicy,

    /// Optional JSON message catalog merged over the English defaults
    pub catalog_path: Option<PathBuf>,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Locale::english(),
            collision_policy: CollisionPolicy::default(),
            catalog_path: None,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable if it is set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let locale = lookup("PRESENTER_LOCALE")
            .filter(|code| !code.trim().is_empty())
            .map(|code| Locale::new(code.trim()))
            .unwrap_or_default();

        let collision_policy = match lookup("PRESENTER_COLLISION_POLICY") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PRESENTER_COLLISION_POLICY"))?,
            None => CollisionPolicy::default(),
        };

        let catalog_path = lookup("PRESENTER_CATALOG")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        Ok(Self {
            locale,
            collision_policy,
            catalog_path,
            environment,
        })
    }

    /// English catalog, with the configured catalog file merged over it
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        let mut catalog = Catalog::english();
        if let Some(path) = &self.catalog_path {
            let json = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
                path: path.clone(),
                source,
            })?;
            catalog
                .load_json(&json)
                .map_err(|source| ConfigError::CatalogParse {
                    path: path.clone(),
                    source,
                })?;
        }
        Ok(catalog)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Cannot read message catalog {path:?}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid message catalog {path:?}: {source}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
