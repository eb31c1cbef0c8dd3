//! Site configuration loading and validation.
//!
//! The site config is a YAML document listing the restaurants to process:
//!
//! ```yaml
//! restaurants:
//!   - id: u-kotvy
//!     name: U Kotvy
//!     url: https://ukotvy.cz/denni-menu
//!   - id: pivnice
//!     name: Pivnice Na Rohu
//!     url: slack://C0123ABCD
//! ```
//!
//! Loaded once per stage invocation. Any defect here is a fatal precondition
//! failure for the stage, never a per-restaurant error.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{Restaurant, SLACK_URL_PREFIX};

/// Errors loading or validating the site configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read site config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed site config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid site config: {0}")]
    Invalid(String),
}

/// The parsed and validated site configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub restaurants: Vec<Restaurant>,
}

impl SiteConfig {
    /// Load and validate the site config from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: SiteConfig =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Restaurant lookup by id.
    pub fn get(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for restaurant in &self.restaurants {
            if restaurant.id.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "restaurant '{}' has an empty id",
                    restaurant.name
                )));
            }
            if restaurant.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "restaurant '{}' has an empty name",
                    restaurant.id
                )));
            }
            if !seen.insert(restaurant.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate restaurant id '{}'",
                    restaurant.id
                )));
            }
            // Artifact filenames are derived from the id; keep them path-safe.
            if restaurant
                .id
                .chars()
                .any(|c| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
            {
                return Err(ConfigError::Invalid(format!(
                    "restaurant id '{}' contains characters unsafe for filenames",
                    restaurant.id
                )));
            }
            if restaurant.is_web() {
                url::Url::parse(&restaurant.url).map_err(|e| {
                    ConfigError::Invalid(format!(
                        "restaurant '{}' has an invalid url: {e}",
                        restaurant.id
                    ))
                })?;
            } else if !restaurant.is_slack() {
                return Err(ConfigError::Invalid(format!(
                    "restaurant '{}' url must start with http(s):// or {SLACK_URL_PREFIX}",
                    restaurant.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(
            "restaurants:\n\
             \x20 - id: u-kotvy\n\
             \x20   name: U Kotvy\n\
             \x20   url: https://ukotvy.cz/menu\n\
             \x20 - id: pivnice\n\
             \x20   name: Pivnice Na Rohu\n\
             \x20   url: slack://C0123ABCD\n",
        );
        let config = SiteConfig::load(file.path()).unwrap();
        assert_eq!(config.restaurants.len(), 2);
        assert_eq!(config.get("pivnice").unwrap().slack_channel(), Some("C0123ABCD"));
        assert!(config.get("missing").is_none());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = SiteConfig::load(Path::new("/nonexistent/sites.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_fatal() {
        let file = write_config("restaurants: [ {id: x, name: ");
        let err = SiteConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_missing_field_is_fatal() {
        let file = write_config("restaurants:\n  - id: x\n    url: https://example.com\n");
        let err = SiteConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let file = write_config(
            "restaurants:\n\
             \x20 - {id: dup, name: One, url: 'https://one.example'}\n\
             \x20 - {id: dup, name: Two, url: 'https://two.example'}\n",
        );
        let err = SiteConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate restaurant id 'dup'"));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let file = write_config("restaurants:\n  - {id: x, name: X, url: 'ftp://x.example'}\n");
        let err = SiteConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("must start with http"));
    }

    #[test]
    fn test_unsafe_id_rejected() {
        let file = write_config(
            "restaurants:\n  - {id: '../etc', name: X, url: 'https://x.example'}\n",
        );
        let err = SiteConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsafe for filenames"));
    }
}
