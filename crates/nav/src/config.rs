//! Injector configuration
//!
//! Both values are resolved once when a [`NavInjector`](crate::NavInjector)
//! is built, never re-read per run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};

/// Origin used while authoring the fragment locally
pub const DEFAULT_PLACEHOLDER_ORIGIN: &str = "https://local.page";

/// Path the fragment is served at, relative to the page origin
pub const DEFAULT_FRAGMENT_PATH: &str = "/nav.html";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavConfig {
    /// Any anchor href containing this string gets it replaced by the page origin
    pub placeholder_origin: String,
    /// Absolute path of the fragment document
    pub fragment_path: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            placeholder_origin: DEFAULT_PLACEHOLDER_ORIGIN.to_string(),
            fragment_path: DEFAULT_FRAGMENT_PATH.to_string(),
        }
    }
}

impl NavConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: NavConfig =
            toml::from_str(input).map_err(|e| NavError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| {
            NavError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<()> {
        if self.placeholder_origin.is_empty() {
            return Err(NavError::InvalidConfig(
                "placeholder_origin must not be empty".to_string(),
            ));
        }
        if !self.fragment_path.starts_with('/') {
            return Err(NavError::InvalidConfig(format!(
                "fragment_path must start with '/', got '{}'",
                self.fragment_path
            )));
        }
        Ok(())
    }
}
