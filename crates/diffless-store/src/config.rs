use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::layout::Addressing;

/// Construction-time configuration for a [`FileStore`](crate::FileStore).
///
/// ```toml
/// cache_path = "fixtures/cache"
/// addressing_delimiter = "/"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory used (and created if missing) as the cache root.
    pub cache_path: PathBuf,
    /// When set, selects hierarchical addressing and is the literal
    /// separator used to split keys into segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addressing_delimiter: Option<String>,
}

impl StoreConfig {
    /// Flat-addressing configuration rooted at `cache_path`.
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            addressing_delimiter: None,
        }
    }

    /// Switch to hierarchical addressing split on `delimiter`.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.addressing_delimiter = Some(delimiter.into());
        self
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    ///
    /// A relative `cache_path` is resolved against the file's directory.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if config.cache_path.is_relative() {
            if let Some(parent) = path.parent() {
                config.cache_path = parent.join(&config.cache_path);
            }
        }
        Ok(config)
    }

    /// The addressing scheme selected by this configuration.
    pub fn addressing(&self) -> StoreResult<Addressing> {
        let addressing = match &self.addressing_delimiter {
            None => Addressing::Flat,
            Some(d) => Addressing::Hierarchical {
                delimiter: d.clone(),
            },
        };
        addressing.validate()?;
        Ok(addressing)
    }
}
