//! Cache configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the cache directory
pub const CACHE_DIR_ENV: &str = "CADKIT_CACHE_DIR";

/// Environment variable that disables the cache when set to `off`, `0`,
/// `false` or `no`
pub const CACHE_SWITCH_ENV: &str = "CADKIT_CACHE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("cadkit-cache"),
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Read overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through `lookup`, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
            config.dir = PathBuf::from(dir);
        }
        if let Some(switch) = lookup(CACHE_SWITCH_ENV) {
            config.enabled = !matches!(
                switch.trim().to_ascii_lowercase().as_str(),
                "off" | "0" | "false" | "no"
            );
        }
        config
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
