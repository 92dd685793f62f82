//! Workshop configuration

use cadkit_cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable for the export directory
pub const OUT_DIR_ENV: &str = "CADKIT_OUT_DIR";

/// Environment variable for the base directory of `import_part`
pub const PARTS_DIR_ENV: &str = "CADKIT_PARTS_DIR";

/// Where exported parts go, where imported scripts are found, and how
/// builders are cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    pub out_dir: PathBuf,
    pub parts_dir: PathBuf,
    pub cache: CacheConfig,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
            parts_dir: PathBuf::from("."),
            cache: CacheConfig::default(),
        }
    }
}

impl WorkshopConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            cache: CacheConfig::from_lookup(&lookup),
            ..Self::default()
        };
        if let Some(dir) = lookup(OUT_DIR_ENV).filter(|d| !d.is_empty()) {
            config.out_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(PARTS_DIR_ENV).filter(|d| !d.is_empty()) {
            config.parts_dir = PathBuf::from(dir);
        }
        config
    }

    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn with_parts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.parts_dir = dir.into();
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_each_directory() {
        let config = WorkshopConfig::from_lookup(|name| match name {
            OUT_DIR_ENV => Some("/tmp/stl".to_string()),
            PARTS_DIR_ENV => Some("parts".to_string()),
            "CADKIT_CACHE" => Some("no".to_string()),
            _ => None,
        });
        assert_eq!(config.out_dir, PathBuf::from("/tmp/stl"));
        assert_eq!(config.parts_dir, PathBuf::from("parts"));
        assert!(!config.cache.enabled);
    }

    #[test]
    fn empty_values_keep_defaults() {
        let config = WorkshopConfig::from_lookup(|_| Some(String::new()));
        assert_eq!(config.out_dir, PathBuf::from("out"));
        assert_eq!(config.parts_dir, PathBuf::from("."));
    }
}
