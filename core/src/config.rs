use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::repository::file::default_data_dir;

const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_MAX_MINUTES_PER_ENTRY: u32 = 240;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where the slots live. `None` means `~/.practice`.
    pub data_dir: Option<PathBuf>,
    /// Largest single entry the views accept. The store itself has no bound.
    pub max_minutes_per_entry: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_minutes_per_entry: DEFAULT_MAX_MINUTES_PER_ENTRY,
        }
    }
}

impl Config {
    /// Reads `~/.practice/config.json`, falling back to defaults.
    pub fn load() -> Result<Self> {
        Ok(Self::load_from(&default_data_dir()?.join(CONFIG_FILE_NAME)))
    }

    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }
        }
    }

    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }
}
