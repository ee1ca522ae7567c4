use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::repository::traits::KeyValueRepository;

const DEFAULT_DIR_NAME: &str = ".practice";
const FILE_EXTENSION: &str = "json";

/// Stores each key as `<key>.json` inside a data directory.
#[derive(Clone, Debug)]
pub struct FileKeyValueRepository {
    base_dir: PathBuf,
}

impl FileKeyValueRepository {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let path = match base_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        fs::create_dir_all(&path)
            .with_context(|| format!("Could not create data directory {}", path.display()))?;
        Ok(FileKeyValueRepository { base_dir: path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(anyhow!("Invalid storage key: '{}'", key));
        }
        Ok(self.base_dir.join(format!("{}.{}", key, FILE_EXTENSION)))
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home_dir.join(DEFAULT_DIR_NAME))
}

impl KeyValueRepository for FileKeyValueRepository {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Could not read {}", path.display())),
        }
    }

    fn save(&self, key: &str, text: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // Write next to the target and rename, so readers never see a torn file.
        let tmp_path = path.with_extension(format!("{}.tmp", FILE_EXTENSION));
        {
            let mut file = File::create(&tmp_path)
                .with_context(|| format!("Could not create {}", tmp_path.display()))?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Could not replace {}", path.display()))?;
        debug!(key, path = %path.display(), bytes = text.len(), "saved slot");
        Ok(())
    }
}
