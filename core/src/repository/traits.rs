use anyhow::Result;

pub const PIECES_KEY: &str = "pieces";
pub const PRACTICE_LOG_KEY: &str = "practiceLog";

/// A string-keyed slot holding serialized text.
pub trait KeyValueRepository {
    /// Previously saved text, or `None` if nothing was ever saved under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;
    /// Overwrites whatever is stored under `key`.
    fn save(&self, key: &str, text: &str) -> Result<()>;
}

impl<R: KeyValueRepository + ?Sized> KeyValueRepository for &R {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, text: &str) -> Result<()> {
        (**self).save(key, text)
    }
}
