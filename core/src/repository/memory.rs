use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;

use crate::repository::traits::KeyValueRepository;

#[derive(Debug, Default)]
pub struct MemoryKeyValueRepository {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryKeyValueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(self, key: &str, text: &str) -> Self {
        self.slots.borrow_mut().insert(key.to_string(), text.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }
}

impl KeyValueRepository for MemoryKeyValueRepository {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, text: &str) -> Result<()> {
        self.slots.borrow_mut().insert(key.to_string(), text.to_string());
        Ok(())
    }
}
