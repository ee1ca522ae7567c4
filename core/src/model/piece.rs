use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const MAX_PIECES: usize = 10;

/// Opaque identifier of a piece. Stored as a plain string so ids written by
/// older data files (which were not UUIDs) still load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PieceId(String);

impl PieceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for tables.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PieceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PieceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub name: String,
}

impl Piece {
    /// Callers are expected to pass an already trimmed, non-empty name.
    pub fn new(name: String) -> Self {
        Self {
            id: PieceId::generate(),
            name,
        }
    }
}
