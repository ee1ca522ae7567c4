use serde::{Deserialize, Serialize};

use crate::model::piece::PieceId;
use crate::model::practice_log::HistoryEntry;

/// Read-only view of one piece, flattened for rendering.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PieceSummary {
    pub id: PieceId,
    pub name: String,
    pub today_minutes: u32,
    pub total_minutes: u64,
    /// Newest first.
    pub history: Vec<HistoryEntry>,
}
