use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::piece::PieceId;

/// Minutes for one piece on one date.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub minutes: u32,
}

/// Minutes practiced, keyed by date then by piece.
///
/// Serializes as `{"YYYY-MM-DD": {"<piece id>": minutes}}`. Keeping the outer
/// map ordered by date means history can be read back newest first without a
/// separate sort.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PracticeLog {
    days: BTreeMap<NaiveDate, BTreeMap<PieceId, u32>>,
}

impl PracticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.days.keys()
    }

    pub fn minutes_on(&self, date: NaiveDate, piece: &PieceId) -> u32 {
        self.days
            .get(&date)
            .and_then(|day| day.get(piece))
            .copied()
            .unwrap_or(0)
    }

    /// Adds `minutes` to the entry for `(date, piece)` and returns the new total.
    pub fn add(&mut self, date: NaiveDate, piece: &PieceId, minutes: u32) -> u32 {
        let entry = self
            .days
            .entry(date)
            .or_default()
            .entry(piece.clone())
            .or_insert(0);
        *entry = entry.saturating_add(minutes);
        *entry
    }

    /// Drops every entry for `piece`, and any date left with no entries.
    /// Returns how many entries were removed.
    pub fn remove_piece(&mut self, piece: &PieceId) -> usize {
        let mut removed = 0;
        self.days.retain(|_, day| {
            if day.remove(piece).is_some() {
                removed += 1;
            }
            !day.is_empty()
        });
        removed
    }

    pub fn history(&self, piece: &PieceId) -> Vec<HistoryEntry> {
        self.days
            .iter()
            .rev()
            .filter_map(|(date, day)| {
                day.get(piece)
                    .filter(|&&minutes| minutes > 0)
                    .map(|&minutes| HistoryEntry { date: *date, minutes })
            })
            .collect()
    }

    pub fn total(&self, piece: &PieceId) -> u64 {
        self.days
            .values()
            .filter_map(|day| day.get(piece))
            .map(|&m| u64::from(m))
            .sum()
    }
}
