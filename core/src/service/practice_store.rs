use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::input::{normalize_name, parse_minutes};
use crate::model::piece::{Piece, PieceId, MAX_PIECES};
use crate::model::practice_log::{HistoryEntry, PracticeLog};
use crate::outcome::{Outcome, Rejection};
use crate::repository::{KeyValueRepository, PIECES_KEY, PRACTICE_LOG_KEY};
use crate::service::dto::PieceSummary;
use crate::time::{date_key, Clock, LocalClock};

/// Owns the tracked pieces and the practice log, and writes each back to
/// its repository slot after every change.
pub struct PracticeStore<R: KeyValueRepository, C: Clock = LocalClock> {
    repo: R,
    clock: C,
    pieces: Vec<Piece>,
    log: PracticeLog,
}

impl<R: KeyValueRepository> PracticeStore<R, LocalClock> {
    pub fn load(repo: R) -> Self {
        Self::load_with_clock(repo, LocalClock)
    }
}

impl<R: KeyValueRepository, C: Clock> PracticeStore<R, C> {
    /// Reads both slots. Anything missing or unreadable starts out empty.
    pub fn load_with_clock(repo: R, clock: C) -> Self {
        let pieces: Vec<Piece> = load_slot(&repo, PIECES_KEY);
        let log: PracticeLog = load_slot(&repo, PRACTICE_LOG_KEY);
        info!(pieces = pieces.len(), days = log.dates().count(), "loaded practice store");
        Self {
            repo,
            clock,
            pieces,
            log,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: &PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pieces.len() >= MAX_PIECES
    }

    pub fn remaining_slots(&self) -> usize {
        MAX_PIECES.saturating_sub(self.pieces.len())
    }

    pub fn log(&self) -> &PracticeLog {
        &self.log
    }

    pub fn add_piece(&mut self, name: &str) -> Result<Outcome<Piece>> {
        let Some(name) = normalize_name(name) else {
            return Ok(Rejection::EmptyName.into());
        };
        if self.is_full() {
            return Ok(Rejection::CapacityReached { limit: MAX_PIECES }.into());
        }

        let piece = Piece::new(name);
        let mut pieces = self.pieces.clone();
        pieces.push(piece.clone());
        save_slot(&self.repo, PIECES_KEY, &pieces)?;
        self.pieces = pieces;

        info!(id = %piece.id, name = %piece.name, "added piece");
        Ok(Outcome::Applied(piece))
    }

    /// Removes the piece and every log entry it owns.
    pub fn remove_piece(&mut self, id: &PieceId) -> Result<Outcome<Piece>> {
        let Some(pos) = self.pieces.iter().position(|p| &p.id == id) else {
            return Ok(Rejection::UnknownPiece(id.clone()).into());
        };

        let mut pieces = self.pieces.clone();
        let removed = pieces.remove(pos);
        save_slot(&self.repo, PIECES_KEY, &pieces)?;
        self.pieces = pieces;

        // The two slots are written separately; a failure here leaves orphan
        // entries on disk, which reads ignore.
        let mut log = self.log.clone();
        let entries = log.remove_piece(id);
        if entries > 0 {
            save_slot(&self.repo, PRACTICE_LOG_KEY, &log)?;
            self.log = log;
        }

        info!(id = %removed.id, name = %removed.name, entries, "removed piece");
        Ok(Outcome::Applied(removed))
    }

    /// Parses `minutes_input` and adds it to today's total for the piece.
    /// Returns the new total.
    pub fn log_practice(&mut self, id: &PieceId, minutes_input: &str) -> Result<Outcome<u32>> {
        match parse_minutes(minutes_input) {
            Ok(minutes) => self.log_minutes(id, minutes),
            Err(reason) => Ok(Outcome::Rejected(reason)),
        }
    }

    pub fn log_minutes(&mut self, id: &PieceId, minutes: u32) -> Result<Outcome<u32>> {
        if minutes == 0 {
            return Ok(Rejection::InvalidMinutes {
                input: minutes.to_string(),
            }
            .into());
        }
        if self.piece(id).is_none() {
            return Ok(Rejection::UnknownPiece(id.clone()).into());
        }

        let today = self.today();
        let mut log = self.log.clone();
        let total = log.add(today, id, minutes);
        save_slot(&self.repo, PRACTICE_LOG_KEY, &log)?;
        self.log = log;

        debug!(id = %id, date = %date_key(today), minutes, total, "logged practice");
        Ok(Outcome::Applied(total))
    }

    /// Every non-zero day for the piece, newest first.
    pub fn practice_history(&self, id: &PieceId) -> Vec<HistoryEntry> {
        if self.piece(id).is_none() {
            return Vec::new();
        }
        self.log.history(id)
    }

    pub fn today_minutes(&self, id: &PieceId) -> u32 {
        if self.piece(id).is_none() {
            return 0;
        }
        self.log.minutes_on(self.today(), id)
    }

    pub fn total_minutes(&self, id: &PieceId) -> u64 {
        if self.piece(id).is_none() {
            return 0;
        }
        self.log.total(id)
    }

    /// Everything a view needs to render, in display order.
    pub fn summaries(&self) -> Vec<PieceSummary> {
        let today = self.today();
        self.pieces
            .iter()
            .map(|piece| PieceSummary {
                id: piece.id.clone(),
                name: piece.name.clone(),
                today_minutes: self.log.minutes_on(today, &piece.id),
                total_minutes: self.log.total(&piece.id),
                history: self.log.history(&piece.id),
            })
            .collect()
    }
}

fn load_slot<R, T>(repo: &R, key: &str) -> T
where
    R: KeyValueRepository,
    T: DeserializeOwned + Default,
{
    let text = match repo.load(key) {
        Ok(Some(text)) => text,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!(key, error = %e, "could not read slot, starting empty");
            return T::default();
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "could not parse slot, starting empty");
            T::default()
        }
    }
}

fn save_slot<R, T>(repo: &R, key: &str, value: &T) -> Result<()>
where
    R: KeyValueRepository,
    T: Serialize + ?Sized,
{
    let text = serde_json::to_string_pretty(value)?;
    repo.save(key, &text)
        .with_context(|| format!("Failed to save '{}'", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryKeyValueRepository;
    use crate::time::FixedClock;
    use anyhow::anyhow;
    use std::cell::Cell;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Clock the test can move between calls.
    struct StepClock(Cell<NaiveDate>);

    impl Clock for StepClock {
        fn today(&self) -> NaiveDate {
            self.0.get()
        }
    }

    fn store_on(day: &str) -> PracticeStore<MemoryKeyValueRepository, FixedClock> {
        PracticeStore::load_with_clock(MemoryKeyValueRepository::new(), FixedClock(date(day)))
    }

    fn add(store: &mut PracticeStore<impl KeyValueRepository, impl Clock>, name: &str) -> PieceId {
        store.add_piece(name).unwrap().applied().unwrap().id
    }

    #[test]
    fn test_add_piece_trims_and_persists() {
        let mut store = store_on("2024-05-01");
        let piece = store.add_piece("  Chopin Nocturne  ").unwrap().applied().unwrap();

        assert_eq!(piece.name, "Chopin Nocturne");
        assert_eq!(store.pieces(), &[piece.clone()]);

        let saved = store.repository().get(PIECES_KEY).unwrap();
        let reloaded: Vec<Piece> = serde_json::from_str(&saved).unwrap();
        assert_eq!(reloaded, vec![piece]);
    }

    #[test]
    fn test_pieces_keep_insertion_order() {
        let mut store = store_on("2024-05-01");
        for name in ["C", "A", "B"] {
            add(&mut store, name);
        }
        let names: Vec<&str> = store.pieces().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_accumulates_within_a_day() {
        let mut store = store_on("2024-05-01");
        let id = add(&mut store, "Scales");

        assert_eq!(store.log_practice(&id, "20").unwrap(), Outcome::Applied(20));
        assert_eq!(store.log_practice(&id, "15").unwrap(), Outcome::Applied(35));
        assert_eq!(store.today_minutes(&id), 35);
    }

    #[test]
    fn test_days_are_isolated() {
        let clock = StepClock(Cell::new(date("2024-05-01")));
        let mut store = PracticeStore::load_with_clock(MemoryKeyValueRepository::new(), &clock);
        let id = add(&mut store, "Etude");

        store.log_practice(&id, "30").unwrap();
        clock.0.set(date("2024-05-02"));
        assert_eq!(store.today_minutes(&id), 0);
        store.log_practice(&id, "10").unwrap();

        assert_eq!(store.log().minutes_on(date("2024-05-01"), &id), 30);
        assert_eq!(store.log().minutes_on(date("2024-05-02"), &id), 10);
        assert_eq!(store.total_minutes(&id), 40);
    }

    #[test]
    fn test_capacity_ceiling() {
        let mut store = store_on("2024-05-01");
        for i in 0..MAX_PIECES {
            assert!(store.add_piece(&format!("Piece {}", i)).unwrap().is_applied());
        }
        assert!(store.is_full());
        assert_eq!(store.remaining_slots(), 0);

        let before = store.repository().get(PIECES_KEY);
        let outcome = store.add_piece("One too many").unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::CapacityReached { limit: MAX_PIECES }));
        assert_eq!(store.len(), MAX_PIECES);
        assert_eq!(store.repository().get(PIECES_KEY), before);
    }

    #[test]
    fn test_remove_cascades_to_log() {
        let clock = StepClock(Cell::new(date("2024-05-01")));
        let mut store = PracticeStore::load_with_clock(MemoryKeyValueRepository::new(), &clock);
        let doomed = add(&mut store, "Doomed");
        let kept = add(&mut store, "Kept");

        store.log_practice(&doomed, "5").unwrap();
        clock.0.set(date("2024-05-02"));
        store.log_practice(&doomed, "6").unwrap();
        store.log_practice(&kept, "7").unwrap();

        let removed = store.remove_piece(&doomed).unwrap().applied().unwrap();
        assert_eq!(removed.name, "Doomed");
        assert!(store.piece(&doomed).is_none());
        assert!(store.practice_history(&doomed).is_empty());

        // 2024-05-01 only held the removed piece and is pruned.
        let saved: PracticeLog =
            serde_json::from_str(&store.repository().get(PRACTICE_LOG_KEY).unwrap()).unwrap();
        assert_eq!(saved.dates().copied().collect::<Vec<_>>(), vec![date("2024-05-02")]);
        assert_eq!(saved.minutes_on(date("2024-05-02"), &kept), 7);
    }

    #[test]
    fn test_remove_unknown_piece_is_rejected() {
        let mut store = store_on("2024-05-01");
        add(&mut store, "Only");
        let ghost = PieceId::from("ghost");
        assert_eq!(
            store.remove_piece(&ghost).unwrap(),
            Outcome::Rejected(Rejection::UnknownPiece(ghost))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_history_is_newest_first() {
        let json = r#"{"2024-01-01":{"p":5},"2024-03-10":{"p":7},"2024-02-15":{"p":3}}"#;
        let repo = MemoryKeyValueRepository::new()
            .with_slot(PIECES_KEY, r#"[{"id":"p","name":"Sonata"}]"#)
            .with_slot(PRACTICE_LOG_KEY, json);
        let store = PracticeStore::load_with_clock(repo, FixedClock(date("2024-03-10")));

        let history = store.practice_history(&PieceId::from("p"));
        let flat: Vec<(String, u32)> = history
            .iter()
            .map(|e| (e.date.to_string(), e.minutes))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("2024-03-10".to_string(), 7),
                ("2024-02-15".to_string(), 3),
                ("2024-01-01".to_string(), 5),
            ]
        );
    }

    #[test]
    fn test_invalid_input_leaves_storage_untouched() {
        let mut store = store_on("2024-05-01");
        let id = add(&mut store, "Scales");
        store.log_practice(&id, "10").unwrap();

        let pieces_before = store.repository().get(PIECES_KEY);
        let log_before = store.repository().get(PRACTICE_LOG_KEY);

        assert_eq!(store.add_piece("").unwrap(), Outcome::Rejected(Rejection::EmptyName));
        assert_eq!(store.add_piece("   ").unwrap(), Outcome::Rejected(Rejection::EmptyName));
        for bad in ["0", "-5", "abc", ""] {
            let outcome = store.log_practice(&id, bad).unwrap();
            assert!(
                matches!(outcome, Outcome::Rejected(Rejection::InvalidMinutes { .. })),
                "input {:?}",
                bad
            );
        }
        assert!(!store.log_minutes(&id, 0).unwrap().is_applied());

        assert_eq!(store.repository().get(PIECES_KEY), pieces_before);
        assert_eq!(store.repository().get(PRACTICE_LOG_KEY), log_before);
        assert_eq!(store.today_minutes(&id), 10);
    }

    #[test]
    fn test_log_for_unknown_piece_is_rejected() {
        let mut store = store_on("2024-05-01");
        let ghost = PieceId::from("ghost");
        assert_eq!(
            store.log_practice(&ghost, "10").unwrap(),
            Outcome::Rejected(Rejection::UnknownPiece(ghost))
        );
        assert!(store.log().is_empty());
        assert_eq!(store.repository().get(PRACTICE_LOG_KEY), None);
    }

    #[test]
    fn test_round_trip_through_reload() {
        let mut store = store_on("2024-05-01");
        let a = add(&mut store, "A");
        let b = add(&mut store, "B");
        store.log_practice(&a, "12").unwrap();
        store.log_practice(&b, "8").unwrap();

        let pieces = store.pieces().to_vec();
        let log = store.log().clone();
        let repo = store.repository();

        let reloaded = PracticeStore::load_with_clock(repo, FixedClock(date("2024-05-01")));
        assert_eq!(reloaded.pieces(), pieces.as_slice());
        assert_eq!(reloaded.log(), &log);
        assert_eq!(reloaded.today_minutes(&a), 12);
    }

    #[test]
    fn test_corrupt_slots_fall_back_to_empty() {
        let repo = MemoryKeyValueRepository::new()
            .with_slot(PIECES_KEY, "not json")
            .with_slot(PRACTICE_LOG_KEY, r#"{"2024-01-01": 3}"#);
        let store = PracticeStore::load_with_clock(repo, FixedClock(date("2024-05-01")));
        assert!(store.is_empty());
        assert!(store.log().is_empty());
    }

    #[test]
    fn test_orphan_entries_are_not_read() {
        let repo = MemoryKeyValueRepository::new()
            .with_slot(PIECES_KEY, r#"[{"id":"live","name":"Live"}]"#)
            .with_slot(PRACTICE_LOG_KEY, r#"{"2024-05-01":{"live":4,"gone":9}}"#);
        let store = PracticeStore::load_with_clock(repo, FixedClock(date("2024-05-01")));

        let gone = PieceId::from("gone");
        assert_eq!(store.today_minutes(&gone), 0);
        assert_eq!(store.total_minutes(&gone), 0);
        assert!(store.practice_history(&gone).is_empty());
        assert_eq!(store.summaries().len(), 1);
    }

    #[test]
    fn test_queries_are_idempotent() {
        let mut store = store_on("2024-05-01");
        let id = add(&mut store, "Scales");
        store.log_practice(&id, "9").unwrap();

        assert_eq!(store.practice_history(&id), store.practice_history(&id));
        assert_eq!(store.today_minutes(&id), store.today_minutes(&id));
        assert_eq!(store.summaries(), store.summaries());
    }

    #[test]
    fn test_summaries() {
        let clock = StepClock(Cell::new(date("2024-05-01")));
        let mut store = PracticeStore::load_with_clock(MemoryKeyValueRepository::new(), &clock);
        let a = add(&mut store, "A");
        add(&mut store, "B");
        store.log_practice(&a, "10").unwrap();
        clock.0.set(date("2024-05-02"));
        store.log_practice(&a, "5").unwrap();

        let summaries = store.summaries();
        assert_eq!(summaries[0].name, "A");
        assert_eq!(summaries[0].today_minutes, 5);
        assert_eq!(summaries[0].total_minutes, 15);
        assert_eq!(summaries[0].history.len(), 2);
        assert_eq!(summaries[1].today_minutes, 0);
        assert!(summaries[1].history.is_empty());
    }

    struct FailingRepo;

    impl KeyValueRepository for FailingRepo {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("disk on fire"))
        }
        fn save(&self, _key: &str, _text: &str) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    #[test]
    fn test_failed_save_keeps_memory_unchanged() {
        let mut store = PracticeStore::load_with_clock(FailingRepo, FixedClock(date("2024-05-01")));
        assert!(store.is_empty());
        assert!(store.add_piece("Scales").is_err());
        assert!(store.is_empty());
    }

    /// Memory slots whose practice log writes can be switched to fail.
    #[derive(Default)]
    struct FlakyLogRepo {
        inner: MemoryKeyValueRepository,
        fail_log: Cell<bool>,
    }

    impl KeyValueRepository for FlakyLogRepo {
        fn load(&self, key: &str) -> Result<Option<String>> {
            self.inner.load(key)
        }
        fn save(&self, key: &str, text: &str) -> Result<()> {
            if key == PRACTICE_LOG_KEY && self.fail_log.get() {
                return Err(anyhow!("log slot unwritable"));
            }
            self.inner.save(key, text)
        }
    }

    #[test]
    fn test_failed_log_write_keeps_today_total() {
        let repo = FlakyLogRepo::default();
        let mut store = PracticeStore::load_with_clock(&repo, FixedClock(date("2024-05-01")));
        let id = add(&mut store, "Scales");
        store.log_practice(&id, "10").unwrap();
        let saved_log = repo.inner.get(PRACTICE_LOG_KEY);

        repo.fail_log.set(true);
        assert!(store.log_practice(&id, "5").is_err());
        assert_eq!(store.today_minutes(&id), 10);
        assert_eq!(repo.inner.get(PRACTICE_LOG_KEY), saved_log);
    }

    #[test]
    fn test_remove_with_failed_log_write_hides_orphans() {
        let repo = FlakyLogRepo::default();
        let mut store = PracticeStore::load_with_clock(&repo, FixedClock(date("2024-05-01")));
        let doomed = add(&mut store, "Doomed");
        let kept = add(&mut store, "Kept");
        store.log_practice(&doomed, "12").unwrap();
        store.log_practice(&kept, "3").unwrap();

        repo.fail_log.set(true);
        assert!(store.remove_piece(&doomed).is_err());

        // The pieces slot was written, the log slot still holds the orphan.
        assert!(store.piece(&doomed).is_none());
        assert!(store.practice_history(&doomed).is_empty());
        assert_eq!(store.today_minutes(&doomed), 0);
        assert_eq!(store.today_minutes(&kept), 3);
        assert!(repo.inner.get(PRACTICE_LOG_KEY).unwrap().contains(doomed.as_str()));

        let reloaded = PracticeStore::load_with_clock(&repo, FixedClock(date("2024-05-01")));
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.practice_history(&doomed).is_empty());
        assert_eq!(reloaded.total_minutes(&doomed), 0);
        assert!(reloaded.summaries().iter().all(|s| s.id != doomed));
    }
}
