use std::collections::{HashMap, HashSet};

use practice_core::{
    parse_minutes, Clock, KeyValueRepository, LocalClock, Outcome, PieceId, PieceSummary,
    PracticeStore,
};
use ratatui::widgets::ListState;
use tracing::error;

pub enum InputMode {
    Normal,
    AddingPiece,
    LoggingMinutes(PieceId),
}

pub struct App<R: KeyValueRepository, C: Clock = LocalClock> {
    pub store: PracticeStore<R, C>,
    pub summaries: Vec<PieceSummary>,
    pub state: ListState,
    pub input: String,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub status: Option<String>,
    /// Half-typed minutes per piece, kept while the user moves around.
    pending_minutes: HashMap<PieceId, String>,
    expanded: HashSet<PieceId>,
    max_minutes_per_entry: u32,
}

impl<R: KeyValueRepository, C: Clock> App<R, C> {
    pub fn new(store: PracticeStore<R, C>, max_minutes_per_entry: u32) -> Self {
        let summaries = store.summaries();
        let mut state = ListState::default();
        if !summaries.is_empty() {
            state.select(Some(0));
        }
        App {
            store,
            summaries,
            state,
            input: String::new(),
            input_mode: InputMode::Normal,
            cursor_position: 0,
            status: None,
            pending_minutes: HashMap::new(),
            expanded: HashSet::new(),
            max_minutes_per_entry,
        }
    }

    pub fn selected(&self) -> Option<&PieceSummary> {
        self.state.selected().and_then(|i| self.summaries.get(i))
    }

    pub fn is_expanded(&self, id: &PieceId) -> bool {
        self.expanded.contains(id)
    }

    pub fn pending_minutes(&self, id: &PieceId) -> Option<&str> {
        self.pending_minutes.get(id).map(String::as_str)
    }

    pub fn next(&mut self) {
        if self.summaries.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.summaries.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.summaries.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.summaries.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn toggle_history(&mut self) {
        let Some(id) = self.selected().map(|s| s.id.clone()) else {
            return;
        };
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn remove_selected(&mut self) {
        let Some(i) = self.state.selected() else {
            return;
        };
        let Some(id) = self.summaries.get(i).map(|s| s.id.clone()) else {
            return;
        };

        match self.store.remove_piece(&id) {
            Ok(Outcome::Applied(piece)) => {
                self.expanded.remove(&id);
                self.pending_minutes.remove(&id);
                self.status = Some(format!("Removed {}", piece.name));
            }
            Ok(Outcome::Rejected(reason)) => self.status = Some(reason.to_string()),
            Err(e) => self.report_error(e),
        }
        self.reload();

        if self.summaries.is_empty() {
            self.state.select(None);
        } else if i >= self.summaries.len() {
            self.state.select(Some(self.summaries.len() - 1));
        }
    }

    pub fn enter_add_mode(&mut self) {
        if self.store.is_full() {
            self.status = Some(format!("All {} slots are in use", self.store.len()));
            return;
        }
        self.input_mode = InputMode::AddingPiece;
        self.set_input(String::new());
    }

    pub fn enter_log_mode(&mut self) {
        let Some(id) = self.selected().map(|s| s.id.clone()) else {
            return;
        };
        let pending = self.pending_minutes.get(&id).cloned().unwrap_or_default();
        self.input_mode = InputMode::LoggingMinutes(id);
        self.set_input(pending);
    }

    pub fn exit_input_mode(&mut self) {
        if let InputMode::LoggingMinutes(id) = &self.input_mode {
            if self.input.is_empty() {
                self.pending_minutes.remove(id);
            } else {
                self.pending_minutes.insert(id.clone(), self.input.clone());
            }
        }
        self.input_mode = InputMode::Normal;
        self.set_input(String::new());
    }

    pub fn input_char(&mut self, c: char) {
        let byte_index = self.byte_index(self.cursor_position);
        self.input.insert(byte_index, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let byte_index = self.byte_index(self.cursor_position - 1);
            self.input.remove(byte_index);
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn submit_command(&mut self) {
        let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
        match mode {
            InputMode::AddingPiece => {
                self.submit_add();
                self.set_input(String::new());
            }
            InputMode::LoggingMinutes(id) => {
                if !self.submit_log(&id) {
                    // Keep what was typed so it can be fixed.
                    self.input_mode = InputMode::LoggingMinutes(id);
                }
            }
            InputMode::Normal => {}
        }
    }

    fn submit_add(&mut self) {
        match self.store.add_piece(&self.input) {
            Ok(Outcome::Applied(piece)) => {
                self.status = Some(format!("Added {}", piece.name));
                self.reload();
                if let Some(pos) = self.summaries.iter().position(|s| s.id == piece.id) {
                    self.state.select(Some(pos));
                }
            }
            Ok(Outcome::Rejected(reason)) => self.status = Some(reason.to_string()),
            Err(e) => self.report_error(e),
        }
    }

    /// Returns whether the minutes were recorded.
    fn submit_log(&mut self, id: &PieceId) -> bool {
        if let Ok(minutes) = parse_minutes(&self.input) {
            if minutes > self.max_minutes_per_entry {
                self.status = Some(format!(
                    "Entries are limited to {} minutes",
                    self.max_minutes_per_entry
                ));
                return false;
            }
        }

        match self.store.log_practice(id, &self.input) {
            Ok(Outcome::Applied(total)) => {
                self.pending_minutes.remove(id);
                self.set_input(String::new());
                self.status = Some(format!("Today: {} minutes", total));
                self.reload();
                true
            }
            Ok(Outcome::Rejected(reason)) => {
                self.status = Some(reason.to_string());
                false
            }
            Err(e) => {
                self.report_error(e);
                false
            }
        }
    }

    fn reload(&mut self) {
        self.summaries = self.store.summaries();
    }

    fn report_error(&mut self, e: anyhow::Error) {
        error!(error = %e, "store operation failed");
        self.status = Some(format!("Error: {:#}", e));
    }

    fn set_input(&mut self, text: String) {
        self.cursor_position = text.chars().count();
        self.input = text;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input
            .chars()
            .take(char_index)
            .map(|c| c.len_utf8())
            .sum()
    }
}
