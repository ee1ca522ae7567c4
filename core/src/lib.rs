pub mod config;
pub mod input;
pub mod model;
pub mod outcome;
pub mod repository;
pub mod service;
pub mod time;

pub use config::Config;
pub use input::{normalize_name, parse_minutes, resolve_piece};
pub use model::piece::{Piece, PieceId, MAX_PIECES};
pub use model::practice_log::{HistoryEntry, PracticeLog};
pub use outcome::{Outcome, Rejection};
pub use repository::{FileKeyValueRepository, KeyValueRepository, MemoryKeyValueRepository};
pub use service::dto::PieceSummary;
pub use service::practice_store::PracticeStore;
pub use time::{Clock, FixedClock, LocalClock};
