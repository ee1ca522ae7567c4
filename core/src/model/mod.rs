pub mod piece;
pub mod practice_log;
