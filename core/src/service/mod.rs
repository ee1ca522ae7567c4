pub mod dto;
pub mod practice_store;
