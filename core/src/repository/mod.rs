pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileKeyValueRepository;
pub use memory::MemoryKeyValueRepository;
pub use traits::{KeyValueRepository, PIECES_KEY, PRACTICE_LOG_KEY};
