pub mod error;
pub mod store;

pub use error::DedupError;
pub use store::{build_store, DedupStore, MemoryDedupStore};
