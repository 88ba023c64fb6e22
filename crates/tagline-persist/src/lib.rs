pub mod error;
pub mod jsonl;
pub mod trait_store;

pub use error::PersistError;
pub use jsonl::JsonlCheckpointStore;
pub use trait_store::CheckpointStore;
