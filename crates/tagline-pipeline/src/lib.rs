pub mod error;
pub mod fetcher;
pub mod key_pool;
pub mod scheduler;

pub use error::PipelineError;
pub use fetcher::RetryingFetcher;
pub use key_pool::{KeyPool, PoolExhausted};
pub use scheduler::{RunReport, RunStats, Scheduler};
