use tagline_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The selected provider cannot run with the current settings
    #[error("Provider configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
