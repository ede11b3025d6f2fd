// In crates/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Price feed failed: {0}")]
    Feed(#[from] api_client::Error),

    #[error(transparent)]
    Strategy(#[from] strategies::Error),

    #[error(transparent)]
    Price(#[from] core_types::Error),

    #[error("The runner has stopped")]
    RunnerStopped,
}

pub type Result<T> = std::result::Result<T, Error>;
