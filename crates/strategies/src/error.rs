// In crates/strategies/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Unknown strategy id: {0}")]
    UnknownStrategy(String),

    #[error("Invalid generator settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, Error>;
