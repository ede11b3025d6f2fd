// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Invalid price value: {0}")]
    InvalidPrice(String),
}

pub type Result<T> = std::result::Result<T, Error>;
