use chatlist_window::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Session closed")]
    SessionClosed,
}
