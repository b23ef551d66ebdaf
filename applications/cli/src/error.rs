/// CLI error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("Library error: {0}")]
    Library(#[from] cadence_core::CadenceError),
}

pub type Result<T> = std::result::Result<T, CliError>;
