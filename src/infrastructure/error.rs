//! Infrastructure-level errors (wraps application errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::application::ApplicationError;

/// Application errors plus failures of the process's own outputs.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("cannot write to stdout")]
    Stdout(#[source] std::io::Error),

    #[error("cannot create config file {}", path.display())]
    ConfigInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
