//! Context helpers for fallible steps outside the domain.

use std::error::Error;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Wraps foreign errors (I/O, directory walks, serialization) into
/// [`ApplicationError::OperationFailed`] with a short description.
pub trait ResultExt<T> {
    /// `"<action>: <path>"` as context, e.g. `read input: cases/u1.json`.
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;

    fn with_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.with_context(&format!("{}: {}", action, path.display()))
    }

    fn with_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: action.to_string(),
            source: Box::new(e),
        })
    }
}
