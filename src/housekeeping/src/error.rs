//! Error types for inventory housekeeping

use std::path::PathBuf;

use common::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HousekeepingError>;

#[derive(Error, Debug)]
pub enum HousekeepingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HousekeepingError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HousekeepingError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Attach the offending path to an I/O result.
pub(crate) trait IoContext<T> {
    fn at(self, path: &std::path::Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| HousekeepingError::io(path, e))
    }
}
