//! Error types shared by every pipeline stage

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Which kind of callback a registry lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Predicate,
    Mapper,
    Reducer,
}

impl CallbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackKind::Predicate => "predicate",
            CallbackKind::Mapper => "mapper",
            CallbackKind::Reducer => "reducer",
        }
    }
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Stat, read_dir or read failed while building a tree. Aborts the walk.
    #[error("cannot access '{}': {source}", path.display())]
    FilesystemAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input document is malformed or does not match the node schema.
    #[error("invalid tree document: {0}")]
    Validation(String),

    /// No callback of the requested kind is registered under that name.
    #[error("unknown {kind} '{name}'")]
    CallbackResolution { kind: CallbackKind, name: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::FilesystemAccess {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Validation(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Validation(e.to_string())
    }
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(e: yaml_rust2::ScanError) -> Self {
        Error::Validation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
