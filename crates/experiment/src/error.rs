use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures the experiment can hit. All I/O variants are fatal: without a
/// writable session file there is no experiment to run, so nothing here is
/// retried.
#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("failed to prepare data directory {path:?}")]
    DataDir {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to open session file {path:?}")]
    OpenSession {
        path: PathBuf,
        source: io::Error,
    },
    #[error("session write failed")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}
