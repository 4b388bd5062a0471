//! CLI error types.

use std::path::PathBuf;

use moin2md_core::{BatchError, TranslateError};

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("translating {name}: {source}")]
    Translate {
        name: String,
        #[source]
        source: TranslateError,
    },

    #[error("{0}")]
    Batch(#[from] BatchError),

    #[error("{0}")]
    Usage(String),

    #[error("{0} page(s) could not be translated")]
    PagesFailed(usize),

    #[error("self-test failed with {0} failure(s)")]
    SelfTest(usize),
}
