//! Error taxonomy of the translator.
//!
//! `RuleMismatch` is what a single grammar rule returns when it cannot match;
//! the parser recovers from it by trying the next alternative. Whatever
//! escapes `translate` is a `TranslateError`.

use std::fmt;
use std::path::PathBuf;

use crate::parser::Rule;

/// A grammar rule did not match at `offset` (byte offset into the source).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{rule} does not match at byte {offset}")]
pub struct RuleMismatch {
    pub rule: Rule,
    pub offset: usize,
}

/// Why a whole page could not be translated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("unrecognized construct at line {line}, column {column}: {remaining:?}")]
    UnrecognizedConstruct {
        offset: usize,
        line: usize,
        column: usize,
        remaining: String,
    },

    #[error("{rule} opened at line {line}, column {column} but could not be completed: {remaining:?}")]
    StructuralInconsistency {
        rule: Rule,
        offset: usize,
        line: usize,
        column: usize,
        remaining: String,
    },

    #[error("unsupported construct ({construct}) at line {line}, column {column}")]
    UnsupportedConstruct {
        construct: Unsupported,
        offset: usize,
        line: usize,
        column: usize,
    },
}

impl TranslateError {
    /// Byte offset into the (normalized) source where translation stopped.
    pub fn offset(&self) -> usize {
        match self {
            TranslateError::UnrecognizedConstruct { offset, .. }
            | TranslateError::StructuralInconsistency { offset, .. }
            | TranslateError::UnsupportedConstruct { offset, .. } => *offset,
        }
    }
}

/// Legacy constructs the grammar deliberately leaves unimplemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    Table,
    OrderedList,
    BoldItalic,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Unsupported::Table => "table",
            Unsupported::OrderedList => "ordered list",
            Unsupported::BoldItalic => "bold/italic text",
        };
        f.write_str(name)
    }
}

/// Failure of the directory driver.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Translate(#[from] TranslateError),
}

impl BatchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BatchError::Io {
            path: path.into(),
            source,
        }
    }
}
