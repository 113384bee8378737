//! Errors surfaced by the fallible parts of the lighting crate.

use std::{io, path::PathBuf};

use steel_utils::ChunkPos;

/// Errors raised while loading configuration or decoding persisted lighting data.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum LightingError {
    #[error("failed to access lighting config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse lighting config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("invalid lighting config: {0}")]
    InvalidConfig(&'static str),

    #[error("chunk {chunk}: {field} has {found} entries, expected {expected}")]
    BadLength {
        chunk: ChunkPos,
        field: &'static str,
        found: usize,
        expected: usize,
    },

    #[error("chunk {chunk}: missing {field}")]
    MissingField { chunk: ChunkPos, field: &'static str },

    #[error("chunk {chunk}: {field} has an unexpected tag type")]
    UnexpectedTag { chunk: ChunkPos, field: &'static str },

    #[error("chunk {chunk}: {field} holds out of range value {value}")]
    OutOfRange {
        chunk: ChunkPos,
        field: &'static str,
        value: i64,
    },
}
