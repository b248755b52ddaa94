//! Error taxonomy for the persistence and consistency subsystem.
//!
//! Every fallible operation in this crate returns one of the variants below;
//! none of them are recovered internally (see the propagation contract in
//! [`crate::tree`]).

use std::path::PathBuf;

use thiserror::Error;

/// The single error type surfaced by [`crate::tree::Tree`], the snapshot
/// codec, the write-ahead log, and [`crate::runtime::StorageRuntime`].
#[derive(Debug, Error)]
pub enum Error {
    /// The path was empty, whitespace-only, or split into zero non-empty
    /// segments.
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A walk needed a node that does not exist.
    #[error("path not found: `{path}`")]
    PathNotFound { path: String },

    /// Strict mode forbids auto-creating intermediate nodes.
    #[error("strict mode forbids creating intermediate nodes for `{path}`")]
    StrictMode { path: String },

    /// An interior/leaf exclusivity violation: assigning to an interior node,
    /// or deleting the root.
    #[error("node structure violation at `{path}`: {reason}")]
    NodeStructure { path: String, reason: String },

    /// Malformed `load_dict` input, a malformed snapshot, an unsupported
    /// scalar kind, or an unrecognized WAL `op`.
    #[error("invalid format: {reason}")]
    InvalidFormat { reason: String },

    /// An underlying I/O failure while touching a snapshot or WAL file.
    #[error("I/O error accessing `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
