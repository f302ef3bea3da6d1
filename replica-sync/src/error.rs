//! Error types for replica-sync.

use std::path::PathBuf;

use thiserror::Error;

use replica_core::PairError;

/// All errors that can abandon a mirror cycle.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The pair failed its pre-flight check; nothing was touched.
    #[error(transparent)]
    Pair(#[from] PairError),

    /// An I/O error, annotated with what was being done and to which path.
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Following symlinks led back into a directory that is already being
    /// copied, or into the replica being written.
    #[error("symlink cycle detected at {path}")]
    SymlinkCycle { path: PathBuf },

    /// A FIFO, socket or device node; only files and directories are copied.
    #[error("unsupported file type at {path}")]
    UnsupportedEntry { path: PathBuf },
}

/// Convenience constructor for [`MirrorError::Io`].
pub(crate) fn io_err(
    action: &'static str,
    path: impl Into<PathBuf>,
    source: std::io::Error,
) -> MirrorError {
    MirrorError::Io {
        action,
        path: path.into(),
        source,
    }
}
