//! Error types for replica-core.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can make a source/replica pair unusable.
#[derive(Debug, Error)]
pub enum PairError {
    /// The path could not be made absolute or inspected.
    #[error("cannot resolve path {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Nothing exists at the source path.
    #[error("Source folder not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The source path exists but is a file or some other non-directory.
    #[error("Source folder is not a directory: {path}")]
    SourceNotDirectory { path: PathBuf },

    /// Source and replica resolve to the same directory.
    #[error("source and replica are the same folder: {path}")]
    SameFolder { path: PathBuf },

    /// Replica lives somewhere under the source tree.
    #[error("replica folder {replica_dir} is inside source folder {source_dir}")]
    ReplicaInsideSource {
        source_dir: PathBuf,
        replica_dir: PathBuf,
    },

    /// Source lives somewhere under the replica tree; clearing the replica would destroy it.
    #[error("source folder {source_dir} is inside replica folder {replica_dir}")]
    SourceInsideReplica {
        source_dir: PathBuf,
        replica_dir: PathBuf,
    },

    /// The log file would be deleted with the replica or copied with the source.
    #[error("log file {log_file} is inside synchronized folder {folder}")]
    LogFileInsideFolder { log_file: PathBuf, folder: PathBuf },
}
