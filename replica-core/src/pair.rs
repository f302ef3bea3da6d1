//! The source/replica pair.
//!
//! Paths are made absolute and lexically normalised once, at resolve time, so
//! every log line names the same folder regardless of the caller's working
//! directory. Overlap checks go one step further and compare canonical forms,
//! which catches two spellings of one directory through a symlinked prefix.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::PairError;

// ---------------------------------------------------------------------------
// SyncPair
// ---------------------------------------------------------------------------

/// A resolved source/replica pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPair {
    source: PathBuf,
    replica: PathBuf,
}

impl SyncPair {
    /// Make both paths absolute against the current directory and fold away
    /// `.` and `..` components. Nothing on disk is checked here.
    pub fn resolve(
        source: impl AsRef<Path>,
        replica: impl AsRef<Path>,
    ) -> Result<Self, PairError> {
        Ok(Self {
            source: absolute_normalized(source.as_ref())?,
            replica: absolute_normalized(replica.as_ref())?,
        })
    }

    /// Absolute path of the tree being copied from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Absolute path of the tree being overwritten.
    pub fn replica(&self) -> &Path {
        &self.replica
    }

    /// Check that the source is an existing directory and that neither path
    /// contains the other.
    pub fn validate(&self) -> Result<(), PairError> {
        ensure_source_dir(&self.source)?;
        ensure_disjoint(&self.source, &self.replica)
    }

    /// Fail if `log_file` lies under the source or the replica.
    pub fn ensure_log_outside(&self, log_file: &Path) -> Result<(), PairError> {
        let log_cmp = comparison_form(&absolute_normalized(log_file)?);
        for folder in [&self.source, &self.replica] {
            if log_cmp.starts_with(comparison_form(folder)) {
                return Err(PairError::LogFileInsideFolder {
                    log_file: log_file.to_path_buf(),
                    folder: folder.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for SyncPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source.display(), self.replica.display())
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Fail unless `path` is an existing directory (symlinks are followed).
pub fn ensure_source_dir(path: &Path) -> Result<(), PairError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PairError::SourceNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(PairError::SourceNotFound {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(PairError::Resolve {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Fail if `source` and `replica` are the same directory or one is nested
/// inside the other.
pub fn ensure_disjoint(source: &Path, replica: &Path) -> Result<(), PairError> {
    let source_cmp = comparison_form(&absolute_normalized(source)?);
    let replica_cmp = comparison_form(&absolute_normalized(replica)?);

    if source_cmp == replica_cmp {
        return Err(PairError::SameFolder {
            path: source.to_path_buf(),
        });
    }
    if replica_cmp.starts_with(&source_cmp) {
        return Err(PairError::ReplicaInsideSource {
            source_dir: source.to_path_buf(),
            replica_dir: replica.to_path_buf(),
        });
    }
    if source_cmp.starts_with(&replica_cmp) {
        return Err(PairError::SourceInsideReplica {
            source_dir: source.to_path_buf(),
            replica_dir: replica.to_path_buf(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn absolute_normalized(path: &Path) -> Result<PathBuf, PairError> {
    let absolute = std::path::absolute(path).map_err(|source| PairError::Resolve {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_lexically(&absolute))
}

/// Drop `.` components and fold `..` into the preceding component.
/// `..` at the root stays at the root.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalise the deepest ancestor that exists and re-attach the rest.
///
/// The replica usually does not exist yet on the first run, so a plain
/// `canonicalize` is not enough.
fn comparison_form(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut tail: Vec<OsString> = Vec::new();
    loop {
        if let Ok(mut resolved) = fs::canonicalize(existing) {
            for part in tail.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
