//! Destroy-then-copy mirroring.
//!
//! ## `mirror` — 4-step protocol
//!
//! 1. Check the source is an existing directory.
//! 2. Check source and replica do not overlap.
//! 3. Remove whatever sits at the replica path.
//! 4. Copy the source tree into the replica path, following symlinks.
//!
//! Symlinks are followed, so step 4 refuses any directory whose canonical path
//! is one being copied or lies inside the replica; either would recurse
//! without end.
//!
//! Steps 1 and 2 only read the filesystem, so a failed pre-flight check leaves
//! the previous replica intact. Steps 3 and 4 are not atomic: a reader that
//! looks at the replica mid-cycle can see it empty or half-populated.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use replica_core::{ensure_disjoint, ensure_source_dir};

use crate::error::{io_err, MirrorError};

// ---------------------------------------------------------------------------
// mirror
// ---------------------------------------------------------------------------

/// Make `replica` an exact copy of `source`.
///
/// On error the replica is left in whatever state the failing step reached;
/// the next call starts from scratch anyway.
pub fn mirror(source: &Path, replica: &Path) -> Result<(), MirrorError> {
    ensure_source_dir(source)?;
    ensure_disjoint(source, replica)?;

    clear_replica(replica)?;
    tracing::debug!("cleared replica: {}", replica.display());

    fs::create_dir_all(replica).map_err(|e| io_err("create directory", replica, e))?;
    let replica_root = fs::canonicalize(replica).map_err(|e| io_err("resolve", replica, e))?;

    let mut walk = Walk {
        replica_root,
        ancestors: Vec::new(),
    };
    copy_dir(source, replica, &mut walk)?;
    tracing::debug!("copied {} -> {}", source.display(), replica.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

/// Remove the replica. Missing is fine; a file or symlink at the replica path
/// is removed as a single entry so a link target is never followed.
fn clear_replica(replica: &Path) -> Result<(), MirrorError> {
    let meta = match fs::symlink_metadata(replica) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(io_err("inspect", replica, err)),
    };

    if !meta.is_dir() {
        return fs::remove_file(replica).map_err(|e| io_err("remove", replica, e));
    }

    match fs::remove_dir_all(replica) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            // Read-only directories copied from a read-only source last cycle.
            restore_write_access(replica)?;
            fs::remove_dir_all(replica).map_err(|e| io_err("remove", replica, e))
        }
        Err(err) => Err(io_err("remove", replica, err)),
    }
}

#[cfg(unix)]
fn restore_write_access(dir: &Path) -> Result<(), MirrorError> {
    use std::os::unix::fs::PermissionsExt;

    let meta = fs::symlink_metadata(dir).map_err(|e| io_err("inspect", dir, e))?;
    if !meta.is_dir() {
        return Ok(());
    }

    let mut perms = meta.permissions();
    perms.set_mode(perms.mode() | 0o700);
    fs::set_permissions(dir, perms).map_err(|e| io_err("set permissions on", dir, e))?;

    let entries = fs::read_dir(dir).map_err(|e| io_err("read directory", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err("read directory", dir, e))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            restore_write_access(&entry.path())?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn restore_write_access(_dir: &Path) -> Result<(), MirrorError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Copy
// ---------------------------------------------------------------------------

/// Traversal state shared by every level of [`copy_dir`].
struct Walk {
    /// Canonical replica root; a source directory under it is being written
    /// while it is read.
    replica_root: PathBuf,
    /// Canonical paths of the directories currently being copied.
    ancestors: Vec<PathBuf>,
}

/// Recursively copy `source` into `target`.
fn copy_dir(source: &Path, target: &Path, walk: &mut Walk) -> Result<(), MirrorError> {
    let canonical = fs::canonicalize(source).map_err(|e| io_err("resolve", source, e))?;
    if walk.ancestors.contains(&canonical) || canonical.starts_with(&walk.replica_root) {
        return Err(MirrorError::SymlinkCycle {
            path: source.to_path_buf(),
        });
    }
    walk.ancestors.push(canonical);

    fs::create_dir_all(target).map_err(|e| io_err("create directory", target, e))?;

    for (name, path) in sorted_entries(source)? {
        let dest = target.join(&name);
        // `metadata` follows symlinks; a dangling link fails here.
        let meta = fs::metadata(&path).map_err(|e| io_err("read metadata of", &path, e))?;
        if meta.is_dir() {
            copy_dir(&path, &dest, walk)?;
        } else if meta.is_file() {
            copy_file(&path, &dest, &meta)?;
        } else {
            return Err(MirrorError::UnsupportedEntry { path });
        }
    }

    walk.ancestors.pop();

    // Directory metadata goes last so a read-only source directory does not
    // block writing its own children.
    let meta = fs::metadata(source).map_err(|e| io_err("read metadata of", source, e))?;
    fs::set_permissions(target, meta.permissions())
        .map_err(|e| io_err("set permissions on", target, e))?;
    copy_times(target, &meta)
}

fn copy_file(source: &Path, target: &Path, meta: &fs::Metadata) -> Result<(), MirrorError> {
    fs::copy(source, target).map_err(|e| io_err("copy", source, e))?;
    copy_times(target, meta)
}

fn copy_times(target: &Path, meta: &fs::Metadata) -> Result<(), MirrorError> {
    let atime = FileTime::from_last_access_time(meta);
    let mtime = FileTime::from_last_modification_time(meta);
    filetime::set_file_times(target, atime, mtime)
        .map_err(|e| io_err("set timestamps on", target, e))
}

fn sorted_entries(dir: &Path) -> Result<Vec<(OsString, PathBuf)>, MirrorError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| io_err("read directory", dir, e))? {
        let entry = entry.map_err(|e| io_err("read directory", dir, e))?;
        entries.push((entry.file_name(), entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}
