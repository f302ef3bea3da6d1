use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn replica_bin_path() -> PathBuf {
    assert_cmd::cargo::cargo_bin("replica")
}

/// A running `replica` process that is killed when dropped.
struct SyncProcess {
    child: Child,
}

impl SyncProcess {
    fn start(source: &Path, replica: &Path, interval: u64, log_file: &Path) -> Self {
        let child = Command::new(replica_bin_path())
            .arg(source)
            .arg(replica)
            .arg(interval.to_string())
            .arg(log_file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn replica");
        Self { child }
    }

    fn still_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}

impl Drop for SyncProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(100));
    }
    false
}

fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Startup failures
// ---------------------------------------------------------------------------

#[test]
fn missing_source_exits_1_without_creating_log() {
    let root = TempDir::new().unwrap();
    let log_file = root.path().join("logs").join("sync.log");

    Command::new(replica_bin_path())
        .arg(root.path().join("does-not-exist"))
        .arg(root.path().join("replica"))
        .arg("5")
        .arg(&log_file)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Error: Source folder not found:"))
        .stdout(predicate::str::contains("does-not-exist"));

    assert!(!log_file.exists(), "no log file on fatal startup error");
    assert!(!root.path().join("logs").exists(), "no log dir either");
    assert!(!root.path().join("replica").exists());
}

#[test]
fn startup_prints_absolute_paths() {
    let root = TempDir::new().unwrap();
    let cwd = fs::canonicalize(root.path()).unwrap();

    Command::new(replica_bin_path())
        .current_dir(&cwd)
        .args(["missing-src", "./some-replica", "5", "sync.log"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(format!(
            "Source Folder: {}",
            cwd.join("missing-src").display()
        )))
        .stdout(predicate::str::contains(format!(
            "Replica Folder: {}",
            cwd.join("some-replica").display()
        )));
}

#[test]
fn replica_inside_source_is_rejected_at_startup() {
    let root = TempDir::new().unwrap();
    let source = root.path().join("source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("keep.txt"), "keep").unwrap();
    let log_file = root.path().join("sync.log");

    Command::new(replica_bin_path())
        .arg(&source)
        .arg(source.join("nested-replica"))
        .arg("5")
        .arg(&log_file)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("is inside source folder"));

    assert!(!log_file.exists());
    assert_eq!(fs::read_to_string(source.join("keep.txt")).unwrap(), "keep");
}

#[test]
fn same_source_and_replica_is_rejected_at_startup() {
    let root = TempDir::new().unwrap();
    let source = root.path().join("source");
    fs::create_dir_all(&source).unwrap();

    Command::new(replica_bin_path())
        .arg(&source)
        .arg(&source)
        .arg("5")
        .arg(root.path().join("sync.log"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("are the same folder"));
}

#[test]
fn log_file_inside_replica_or_source_is_rejected_at_startup() {
    let root = TempDir::new().unwrap();
    let source = root.path().join("source");
    fs::create_dir_all(&source).unwrap();
    let replica = root.path().join("replica");

    for log_file in [replica.join("sync.log"), source.join("sync.log")] {
        Command::new(replica_bin_path())
            .arg(&source)
            .arg(&replica)
            .arg("5")
            .arg(&log_file)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("is inside synchronized folder"));

        assert!(!log_file.exists());
    }
    assert!(!replica.exists());
}

#[test]
fn bad_interval_is_a_usage_error() {
    let root = TempDir::new().unwrap();

    Command::new(replica_bin_path())
        .arg(root.path())
        .arg(root.path().join("replica"))
        .arg("often")
        .arg(root.path().join("sync.log"))
        .assert()
        .code(2);
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

#[test]
fn running_process_mirrors_and_logs_each_cycle() {
    let root = TempDir::new().unwrap();
    let source = root.path().join("source");
    fs::create_dir_all(source.join("sub")).unwrap();
    fs::write(source.join("a.txt"), "hello").unwrap();
    fs::write(source.join("sub").join("b.txt"), "world").unwrap();

    let replica = root.path().join("replica");
    fs::create_dir_all(&replica).unwrap();
    fs::write(replica.join("stale.txt"), "stale").unwrap();

    let log_file = root.path().join("logs").join("nested").join("sync.log");

    let mut process = SyncProcess::start(&source, &replica, 1, &log_file);

    // Initial sync plus the first bracketed cycle.
    let synced = wait_until(Duration::from_secs(10), || {
        read_log(&log_file)
            .matches("Folder synchronization complete")
            .count()
            >= 2
    });
    assert!(synced, "no sync logged in time; log: {}", read_log(&log_file));
    assert!(process.still_running(), "replica must keep running after a cycle");

    // Polled so a read never lands in the middle of a later cycle.
    let mirrored = wait_until(Duration::from_secs(10), || {
        fs::read_to_string(replica.join("a.txt")).ok().as_deref() == Some("hello")
            && fs::read_to_string(replica.join("sub").join("b.txt")).ok().as_deref()
                == Some("world")
            && !replica.join("stale.txt").exists()
    });
    assert!(mirrored, "replica does not match source");

    // A change in the source shows up after the next interval.
    fs::write(source.join("c.txt"), "new").unwrap();
    let picked_up = wait_until(Duration::from_secs(10), || {
        fs::read_to_string(replica.join("c.txt")).ok().as_deref() == Some("new")
    });
    assert!(picked_up, "source change not mirrored");

    let log = read_log(&log_file);
    let line = predicate::str::is_match(
        r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3} - (INFO|WARN|ERROR): .+$",
    )
    .unwrap();
    // The process keeps writing; ignore a trailing line that may be half done.
    let complete = &log[..log.rfind('\n').map_or(0, |i| i + 1)];
    for entry in complete.lines() {
        assert!(line.eval(entry), "malformed log line: {entry:?}");
    }
    assert!(log.contains("INFO: Starting periodic synchronization..."));
    assert!(log.contains("INFO: Periodic synchronization complete."));
}

#[test]
fn source_vanishing_mid_run_is_logged_and_not_fatal() {
    let root = TempDir::new().unwrap();
    let source = root.path().join("source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("a.txt"), "hello").unwrap();
    let replica = root.path().join("replica");
    let log_file = root.path().join("sync.log");

    let mut process = SyncProcess::start(&source, &replica, 2, &log_file);

    // The initial sync and the first cycle run back to back; after the second
    // completion the process is sleeping and the source can go.
    assert!(wait_until(Duration::from_secs(10), || {
        read_log(&log_file)
            .matches("Folder synchronization complete")
            .count()
            >= 2
    }));

    fs::remove_dir_all(&source).unwrap();

    let logged = wait_until(Duration::from_secs(10), || {
        read_log(&log_file).contains("ERROR: Source Folder not Found")
    });
    assert!(logged, "log: {}", read_log(&log_file));
    assert!(process.still_running(), "a failed cycle must not stop the process");
    assert_eq!(fs::read_to_string(replica.join("a.txt")).unwrap(), "hello");
}
