//! Several writers sharing one log file, across threads and processes

use project_worker_logging::handler::{Handler, RotatingFileHandler, rotated_path};
use project_worker_logging::{CallSite, Level, LogRecord};
use serde_json::Value;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use tempfile::TempDir;

const CHILD_LOG_ENV: &str = "PW_TEST_CHILD_LOG";
const CHILD_ID_ENV: &str = "PW_TEST_CHILD_ID";
const RECORDS_PER_WRITER: usize = 200;
const MAX_BYTES: u64 = 16 * 1024;
const BACKUPS: u32 = 100;

fn write_records(path: &Path, writer: &str) {
    let handler = RotatingFileHandler::json(path)
        .unwrap()
        .with_limits(MAX_BYTES, BACKUPS);
    for i in 0..RECORDS_PER_WRITER {
        let record = LogRecord::new(
            "concurrent",
            Level::Info,
            format!("{writer}:{i}\nsecond line of {writer}:{i}").into(),
            CallSite::new(file!(), line!(), "write_records"),
        );
        handler.emit(&record).unwrap();
    }
}

/// Every line in the base file and its backups, parsed
fn collect_records(path: &Path) -> Vec<Value> {
    let mut files: Vec<PathBuf> = vec![path.to_path_buf()];
    files.extend((1..=BACKUPS).map(|i| rotated_path(path, i)).filter(|p| p.exists()));

    let mut records = Vec::new();
    for file in files {
        for line in fs::read_to_string(&file).unwrap().lines() {
            let value: Value = serde_json::from_str(line)
                .unwrap_or_else(|e| panic!("corrupt line in {}: {e}: {line}", file.display()));
            records.push(value);
        }
    }
    records
}

fn assert_complete(records: &[Value], writers: &[String]) {
    assert_eq!(records.len(), writers.len() * RECORDS_PER_WRITER);
    let seen: HashSet<String> = records
        .iter()
        .map(|r| r["message"].as_str().unwrap().to_string())
        .collect();
    for writer in writers {
        for i in 0..RECORDS_PER_WRITER {
            assert!(seen.contains(&format!("{writer}:{i}\nsecond line of {writer}:{i}")));
        }
    }
}

#[test]
fn test_threads_with_independent_handlers() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shared.log");
    let writers: Vec<String> = (0..4).map(|i| format!("thread-{i}")).collect();

    let handles: Vec<_> = writers
        .iter()
        .cloned()
        .map(|writer| {
            let path = path.clone();
            thread::spawn(move || write_records(&path, &writer))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let records = collect_records(&path);
    assert_complete(&records, &writers);
    assert!(rotated_path(&path, 1).exists());
}

/// Body of each child process spawned by `test_separate_processes`; a
/// no-op when run directly.
#[test]
fn child_writer() {
    let (Ok(path), Ok(id)) = (env::var(CHILD_LOG_ENV), env::var(CHILD_ID_ENV)) else {
        return;
    };
    write_records(Path::new(&path), &id);
}

#[test]
fn test_separate_processes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("processes.log");
    let exe = env::current_exe().unwrap();
    let writers: Vec<String> = (0..3).map(|i| format!("process-{i}")).collect();

    let children: Vec<_> = writers
        .iter()
        .map(|writer| {
            Command::new(&exe)
                .args(["--exact", "child_writer", "--test-threads=1"])
                .env(CHILD_LOG_ENV, &path)
                .env(CHILD_ID_ENV, writer)
                .spawn()
                .unwrap()
        })
        .collect();
    for mut child in children {
        assert!(child.wait().unwrap().success());
    }

    let records = collect_records(&path);
    assert_complete(&records, &writers);
}
