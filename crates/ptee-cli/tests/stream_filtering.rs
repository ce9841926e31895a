//! End-to-end filtering tests.
//!
//! stdout is a pipe under the test harness, so the default strip mode is in
//! effect unless a test passes --no-strip.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_plain_tee_passes_lines_through() {
    cargo_bin_cmd!("ptee")
        .write_stdin("line #1\nline #2\n")
        .assert()
        .success()
        .stdout("line #1\nline #2\n");
}

#[test]
fn test_empty_input_produces_empty_output() {
    cargo_bin_cmd!("ptee")
        .write_stdin("")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_context_lines_collapse_to_last_before_regular() {
    cargo_bin_cmd!("ptee")
        .args(["--regex", "^gcc"])
        .write_stdin("gcc a.c\ngcc b.c\nwarning: x\ngcc c.c\n")
        .assert()
        .success()
        .stdout("gcc b.c\nwarning: x\n");
}

#[test]
fn test_three_level_hierarchy() {
    cargo_bin_cmd!("ptee")
        .args([
            "--level-regex",
            "0",
            "^(x86|x86_64):",
            "--level-regex",
            "1",
            "^Building ",
            "--level-regex",
            "2",
            r"^\[",
        ])
        .write_stdin("x86:\nBuilding c1:\n[compile] f1.o\n[compile] f2.o\nwarn\nx86_64:\n")
        .assert()
        .success()
        .stdout("x86:\nBuilding c1:\n[compile] f2.o\nwarn\n");
}

#[test]
fn test_heading_prints_without_promoting_context() {
    cargo_bin_cmd!("ptee")
        .args(["--level-regex", "2", r"^\[", "--heading-regex", "^-----"])
        .write_stdin("[compile] f1.o\n----- x86 -----\n[compile] f2.o\n")
        .assert()
        .success()
        .stdout("----- x86 -----\n");
}

#[test]
fn test_skip_regex_discards_count_lines() {
    cargo_bin_cmd!("ptee")
        .args(["--level-regex", "2", r"^\[", "--skip-regex", "3", "^system-header"])
        .write_stdin("[compile] f1.o\nsystem-header:1: warn\nin arg\n---^\n[compile] f2.o\nreal warn\n")
        .assert()
        .success()
        .stdout("[compile] f2.o\nreal warn\n");
}

#[test]
fn test_stripped_output_contains_no_carriage_return() {
    cargo_bin_cmd!("ptee")
        .args(["--regex", "^gcc", "--heading-regex", "^=="])
        .write_stdin("gcc a.c\n== stage ==\ngcc b.c\nwarning\ngcc c.c\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\r").not());
}

#[test]
fn test_no_strip_records_status_updates_with_cr() {
    cargo_bin_cmd!("ptee")
        .args(["--no-strip", "--regex", "^gcc"])
        .write_stdin("gcc a.c\nwarning\n")
        .assert()
        .success()
        .stdout("gcc a.c\rgcc a.c\nwarning\n");
}

#[test]
fn test_forced_strip_matches_auto_on_pipe() {
    cargo_bin_cmd!("ptee")
        .args(["--strip", "--regex", "^gcc"])
        .write_stdin("gcc a.c\ngcc b.c\nwarning\n")
        .assert()
        .success()
        .stdout("gcc b.c\nwarning\n");
}

#[test]
fn test_outfile_receives_the_plain_stream() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.log");

    cargo_bin_cmd!("ptee")
        .args(["--regex", "^gcc"])
        .arg(&path)
        .write_stdin("gcc a.c\ngcc b.c\nwarning: x\n")
        .assert()
        .success()
        .stdout("gcc b.c\nwarning: x\n");

    assert_eq!(fs::read_to_string(&path).unwrap(), "gcc b.c\nwarning: x\n");
}

#[test]
fn test_multiple_outfiles_get_identical_copies() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.log");
    let second = dir.path().join("b.log");

    cargo_bin_cmd!("ptee")
        .args(["--regex", "^gcc"])
        .arg(&first)
        .arg(&second)
        .write_stdin("gcc a.c\nwarning\n")
        .assert()
        .success();

    let first = fs::read_to_string(&first).unwrap();
    let second = fs::read_to_string(&second).unwrap();
    assert_eq!(first, "gcc a.c\nwarning\n");
    assert_eq!(first, second);
}

#[test]
fn test_append_keeps_previous_outfile_contents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.log");

    for _ in 0..2 {
        cargo_bin_cmd!("ptee")
            .args(["--append"])
            .arg(&path)
            .write_stdin("run\n")
            .assert()
            .success();
    }

    assert_eq!(fs::read_to_string(&path).unwrap(), "run\nrun\n");
}

#[test]
fn test_outfile_is_truncated_without_append() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.log");
    fs::write(&path, "stale contents\n").unwrap();

    cargo_bin_cmd!("ptee")
        .arg(&path)
        .write_stdin("fresh\n")
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
}

#[test]
fn test_latin1_round_trips_bytes() {
    cargo_bin_cmd!("ptee")
        .args(["--encoding", "latin1"])
        .write_stdin(&b"caf\xe9\n"[..])
        .assert()
        .success()
        .stdout(predicate::eq(&b"caf\xe9\n"[..]));
}

#[test]
fn test_trailing_partial_line_is_flushed_at_eof() {
    cargo_bin_cmd!("ptee")
        .args(["--regex", "^gcc"])
        .write_stdin("gcc a.c\n$ ")
        .assert()
        .success()
        .stdout("gcc a.c\n$ ");
}
