//! CLI tests for `veriformat format` and `veriformat init`

#![cfg(unix)]
#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// A project directory with a `.git` boundary and a fake formatter
fn project(script: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();

    let formatter = dir.path().join("fake-verible");
    fs::write(&formatter, format!("#!/bin/sh\n{script}\n")).unwrap();
    let mut permissions = fs::metadata(&formatter).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&formatter, permissions).unwrap();

    (dir, formatter)
}

fn veriformat(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("veriformat").unwrap();
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
#[serial]
fn test_format_prints_formatter_output() {
    let (dir, formatter) = project("tr 'a-z' 'A-Z'");
    fs::write(dir.path().join("top.sv"), "module top;\nendmodule\n").unwrap();

    veriformat(dir.path())
        .args(["format", "top.sv", "--path"])
        .arg(&formatter)
        .assert()
        .success()
        .stdout("MODULE TOP;\nENDMODULE\n");
}

#[test]
#[serial]
fn test_format_reads_path_from_project_config() {
    let (dir, formatter) = project("tr 'a-z' 'A-Z'");
    fs::write(
        dir.path().join(".veriformat.toml"),
        format!("path = \"{}\"\n", formatter.display()),
    )
    .unwrap();
    fs::write(dir.path().join("top.sv"), "module top;\n").unwrap();

    veriformat(dir.path())
        .args(["format", "top.sv"])
        .assert()
        .success()
        .stdout("MODULE TOP;\n");
}

#[test]
#[serial]
fn test_format_in_place_rewrites_file() {
    let (dir, formatter) = project("tr 'a-z' 'A-Z'");
    let file = dir.path().join("top.sv");
    fs::write(&file, "module top;\n").unwrap();

    veriformat(dir.path())
        .args(["format", "--in-place", "top.sv", "--path"])
        .arg(&formatter)
        .assert()
        .success()
        .stdout("");

    assert_eq!(fs::read_to_string(&file).unwrap(), "MODULE TOP;\n");
}

#[test]
#[serial]
fn test_format_from_stdin() {
    let (dir, formatter) = project("tr 'a-z' 'A-Z'");

    veriformat(dir.path())
        .args(["format", "-", "--stdin-filename", "rtl/top.sv", "--path"])
        .arg(&formatter)
        .write_stdin("wire a;\n")
        .assert()
        .success()
        .stdout("WIRE A;\n");
}

#[test]
#[serial]
fn test_syntax_error_exits_with_one() {
    let (dir, formatter) = project("cat >/dev/null\necho '<stdin>:2:5: syntax error at token \"x\"' >&2\nexit 1");
    fs::write(dir.path().join("top.sv"), "module top;\n  x\nendmodule\n").unwrap();

    veriformat(dir.path())
        .args(["format", "top.sv", "--path"])
        .arg(&formatter)
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("top.sv:2:5:").and(predicate::str::contains("syntax error at token")));
}

#[test]
#[serial]
fn test_unparseable_failure_exits_with_two() {
    let (dir, formatter) = project("cat >/dev/null\necho 'segmentation fault' >&2\nexit 139");
    fs::write(dir.path().join("top.sv"), "module top;\n").unwrap();

    veriformat(dir.path())
        .args(["format", "top.sv", "--path"])
        .arg(&formatter)
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("Formatting failed")
                .and(predicate::str::contains("exit code=139"))
                .and(predicate::str::contains("segmentation fault")),
        );
}

#[test]
#[serial]
fn test_missing_executable_exits_with_two() {
    let (dir, _) = project("exit 0");
    fs::write(dir.path().join("top.sv"), "module top;\n").unwrap();

    veriformat(dir.path())
        .args(["format", "top.sv", "--path", "no-such-verible-binary"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Executable \"no-such-verible-binary\" not found."));
}

#[test]
#[serial]
fn test_lines_and_flagfile_reach_formatter() {
    let (dir, formatter) = project("cat >/dev/null\nprintf '%s\\n' \"$@\"");
    fs::write(dir.path().join("style.flags"), "--column_limit=120\n").unwrap();
    fs::write(dir.path().join("top.sv"), "module top;\nwire a;\nendmodule\n").unwrap();

    let flagfile = dir.path().join("style.flags");
    veriformat(dir.path())
        .args(["format", "top.sv", "--lines", "2-3", "--flagfile", "style.flags", "--path"])
        .arg(&formatter)
        .assert()
        .success()
        .stdout(format!(
            "--failsafe_success=false\n--flagfile={}\n--lines=2-3\n-\n",
            flagfile.display()
        ));
}

#[test]
#[serial]
fn test_missing_flagfile_warns() {
    let (dir, formatter) = project("cat");
    fs::write(dir.path().join("top.sv"), "module top;\n").unwrap();

    veriformat(dir.path())
        .args(["format", "top.sv", "--flagfile", "absent.flags", "--path"])
        .arg(&formatter)
        .assert()
        .success()
        .stdout("module top;\n")
        .stderr(predicate::str::contains("Flagfile \"absent.flags\" not found."));
}

#[test]
#[serial]
fn test_timeout_exits_with_two() {
    let (dir, formatter) = project("sleep 5");
    fs::write(dir.path().join("top.sv"), "module top;\n").unwrap();

    veriformat(dir.path())
        .args(["format", "top.sv", "--timeout-ms", "200", "--path"])
        .arg(&formatter)
        .timeout(std::time::Duration::from_secs(4))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Formatting failed:"));
}

#[test]
fn test_invalid_line_span_is_rejected() {
    let dir = tempdir().unwrap();

    veriformat(dir.path())
        .args(["format", "top.sv", "--lines", "5-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("START <= END"));
}

#[test]
fn test_init_creates_config_once() {
    let dir = tempdir().unwrap();

    veriformat(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created default configuration file"));

    let content = fs::read_to_string(dir.path().join(".veriformat.toml")).unwrap();
    assert!(content.contains("timeout-ms = 30000"));

    veriformat(dir.path())
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_version_command() {
    let dir = tempdir().unwrap();

    veriformat(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("veriformat "));
}
