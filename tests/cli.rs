#![cfg(feature = "cli")]

mod common;

use common::id_name_file;
use std::path::Path;
use std::process::Command;

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("items.xlsx");
    std::fs::write(&path, id_name_file().bytes).unwrap();
    path
}

fn qrsheet() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_qrsheet"));
    command.env_remove("QRSHEET_FIELD").env_remove("QRSHEET_OUTPUT");
    command
}

#[test]
fn show_prints_rows_with_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path());

    let output = qrsheet()
        .args(["show", "--field", "Name"])
        .arg(&input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["ID\tName\tQR Code", "A1\tX\tX", "A2\tY\tY"]);
}

#[test]
fn field_can_come_from_the_environment() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path());

    let output = qrsheet()
        .env("QRSHEET_FIELD", "ID")
        .args(["show", "--json"])
        .arg(&input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["rows"][0]["payload"], "A1");
    assert_eq!(view["rows"][1]["payload"], "A2");
}

#[test]
fn export_writes_the_image() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path());
    let out_dir = dir.path().join("out");

    let status = qrsheet()
        .args(["export", "--field", "ID", "--output-dir"])
        .arg(&out_dir)
        .arg(&input)
        .status()
        .unwrap();

    assert!(status.success());
    assert!(out_dir.join("qrcode-list.png").is_file());
}

#[test]
fn out_of_range_sizes_are_rejected_by_the_parser() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path());

    for args in [
        ["export", "--scale", "0"],
        ["export", "--scale", "10000000"],
        ["export", "--code-size", "4294967295"],
    ] {
        let output = qrsheet()
            .args(args)
            .arg("--output-dir")
            .arg(dir.path())
            .arg(&input)
            .output()
            .unwrap();
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("--"), "{args:?}: {stderr}");
        assert!(!output.status.success(), "{args:?} should fail");
        assert!(!dir.path().join("qrcode-list.png").exists());
    }
}

#[test]
fn unreadable_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("junk.xlsx");
    std::fs::write(&input, b"junk").unwrap();

    let output = qrsheet().arg("show").arg(&input).output().unwrap();

    assert!(!output.status.success());
}
