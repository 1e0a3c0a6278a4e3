use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures").join(name)
}

#[derive(Debug, Serialize, Deserialize)]
struct ReplaySummary {
    pages: usize,
    annotations: usize,
    can_undo: bool,
    can_redo: bool,
}

fn pagemark(data_dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("pagemark");
    cmd.env_remove("PAGEMARK_AUTOSAVE").arg("--data-dir").arg(data_dir);
    cmd
}

fn stdout_of(cmd: &mut assert_cmd::Command) -> Vec<u8> {
    cmd.assert().success().get_output().stdout.clone()
}

fn list(data_dir: &Path) -> Value {
    let output = stdout_of(pagemark(data_dir).arg("list"));
    serde_json::from_slice(&output).expect("stdout should contain valid json")
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("pagemark")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn labels_emits_stable_json_contract() {
    let output = cargo_bin_cmd!("pagemark")
        .args(["labels", "--category", "Balance Information"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Vec<BTreeMap<String, String>> =
        serde_json::from_slice(&output).expect("stdout should contain valid json");

    insta::assert_json_snapshot!("labels_balance_information", value);
}

#[test]
fn labels_lists_whole_catalog() {
    let output = stdout_of(cargo_bin_cmd!("pagemark").arg("labels"));
    let value: Vec<Value> = serde_json::from_slice(&output).expect("stdout should be json");
    assert_eq!(value.len(), 32);
}

#[test]
fn labels_fails_for_unknown_category() {
    cargo_bin_cmd!("pagemark")
        .args(["labels", "--category", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown label category: Nope"));
}

#[test]
fn replay_draw_persists_annotation() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    let output = stdout_of(pagemark(temp.path()).arg("replay").arg(fixture("draw_bank_name.json")));
    let summary: ReplaySummary =
        serde_json::from_slice(&output).expect("stdout should contain valid json");
    insta::assert_json_snapshot!("replay_draw_summary", summary);

    let state = list(temp.path());
    let annotation = &state["1"][0];
    assert_eq!(annotation["x"], 10.0);
    assert_eq!(annotation["y"], 10.0);
    assert_eq!(annotation["width"], 40.0);
    assert_eq!(annotation["height"], 30.0);
    assert_eq!(annotation["label"]["id"], "bank_name");
}

#[test]
fn replay_delete_undo_redo() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    let output =
        stdout_of(pagemark(temp.path()).arg("replay").arg(fixture("draw_then_delete.json")));
    let summary: ReplaySummary =
        serde_json::from_slice(&output).expect("stdout should contain valid json");
    insta::assert_json_snapshot!("replay_delete_summary", summary);

    let page = stdout_of(pagemark(temp.path()).args(["list", "--page", "2"]));
    let page: Vec<Value> = serde_json::from_slice(&page).expect("stdout should be json");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["label"]["color"], "#FFB366");
}

#[test]
fn replay_without_autosave_still_persists() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    pagemark(temp.path())
        .env("PAGEMARK_AUTOSAVE", "false")
        .arg("replay")
        .arg(fixture("draw_bank_name.json"))
        .assert()
        .success();

    assert_eq!(list(temp.path())["1"].as_array().map(Vec::len), Some(1));
}

#[test]
fn replay_fails_for_unknown_label() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let script = temp.path().join("script.json");
    std::fs::write(&script, r#"[{"op": "select_label", "id": "nope"}]"#)
        .expect("script should be written");

    pagemark(temp.path())
        .arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown label: nope"));
}

#[test]
fn import_export_clear_cycle() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let out_dir = temp.path().join("out");

    pagemark(temp.path())
        .arg("import")
        .arg(fixture("statement.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 2 annotations"));

    let imported = list(temp.path());
    assert_eq!(imported["3"][0]["label"]["id"], "ending_balance");

    let path = stdout_of(
        pagemark(temp.path())
            .arg("export")
            .arg("--output")
            .arg(&out_dir)
            .args(["--name", "statement-2024"]),
    );
    let path = PathBuf::from(String::from_utf8(path).expect("path should be utf-8").trim());
    assert_eq!(path, out_dir.join("statement-2024.json"));

    pagemark(temp.path()).arg("clear").assert().success();
    assert_eq!(list(temp.path()), serde_json::json!({}));

    pagemark(temp.path()).arg("import").arg(&path).assert().success();
    assert_eq!(list(temp.path()), imported);
}

#[test]
fn export_csv_writes_one_row_per_annotation() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    pagemark(temp.path()).arg("import").arg(fixture("statement.json")).assert().success();

    pagemark(temp.path())
        .args(["export", "--format", "csv", "--output"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("annotations.csv"));

    let csv = std::fs::read_to_string(temp.path().join("annotations.csv"))
        .expect("csv export should exist");
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("Page,ID,Label ID"));
}

#[test]
fn export_fails_for_reserved_format() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    pagemark(temp.path())
        .args(["export", "--format", "coco", "--output"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn import_fails_and_keeps_existing_state() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    pagemark(temp.path()).arg("import").arg(fixture("statement.json")).assert().success();
    let before = list(temp.path());

    pagemark(temp.path())
        .arg("import")
        .arg(fixture("invalid_page.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to import"));

    assert_eq!(list(temp.path()), before);
}

#[test]
fn list_fails_for_page_zero() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    pagemark(temp.path())
        .args(["list", "--page", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1-based"));
}
