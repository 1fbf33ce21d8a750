use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const VECTOR: &str = "\
# std::vector

## Growth

Appending may move every element; prefer std::move for heavy types.

### Capacity

Reserve up front.
";

fn setup() -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    let content = temp.path().join("content");
    fs::create_dir_all(&content).unwrap();
    fs::write(content.join("vector.md"), VECTOR).unwrap();
    fs::write(content.join("empty.md"), "   \n").unwrap();

    let config = format!(
        r#"
schema_version = 1

[content]
base_path = "{}/"
retry_attempts = 1
retry_delay_ms = 1
snapshot_dir = "{}"

[[topics]]
key = "vector"
title = "Vectors"

[[topics]]
key = "empty"
title = "Empty"
"#,
        content.display(),
        temp.path().join("snapshots").display()
    );
    fs::write(temp.path().join("refdoc.toml"), config).unwrap();
    temp
}

#[allow(deprecated)]
fn refdoc(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("refdoc").expect("binary");
    cmd.current_dir(workdir)
        .env_remove("REFDOC_CONFIG")
        .env_remove("REFDOC_BASE_PATH")
        .env_remove("REFDOC_CACHE_TIMEOUT_MS")
        .env_remove("REFDOC_RETRY_ATTEMPTS")
        .env_remove("REFDOC_RETRY_DELAY_MS");
    cmd
}

fn json_stdout(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn show_prints_decorated_html() {
    let temp = setup();
    refdoc(temp.path())
        .args(["show", "vector"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<h2 id="growth">Growth</h2>"#))
        .stdout(predicate::str::contains(r#"data-term="std-move""#))
        .stdout(predicate::str::contains(r#"data-term="move""#));
}

#[test]
fn show_json_reports_toc_and_decoration() {
    let temp = setup();
    let output = refdoc(temp.path())
        .args(["show", "vector", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body = json_stdout(&output);
    assert_eq!(body["key"], "vector");
    assert_eq!(body["title"], "Vectors");
    assert_eq!(body["origin"], "network");
    assert_eq!(body["toc"][0]["id"], "growth");
    assert_eq!(body["toc"][1]["level"], 3);
    assert_eq!(body["decoration"]["per_term"]["std-move"], 1);
}

#[test]
fn empty_topic_falls_back_and_fails() {
    let temp = setup();
    refdoc(temp.path())
        .args(["show", "empty"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Content unavailable"))
        .stdout(predicate::str::contains("#retry:empty"))
        .stderr(predicate::str::contains("Topic 'empty' unavailable"));
}

#[test]
fn unknown_topic_is_an_error() {
    let temp = setup();
    refdoc(temp.path())
        .args(["show", "templates"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("templates"));
}

#[test]
fn toc_lists_sections() {
    let temp = setup();
    refdoc(temp.path())
        .args(["toc", "vector"])
        .assert()
        .success()
        .stdout("Growth  #growth\n  Capacity  #capacity\n");
}

#[test]
fn topics_lists_configured_order() {
    let temp = setup();
    let output = refdoc(temp.path())
        .args(["topics", "--json"])
        .output()
        .unwrap();
    let body = json_stdout(&output);
    assert_eq!(body[0]["key"], "vector");
    assert_eq!(body[1]["key"], "empty");
    assert_eq!(body[0]["active"], false);
}

#[test]
fn preload_reports_fallbacks() {
    let temp = setup();
    let output = refdoc(temp.path())
        .args(["preload", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let body = json_stdout(&output);
    assert_eq!(body["completed"].as_array().unwrap().len(), 2);
    assert_eq!(body["fallbacks"][0], "empty");
}

#[test]
fn preload_writes_snapshots() {
    let temp = setup();
    refdoc(temp.path())
        .args(["preload", "vector"])
        .assert()
        .success()
        .stdout("vector\n");
    assert!(temp.path().join("snapshots/vector.json").is_file());
}

#[test]
fn scan_prefers_longest_match() {
    let temp = setup();
    let output = refdoc(temp.path())
        .args(["scan", "return std::move(v);", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body = json_stdout(&output);
    let matches = body.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["definition_id"], "std-move");
    assert_eq!(matches[0]["start"], 7);
    assert_eq!(matches[0]["end"], 16);
}

#[test]
fn base_path_flag_overrides_config() {
    let temp = setup();
    let other = temp.path().join("other");
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("vector.md"), "## Elsewhere\n").unwrap();

    refdoc(temp.path())
        .args(["toc", "vector", "--base-path"])
        .arg(format!("{}/", other.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("#elsewhere"));
}

#[test]
fn invalid_config_is_reported() {
    let temp = setup();
    fs::write(temp.path().join("bad.toml"), "schema_version = 99\n").unwrap();
    refdoc(temp.path())
        .args(["--config", "bad.toml", "topics"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("schema_version"));
}

#[test]
fn config_schema_is_json() {
    let temp = tempfile::tempdir().unwrap();
    let output = refdoc(temp.path()).arg("config-schema").output().unwrap();
    assert!(output.status.success());
    let body = json_stdout(&output);
    assert!(body["properties"]["content"].is_object());
}
