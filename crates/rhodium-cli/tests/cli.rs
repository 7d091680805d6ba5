use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn rhodium(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rhodium"));
    cmd.arg("--path")
        .arg(data_dir)
        .env_remove("RHODIUM_POOL_SIZE")
        .env_remove("RHODIUM_BUSY_TIMEOUT_MS")
        .env("RUST_LOG", "warn");
    cmd
}

fn json_data(cmd: &mut Command) -> serde_json::Value {
    let assert = cmd.arg("--json").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let root: serde_json::Value = serde_json::from_str(&stdout).expect("json");
    root["data"].clone()
}

#[test]
fn help_lists_commands() {
    let output = Command::new(assert_cmd::cargo::cargo_bin!("rhodium"))
        .arg("--help")
        .output()
        .expect("run help");
    assert!(output.status.success(), "--help should succeed");
    let text = String::from_utf8_lossy(&output.stdout);
    for needle in ["init", "params", "secret", "new-id", "today", "health", "--json"] {
        assert!(text.contains(needle), "help output should contain '{needle}'");
    }
}

#[test]
fn init_is_idempotent_and_params_report_it() {
    let tmp = TempDir::new().expect("tmpdir");
    let first = json_data(rhodium(tmp.path()).arg("init"));
    let node_id = first["node_id"].as_str().expect("node_id").to_string();
    assert_eq!(node_id.len(), 4);
    assert!(tmp.path().join("rhodium.db").exists());
    assert!(tmp.path().join("rhodium_secret").exists());

    let second = json_data(rhodium(tmp.path()).arg("init"));
    assert_eq!(second["node_id"], first["node_id"]);
    assert_eq!(second["first_boot"], first["first_boot"]);

    let params = json_data(rhodium(tmp.path()).arg("params"));
    let keys: Vec<_> = params["parameters"]
        .as_array()
        .expect("parameters")
        .iter()
        .map(|p| p["key"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(keys, ["first_boot", "node_id", "trng_seed"]);
    let seed = params["parameters"][2]["value"].as_str().expect("seed");
    assert_eq!(seed.len(), 14);
    assert_eq!(params["counters"][0]["key"], "primary_counter");
}

#[test]
fn new_id_prints_32_hex_chars_and_advances() {
    let tmp = TempDir::new().expect("tmpdir");
    rhodium(tmp.path()).arg("init").assert().success();

    let a = json_data(rhodium(tmp.path()).arg("new-id"));
    let b = json_data(rhodium(tmp.path()).arg("new-id"));
    let hex = a["id"].as_str().expect("id");
    assert_eq!(hex.len(), 32);
    assert!(hex.bytes().all(|c| c.is_ascii_digit() || (b'a'..=b'f').contains(&c)));
    assert_eq!(
        b["counter"].as_u64().expect("counter"),
        a["counter"].as_u64().expect("counter") + 1
    );

    rhodium(tmp.path())
        .arg("new-id")
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{32}\n$").expect("regex"));
}

#[test]
fn commands_need_an_initialized_store() {
    let tmp = TempDir::new().expect("tmpdir");
    rhodium(tmp.path())
        .arg("new-id")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("rhodium init"))
        .stderr(predicate::str::contains("FATAL").not());
}

#[test]
fn today_requires_a_zone() {
    let tmp = TempDir::new().expect("tmpdir");
    rhodium(tmp.path()).arg("init").assert().success();

    rhodium(tmp.path())
        .arg("today")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--tz"));
    rhodium(tmp.path())
        .args(["today", "--tz", "Not/AZone"])
        .assert()
        .failure();

    let report = json_data(rhodium(tmp.path()).args(["today", "--tz", "Asia/Kolkata"]));
    assert_eq!(report["zone"], "Asia/Kolkata");
    assert_eq!(report["zone_label"], "IST");
}

#[test]
fn add_then_complete_moves_item_out_of_today() {
    let tmp = TempDir::new().expect("tmpdir");
    rhodium(tmp.path()).arg("init").assert().success();

    let item = json_data(rhodium(tmp.path()).args([
        "add",
        "renew passport",
        "--due",
        "2000-01-01T09:30",
        "--priority",
        "3",
        "--tz",
        "Europe/Berlin",
    ]));
    let id = item["id"].as_str().expect("id").to_string();
    assert_eq!(item["due_at"], "2000-01-01T09:30:00+01:00");
    assert_eq!(item["status"], "pending");

    let today = json_data(rhodium(tmp.path()).args(["today", "--tz", "Europe/Berlin"]));
    let ids: Vec<_> = today["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|i| i["id"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(ids, [id.clone()]);

    let done = json_data(rhodium(tmp.path()).args(["done", &id]));
    assert_eq!(done["status"], "done");
    assert!(done["completed_at"].is_string());

    let today = json_data(rhodium(tmp.path()).args(["today", "--tz", "Europe/Berlin"]));
    assert_eq!(today["items"].as_array().map(Vec::len), Some(0));
}

#[test]
fn malformed_identifiers_are_bad_requests() {
    let tmp = TempDir::new().expect("tmpdir");
    rhodium(tmp.path()).arg("init").assert().success();
    rhodium(tmp.path())
        .args(["show", "abc123"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bad request"));
}

#[test]
fn corrupt_secret_is_fatal_and_left_alone() {
    let tmp = TempDir::new().expect("tmpdir");
    let created = json_data(rhodium(tmp.path()).arg("secret"));
    assert_eq!(created["status"], "created");
    let valid = json_data(rhodium(tmp.path()).arg("secret"));
    assert_eq!(valid["status"], "valid");

    let path = tmp.path().join("rhodium_secret");
    fs::write(&path, "not-a-secret").expect("corrupt");
    rhodium(tmp.path())
        .arg("secret")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("FATAL:"))
        .stderr(predicate::str::contains("delete the file"));
    assert_eq!(fs::read_to_string(&path).expect("read"), "not-a-secret");

    let regenerated = json_data(rhodium(tmp.path()).args(["secret", "--regenerate"]));
    assert_eq!(regenerated["status"], "regenerated");
}

#[test]
fn health_reports_ok() {
    let tmp = TempDir::new().expect("tmpdir");
    rhodium(tmp.path())
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"))
        .stderr(predicate::str::contains("not bootstrapped"));
    let data = json_data(rhodium(tmp.path()).arg("init"));
    assert!(data["node_id"].is_string());
    let health = json_data(rhodium(tmp.path()).arg("health"));
    assert_eq!(health["initialized"], true);
}
