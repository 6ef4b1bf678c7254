use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn shootclock(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shootclock"))
        .args(args)
        .env("SHOOTCLOCK_HOME", home)
        .env_remove("SHOOTCLOCK_DEBUG_LOG")
        .output()
        .expect("run shootclock")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn glance_without_region_is_idle() {
    let temp = tempfile::tempdir().expect("temp dir");

    let output = shootclock(temp.path(), &["glance"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("idle"));

    let output = shootclock(temp.path(), &["glance", "--json"]);
    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(stdout(&output).trim()).expect("glance json");
    assert_eq!(json["is_running"], false);
}

#[test]
fn boot_reports_primary_store() {
    let temp = tempfile::tempdir().expect("temp dir");

    let output = shootclock(temp.path(), &["boot"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("boot json");
    assert_eq!(json["state"], "ready");
    assert_eq!(json["mode"], "primary");
    assert!(temp.path().join("store").join("shootclock.db").exists());
    assert!(temp.path().join("launch-marker.json").exists());
}

#[test]
fn tags_round_trip_through_the_store() {
    let temp = tempfile::tempdir().expect("temp dir");

    let output = shootclock(temp.path(), &["tags", "add", "First look", "--group", "Portraits"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let output = shootclock(temp.path(), &["tags", "list", "--json"]);
    assert!(output.status.success());
    let groups: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("tags json");
    assert_eq!(groups[0]["name"], "Portraits");
    assert_eq!(groups[0]["tags"][0]["name"], "First look");
    assert_eq!(groups[0]["tags"][0]["sort_index"], 0);

    let output = shootclock(temp.path(), &["tags", "remove", "no-such-id"]);
    assert!(!output.status.success());
}

#[test]
fn run_session_publishes_to_glance() {
    let temp = tempfile::tempdir().expect("temp dir");

    let mut child = Command::new(env!("CARGO_BIN_EXE_shootclock"))
        .arg("run")
        .env("SHOOTCLOCK_HOME", temp.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn run");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"go\non\ngo\nstatus\nquit\n")
        .expect("write commands");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("not on duty"));
    assert!(out.contains("-> shooting"));

    let glance = shootclock(temp.path(), &["glance", "--json"]);
    let json: serde_json::Value =
        serde_json::from_str(stdout(&glance).trim()).expect("glance json");
    assert_eq!(json["is_running"], true);
}
