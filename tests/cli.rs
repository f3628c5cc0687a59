use assert_cmd::prelude::*;
use serde_json::Value;
use std::path::Path;
use std::process::Command;

fn taxy() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("taxy"))
}

fn json_output(cmd: &mut Command) -> Value {
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn parse_prints_the_command_as_json() {
    let value = json_output(taxy().args(["-o", "json", "parse", "/taxy", "click", "\"#submit\""]));

    assert_eq!(value["text"].as_str(), Some("/taxy click \"#submit\""));
    let action = &value["command"]["action"];
    assert_eq!(action["action"].as_str(), Some("click"));
    assert_eq!(action["selector"].as_str(), Some("#submit"));
}

#[test]
fn parse_fails_on_malformed_commands() {
    taxy()
        .args(["parse", "/taxy wait notanumber"])
        .assert()
        .failure();
}

#[test]
fn run_executes_commands_against_a_fixture() {
    let page = Path::new("demos/chat-page.yaml");
    assert!(page.exists(), "fixture missing");
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");

    let value = json_output(taxy().args([
        "-o",
        "json",
        "run",
        "--page",
        page.to_str().unwrap(),
        "--state",
        state.to_str().unwrap(),
        "--select",
        "input=textarea",
        "/taxy click #submit",
        "/taxy navigate example.com",
        "just chatting",
    ]));

    assert_eq!(value["location"].as_str(), Some("https://example.com"));
    let selections = value["selections"].as_array().unwrap();
    assert_eq!(selections.len(), 1);
    assert_eq!(selections[0]["selector"].as_str(), Some("#prompt"));

    let results = value["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["outcome"].as_str(), Some("executed"));
    assert_eq!(results[0]["result"]["success"].as_bool(), Some(true));
    assert_eq!(results[2]["outcome"].as_str(), Some("ignored"));

    let history = value["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["text"].as_str(), Some("click(\"#submit\")"));
    assert!(state.exists());

    let history = json_output(taxy().args([
        "-o",
        "json",
        "history",
        "--state",
        state.to_str().unwrap(),
        "--limit",
        "1",
    ]));
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["text"].as_str(), Some("navigate(\"https://example.com\")"));

    let selectors = json_output(taxy().args([
        "-o",
        "json",
        "selectors",
        "--state",
        state.to_str().unwrap(),
    ]));
    assert_eq!(selectors["customInputSelector"].as_str(), Some("#prompt"));
    assert!(selectors["customOutputSelector"].is_null());
}

#[test]
fn history_on_a_fresh_state_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");

    let assert = taxy()
        .args(["history", "--state", state.to_str().unwrap()])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("No actions recorded yet"), "{stdout}");
}

#[test]
fn config_show_reports_the_effective_settings() {
    let value = json_output(taxy().args(["-o", "json", "config", "show"]));
    assert_eq!(value["dispatch_timeout_ms"].as_u64(), Some(10_000));
    assert_eq!(value["outline_limit"].as_u64(), Some(200));
}
