mod support;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;

use support::TestStore;

fn json_stdout(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is json")
}

#[test]
fn taskqueue_help_works() {
    Command::cargo_bin("taskqueue")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("approval gates"));
}

#[test]
fn subcommand_help_works() {
    for cmd in ["tools", "call", "serve"] {
        Command::cargo_bin("taskqueue")
            .expect("binary")
            .arg(cmd)
            .arg("--help")
            .assert()
            .success();
    }
}

#[test]
fn tools_lists_catalogue() {
    let store = TestStore::new();
    let output = store
        .cli()
        .args(["--json", "tools"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = json_stdout(&output);
    assert_eq!(value["schema_version"], "taskqueue.v1");
    assert_eq!(value["command"], "tools");
    let names: Vec<_> = value["data"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|tool| tool["name"].as_str())
        .collect();
    assert!(names.contains(&"finalize_project"));
    assert_eq!(names.len(), 13);
}

#[test]
fn call_writes_to_env_selected_file() {
    let store = TestStore::new();
    let output = store
        .cli()
        .args([
            "--json",
            "call",
            "create_project",
            "--args",
            r#"{"initialPrompt":"Ship v2","tasks":[{"title":"Cut branch","description":"From main"}]}"#,
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value = json_stdout(&output);
    assert_eq!(value["status"], "success");
    assert_eq!(value["command"], "call create_project");
    assert_eq!(value["data"]["projectId"], "proj-1");

    let raw = store.read_raw();
    assert_eq!(raw["projects"][0]["tasks"][0]["id"], "task-1");
}

#[test]
fn file_flag_overrides_environment() {
    let store = TestStore::new();
    let other = store.path().join("elsewhere.json");
    store
        .cli()
        .arg("--file")
        .arg(&other)
        .args(["call", "create_project", "--args", r#"{"initialPrompt":"Here"}"#])
        .assert()
        .success();

    assert!(other.exists());
    assert!(!store.file().exists());
}

#[test]
fn human_output_summarizes_tasks() {
    let store = TestStore::new();
    store
        .cli()
        .args([
            "call",
            "create_project",
            "--args",
            r#"{"initialPrompt":"Docs","tasks":[{"title":"Write intro","description":"Short"}]}"#,
        ])
        .assert()
        .success();

    store
        .cli()
        .args(["call", "list_tasks"])
        .assert()
        .success()
        .stdout(contains("proj-1/task-1 [open] Write intro"));
}

#[test]
fn errors_carry_kind_and_exit_code() {
    let store = TestStore::new();

    let output = store
        .cli()
        .args(["--json", "call", "read_project", "--args", r#"{"projectId":"proj-7"}"#])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let value = json_stdout(&output);
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["kind"], "NotFoundError");
    assert_eq!(value["error"]["details"]["projectId"], "proj-7");

    store
        .cli()
        .args(["call", "create_project", "--args", "{}"])
        .assert()
        .code(2)
        .stderr(contains("ValidationError"))
        .stderr(contains("initialPrompt"));

    store
        .cli()
        .args(["call", "no_such_tool"])
        .assert()
        .code(2)
        .stderr(contains("NotFoundError"))
        .stderr(contains("taskqueue tools"));
}

#[test]
fn frozen_task_exits_blocked() {
    let store = TestStore::new();
    store
        .cli()
        .args([
            "call",
            "create_project",
            "--args",
            r#"{"initialPrompt":"Auto","autoApprove":true,"tasks":[{"title":"A","description":"a"}]}"#,
        ])
        .assert()
        .success();
    store
        .cli()
        .args([
            "call",
            "update_task",
            "--args",
            r#"{"projectId":"proj-1","taskId":"task-1","status":"done","completedDetails":"did it"}"#,
        ])
        .assert()
        .success();

    store
        .cli()
        .args([
            "call",
            "update_task",
            "--args",
            r#"{"projectId":"proj-1","taskId":"task-1","title":"Renamed"}"#,
        ])
        .assert()
        .code(3)
        .stderr(contains("ConflictError"));
}

#[test]
fn corrupt_file_exits_operation_failed() {
    let store = TestStore::new();
    store.write_raw("not json at all");
    store
        .cli()
        .args(["call", "list_projects"])
        .assert()
        .code(4)
        .stderr(contains("ParseError"));
}

#[test]
fn args_can_come_from_stdin() {
    let store = TestStore::new();
    store
        .cli()
        .args(["--json", "call", "create_project", "--args", "-"])
        .write_stdin(r#"{"initialPrompt":"From stdin"}"#)
        .assert()
        .success()
        .stdout(contains("From stdin"));
}

#[test]
fn serve_answers_each_line() {
    let store = TestStore::new();
    let input = concat!(
        r#"{"id":1,"tool":"create_project","arguments":{"initialPrompt":"Served"}}"#,
        "\n",
    );
    let output = store
        .cli()
        .arg("serve")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let replies: Vec<Value> = String::from_utf8(output)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("reply json"))
        .collect();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[0]["status"], "success");
    assert_eq!(replies[0]["data"]["projectId"], "proj-1");
    assert!(store.file().exists());
}

#[test]
fn config_file_selects_task_file() {
    let store = TestStore::new();
    let configured = store.path().join("configured.json");
    std::fs::write(
        store.config_file(),
        format!("file_path = {:?}\n", configured.display().to_string()),
    )
    .expect("write config");

    store
        .cli()
        .env_remove("TASK_MANAGER_FILE_PATH")
        .args(["call", "create_project", "--args", r#"{"initialPrompt":"Configured"}"#])
        .assert()
        .success();
    assert!(configured.exists());
}

#[test]
fn invalid_config_is_user_error() {
    let store = TestStore::new();
    std::fs::write(store.config_file(), "lock_timeout_ms = 0\n").expect("write config");
    store
        .cli()
        .args(["call", "list_projects"])
        .assert()
        .code(2)
        .stderr(contains("lock_timeout_ms"));
}
