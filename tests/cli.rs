use assert_cmd::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const PAGE: &str = r##"
url: https://shop.test/checkout
title: Checkout
body:
  - tag: h1
    text: Checkout
  - tag: form
    children:
      - tag: input
        attrs: { id: email, type: email }
      - tag: button
        attrs: { id: pay }
        text: Pay now
        on_click:
          - set_title: Paid
"##;

const SCRIPT: &str = r#"
messages:
  - pay with my email
responses:
  - message: Paying
    status: complete
    actions:
      - { action: fill, target: id-email, value: ada@example.com }
      - { action: click, target: id-pay }
"#;

const FAST_CONFIG: &str = "simulator:\n  settle_ms: 0\n  activation_delay_ms: 0\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("page.yaml"), PAGE).unwrap();
        std::fs::write(dir.path().join("script.yaml"), SCRIPT).unwrap();
        std::fs::write(dir.path().join("fast.yaml"), FAST_CONFIG).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Binary isolated from the caller's config files and log settings.
    fn command(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pagepilot"));
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("xdg"))
            .env_remove("PAGEPILOT_LOG")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn stdout_of(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

fn arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn run_replays_script_and_prints_final_context() {
    let ws = Workspace::new();
    let stdout = stdout_of(ws.command().args([
        "--config",
        arg(&ws.path("fast.yaml")),
        "run",
        "--page",
        arg(&ws.path("page.yaml")),
        "--script",
        arg(&ws.path("script.yaml")),
    ]));

    assert!(stdout.contains("> pay with my email"), "{stdout}");
    assert!(stdout.contains("status: complete  cycles: 1  any_success: true"), "{stdout}");
    assert!(stdout.contains("ok         fill id-email"), "{stdout}");
    assert!(stdout.contains("--- context ---"), "{stdout}");
    assert!(stdout.contains("PAGE https://shop.test/checkout | Paid"), "{stdout}");
    assert!(stdout.contains("[id-pay] button"), "{stdout}");
}

#[test]
fn run_message_flag_overrides_script_messages() {
    let ws = Workspace::new();
    let stdout = stdout_of(ws.command().args([
        "--config",
        arg(&ws.path("fast.yaml")),
        "run",
        "--page",
        arg(&ws.path("page.yaml")),
        "--script",
        arg(&ws.path("script.yaml")),
        "--message",
        "just pay",
    ]));
    assert!(stdout.contains("> just pay"));
    assert!(!stdout.contains("> pay with my email"));
}

#[test]
fn run_json_output_is_one_document_per_line() {
    let ws = Workspace::new();
    let stdout = stdout_of(ws.command().args([
        "--config",
        arg(&ws.path("fast.yaml")),
        "--output",
        "json",
        "run",
        "--page",
        arg(&ws.path("page.yaml")),
        "--script",
        arg(&ws.path("script.yaml")),
    ]));

    let docs: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(docs.len(), 2, "cycle result then context snapshot");
    assert_eq!(docs[0]["status"], "complete");
    assert_eq!(docs[0]["anySuccess"], true);
    assert_eq!(docs[0]["outcomes"].as_array().map(Vec::len), Some(2));
    assert_eq!(docs[1]["title"], "Paid");
    assert_eq!(docs[1]["mode"], "plan");
}

#[test]
fn inspect_emits_snapshot_as_json() {
    let ws = Workspace::new();
    let stdout = stdout_of(ws.command().args([
        "-o",
        "json",
        "inspect",
        "--page",
        arg(&ws.path("page.yaml")),
    ]));

    let snapshot: Value = serde_json::from_str(stdout.trim()).expect("snapshot json");
    assert_eq!(snapshot["url"], "https://shop.test/checkout");
    assert_eq!(snapshot["totalElements"], 2);
    assert_eq!(snapshot["activeContext"]["kind"], "page");
    let ids: Vec<&str> = snapshot["elements"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["id-email", "id-pay"]);
}

#[test]
fn inspect_human_output_lists_headings_and_buttons() {
    let ws = Workspace::new();
    let stdout = stdout_of(ws.command().args(["inspect", "--page", arg(&ws.path("page.yaml"))]));
    assert!(stdout.contains("HEADINGS h1 Checkout"), "{stdout}");
    assert!(stdout.contains("BUTTONS Pay now"), "{stdout}");
    assert!(stdout.contains("ELEMENTS (2/2)"), "{stdout}");
}

#[test]
fn config_without_files_prints_defaults() {
    let ws = Workspace::new();
    let stdout = stdout_of(ws.command().arg("config"));
    assert!(stdout.starts_with("# source: defaults"), "{stdout}");
    assert!(stdout.contains("settle_ms: 300"), "{stdout}");
}

#[test]
fn local_config_file_is_picked_up() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.path("config")).unwrap();
    std::fs::write(ws.path("config/pagepilot.yaml"), "session:\n  max_cycles: 4\n").unwrap();

    let stdout = stdout_of(ws.command().args(["-o", "json", "config"]));
    let config: Value = serde_json::from_str(&stdout).expect("config json");
    assert_eq!(config["session"]["max_cycles"], 4);
}

#[test]
fn malformed_config_fails_the_command() {
    let ws = Workspace::new();
    std::fs::write(ws.path("bad.yaml"), "session:\n  max_cycles: lots\n").unwrap();

    ws.command()
        .args(["--config", arg(&ws.path("bad.yaml")), "config"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn missing_page_fails_the_command() {
    let ws = Workspace::new();
    let assert = ws
        .command()
        .args([
            "run",
            "--page",
            arg(&ws.path("nope.yaml")),
            "--script",
            arg(&ws.path("script.yaml")),
        ])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    assert!(stderr.contains("Failed to load page"), "{stderr}");
}

#[test]
fn signup_demo_runs_to_completion() {
    let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/signup");
    let ws = Workspace::new();
    let stdout = stdout_of(ws.command().args([
        "--config",
        arg(&ws.path("fast.yaml")),
        "run",
        "--page",
        arg(&demos.join("page.yaml")),
        "--script",
        arg(&demos.join("script.yaml")),
    ]));
    assert!(stdout.contains("status: complete  cycles: 2"), "{stdout}");
    assert!(stdout.contains("PAGE https://app.test/signup | Welcome"), "{stdout}");
}
