//! End-to-end tests for the `lark` binary

use lark_vm_bytecode::{ActionCode, ActionStreamBuilder};
use std::path::Path;
use std::process::{Command, Output};

fn lark(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lark"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

fn write_stream(dir: &Path, name: &str, bytes: Vec<u8>) {
    std::fs::write(dir.join(name), bytes).unwrap();
}

#[test]
fn test_run_prints_trace() {
    let dir = tempfile::tempdir().unwrap();
    let stream = ActionStreamBuilder::new()
        .push_str("hello")
        .action(ActionCode::Trace)
        .finish();
    write_stream(dir.path(), "frame.bin", stream);

    let out = lark(dir.path(), &["run", "frame.bin"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
}

#[test]
fn test_uncaught_throw_fails() {
    let dir = tempfile::tempdir().unwrap();
    let stream = ActionStreamBuilder::new()
        .push_str("boom")
        .action(ActionCode::Throw)
        .finish();
    write_stream(dir.path(), "frame.bin", stream);

    let out = lark(dir.path(), &["run", "frame.bin"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("boom"));
}

#[test]
fn test_file_read_needs_permission() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data.txt"), "payload").unwrap();
    let stream = ActionStreamBuilder::new()
        .push_str("data.txt")
        .push_int(1)
        .push_str("avmplus.File")
        .action(ActionCode::GetVariable)
        .push_str("read")
        .action(ActionCode::CallMethod)
        .action(ActionCode::Trace)
        .finish();
    write_stream(dir.path(), "frame.bin", stream);

    let denied = lark(dir.path(), &["run", "frame.bin"]);
    assert!(!denied.status.success());

    let allowed = lark(dir.path(), &["run", "--allow-read", "--", "frame.bin"]);
    assert!(allowed.status.success());
    assert_eq!(String::from_utf8_lossy(&allowed.stdout).trim(), "payload");
}

#[test]
fn test_config_file_grants_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data.txt"), "from config").unwrap();
    std::fs::write(
        dir.path().join("lark.toml"),
        format!(
            "[permissions]\nallow_read = [{:?}]\n",
            dir.path().to_string_lossy()
        ),
    )
    .unwrap();
    let stream = ActionStreamBuilder::new()
        .push_str("data.txt")
        .push_int(1)
        .push_str("avmplus.File")
        .action(ActionCode::GetVariable)
        .push_str("read")
        .action(ActionCode::CallMethod)
        .action(ActionCode::Trace)
        .finish();
    write_stream(dir.path(), "frame.bin", stream);

    let out = lark(dir.path(), &["run", "frame.bin"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "from config");
}

#[test]
fn test_disasm_lists_records() {
    let dir = tempfile::tempdir().unwrap();
    let stream = ActionStreamBuilder::new()
        .push_str("hello")
        .action(ActionCode::Trace)
        .finish();
    write_stream(dir.path(), "frame.bin", stream);

    let out = lark(dir.path(), &["disasm", "frame.bin"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("Push"));
    assert!(text.contains("Trace"));

    let json = lark(dir.path(), &["disasm", "frame.bin", "--json"]);
    assert!(json.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&json.stdout).unwrap();
    assert!(parsed.is_object() || parsed.is_array());
}
