//! End-to-end tests running the strata binary on JSON fixtures.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn chain_graph_json() -> &'static str {
    r#"{
        "nodes": [
            {
                "id": "start",
                "key": {"a": 0, "b": 0, "c": 0, "d": 1},
                "position": {"x": 50.0, "y": 75.0},
                "size": {"width": 120.0, "height": 48.0},
                "pins": [
                    {"name": "then", "direction": "Output", "index": 0, "is_exec": true}
                ]
            },
            {
                "id": "end",
                "key": {"a": 0, "b": 0, "c": 0, "d": 2},
                "size": {"width": 120.0, "height": 48.0},
                "pins": [
                    {"name": "exec", "direction": "Input", "index": 0, "is_exec": true}
                ]
            }
        ],
        "edges": [
            {
                "src_node": "start",
                "src_pin": "then",
                "dst_node": "end",
                "dst_pin": "exec"
            }
        ]
    }"#
}

#[test]
fn test_layout_command_writes_positions() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("graph.json");
    let output = dir.path().join("out.json");
    fs::write(&input, chain_graph_json()).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["layout", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--pretty")
        .status()
        .unwrap();
    assert!(status.success());

    let text = fs::read_to_string(&output).unwrap();
    let results: serde_json::Value = serde_json::from_str(&text).unwrap();
    let components = results.as_array().unwrap();
    assert_eq!(components.len(), 1);

    let positions = &components[0]["positions"];
    // The anchor keeps its original position.
    assert_eq!(positions["start"]["x"], 50.0);
    assert_eq!(positions["start"]["y"], 75.0);
    // The successor sits one column to the right (120 wide + 300 spacing).
    assert_eq!(positions["end"]["x"], 470.0);
    assert_eq!(positions["end"]["y"], 75.0);
}

#[test]
fn test_layout_command_is_deterministic() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("graph.json");
    fs::write(&input, chain_graph_json()).unwrap();

    let run = || {
        let out = Command::new(env!("CARGO_BIN_EXE_strata"))
            .args(["layout", "--input"])
            .arg(&input)
            .output()
            .unwrap();
        assert!(out.status.success());
        out.stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_layout_command_reads_stdin_dash() {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["layout", "--input", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(chain_graph_json().as_bytes())
        .unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    let results: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(results.as_array().unwrap().len() == 1);
}

#[test]
fn test_layout_command_rejects_bad_pin_reference() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("graph.json");
    let broken = chain_graph_json().replace("\"src_pin\": \"then\"", "\"src_pin\": \"nope\"");
    fs::write(&input, broken).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["layout", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown output pin"));
}

#[test]
fn test_validate_command_accepts_good_graph() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("graph.json");
    fs::write(&input, chain_graph_json()).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["validate", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("valid"));
}

#[test]
fn test_validate_command_rejects_duplicate_keys() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("graph.json");
    let duplicated = chain_graph_json().replace("\"d\": 2", "\"d\": 1");
    fs::write(&input, duplicated).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["validate", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(!out.status.success());
}
