//! Tests for the `convbench` command-line contract.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const HEADER: &str = "id,Ni,Ci,Hi,Wi,No,Do,Ho,Wo,Hk,Wk,Hpt,Hpb,Wpl,Wpr,Hs,Ws,Hd,Wd,G";

fn convbench(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_convbench"))
        .args(args)
        .env("CONVBENCH_CONFIG", "configs/does_not_exist.json")
        .env_remove("RUST_LOG")
        .output()
        .expect("convbench should start")
}

fn tiny_catalog() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file should be created");
    writeln!(file, "{}", HEADER).unwrap();
    writeln!(file, "tiny,1,2,5,5,1,3,3,3,3,3,0,0,0,0,1,1,1,1,1").unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_wrong_argument_count_prints_usage() {
    let cases: [&[&str]; 3] = [&[], &["convsets/sample.csv"], &["a", "b", "c", "d"]];
    for args in cases {
        let output = convbench(args);
        assert_eq!(output.status.code(), Some(1), "args {:?}", args);
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("three command line arguments"), "stdout: {}", stdout);
    }
}

#[test]
fn test_correctness_run_prints_diff() {
    let catalog = tiny_catalog();
    let path = catalog.path().to_str().unwrap();
    let output = convbench(&[path, "random", "correctness"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.starts_with("for conv DIFF: "));
}

#[test]
fn test_missing_config_warning_is_logged() {
    let catalog = tiny_catalog();
    let path = catalog.path().to_str().unwrap();
    let output = convbench(&[path, "random", "direct"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("not found, using default configuration"),
        "stderr: {}",
        stderr
    );
    // enable_logging defaults to false, so info messages are filtered out
    assert!(!stderr.contains("program begin"), "stderr: {}", stderr);
}

#[test]
fn test_missing_catalog_exits_with_error() {
    let output = convbench(&["convsets/does_not_exist.csv", "random", "direct"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
