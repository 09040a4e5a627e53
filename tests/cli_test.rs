//! End-to-end tests of the `cfixtures` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Path to the cfixtures binary.
fn cfixtures_bin() -> &'static str {
    env!("CARGO_BIN_EXE_cfixtures")
}

fn run(corpus: &Path, args: &[&str]) -> Output {
    Command::new(cfixtures_bin())
        .arg("--corpus")
        .arg(corpus)
        .args(args)
        .env_remove("CFIXTURES_CORPUS")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run cfixtures")
}

fn shipped_corpus() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/parser_test_corpus")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout should be UTF-8")
}

#[test]
fn test_check_shipped_corpus() {
    let output = run(&shipped_corpus(), &["check"]);
    let text = stdout(&output);

    assert!(output.status.success(), "check failed:\n{text}");
    assert!(text.contains("PASS c/basic.c (C, 41 lines"));
    assert!(text.contains("PASS test_cpp_sample.cpp"));
    assert!(text.contains("note: line 3: local include \"myheader.h\""));
    assert!(text.ends_with("3 fixtures, 3 passed, 0 failed\n"));
}

#[test]
fn test_check_json() {
    let output = run(&shipped_corpus(), &["check", "--json"]);
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("check --json should output valid JSON");
    assert_eq!(report["passed"], 3);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["fixtures"][1]["path"], "cpp/basic.cpp");
    assert_eq!(report["fixtures"][1]["dialect"], "cpp");
    assert_eq!(report["fixtures"][1]["kinds"]["constructor"], 1);
}

#[test]
fn test_check_fails_on_broken_fixture() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("c")).unwrap();
    fs::write(dir.path().join("c/broken.c"), "int main(void) {\n  return 0;\n").unwrap();

    let output = run(dir.path(), &["check"]);
    let text = stdout(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("FAIL c/broken.c"));
    assert!(text.contains("✗ delimiters balanced"));
}

#[test]
fn test_list_by_dialect() {
    let output = run(&shipped_corpus(), &["list", "--dialect", "cpp"]);
    let text = stdout(&output);

    assert!(output.status.success());
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("cpp/basic.cpp"));
    assert!(lines[1].starts_with("test_cpp_sample.cpp"));
    assert!(lines.iter().all(|l| l.contains("C++") && l.contains("declarations")));
}

#[test]
fn test_list_rejects_unknown_dialect() {
    let output = run(&shipped_corpus(), &["list", "--dialect", "rust"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown dialect"));
}

#[test]
fn test_show_json() {
    let output = run(&shipped_corpus(), &["show", "test_cpp_sample.cpp", "--json"]);
    assert!(output.status.success());

    let shown: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("show --json should output valid JSON");
    assert_eq!(shown["dialect"], "cpp");
    assert_eq!(shown["declarations"][0]["kind"], "namespace");
    assert_eq!(shown["declarations"][0]["name"], "MyNamespace");

    let includes: Vec<_> = shown["includes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["path"].as_str().unwrap())
        .collect();
    assert_eq!(includes, vec!["myheader.h", "iostream", "vector"]);
}

#[test]
fn test_show_text_includes_docs() {
    let output = run(&shipped_corpus(), &["show", "c/basic.c"]);
    let text = stdout(&output);

    assert!(output.status.success());
    assert!(text.starts_with("c/basic.c (C)\n"));
    assert!(text.contains("  #include <stdio.h>"));
    assert!(text.contains("  typedef TestStruct  [11-14]"));
    assert!(text.contains("    field TestStruct::field1"));
    assert!(text.contains("/// Initialize a TestStruct"));
}

#[test]
fn test_show_access_and_modifiers() {
    let output = run(&shipped_corpus(), &["show", "cpp/basic.cpp"]);
    let text = stdout(&output);

    assert!(output.status.success());
    assert!(text.contains("    field TestClass::value  [13-13]  private\n"), "{text}");
    assert!(text.contains("    method TestClass::getValue  [24-26]  public\n"), "{text}");
    assert!(text.contains("  function main  [47-56]\n"), "{text}");

    let output = run(&shipped_corpus(), &["show", "cpp/basic.cpp", "--json"]);
    let shown: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("show --json should output valid JSON");
    let value = shown["declarations"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == "value")
        .expect("value field should be listed");
    assert_eq!(value["access"], "private");
    assert!(shown["declarations"][0].get("access").is_none());
}

#[test]
fn test_show_unknown_fixture() {
    let output = run(&shipped_corpus(), &["show", "c/missing.c"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no fixture at c/missing.c"));
}

#[test]
fn test_missing_corpus() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir.path().join("absent"), &["list"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load corpus"));
}
