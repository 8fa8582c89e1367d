use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::tempdir;

const FLAGGED: &str = "package p

func f(p *int) bool {
	return p == new(int)
}
";

const CLEAN: &str = "package p

func f(p, q *int) bool {
	return p == q
}
";

const INTERCEPTED: &str = "package p

import \"errors\"

type myErr struct{ code int }

func (myErr) Error() string { return \"\" }

func (*myErr) Is(error) bool { return true }

func f(err error) bool {
	return errors.Is(err, &myErr{})
}
";

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

/// Command isolated from any ptrequality.toml outside the temp directory.
fn cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ptrequality");
    cmd.current_dir(dir).env("HOME", dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn finding_exits_with_three() {
    let temp = tempdir().unwrap();
    let file = write(temp.path(), "p.go", FLAGGED);
    cmd(temp.path())
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains(
            "p.go:4:9: result of comparison with address of new variable of type \"int\" is always false",
        ));
}

#[test]
fn clean_package_exits_with_zero() {
    let temp = tempdir().unwrap();
    let file = write(temp.path(), "p.go", CLEAN);
    cmd(temp.path()).arg(&file).assert().success().stderr(predicate::str::is_empty());
}

#[test]
fn json_goes_to_stdout() {
    let temp = tempdir().unwrap();
    let file = write(temp.path(), "p.go", FLAGGED);
    let output = cmd(temp.path())
        .arg("--json")
        .arg(&file)
        .assert()
        .code(3)
        .get_output()
        .stdout
        .clone();

    let payload: Value = serde_json::from_slice(&output).expect("output should be JSON");
    let findings = payload.as_array().expect("array of findings");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["severity"], "always_false");
    assert_eq!(findings[0]["span"]["line"], 4);
}

#[test]
fn check_is_flag_controls_interception() {
    let temp = tempdir().unwrap();
    let file = write(temp.path(), "p.go", INTERCEPTED);
    cmd(temp.path())
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("is false or undefined; method \"Is\" of type \"myErr\""));
    cmd(temp.path())
        .arg("--check-is")
        .arg("false")
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("type \"myErr\" is always false"))
        .stderr(predicate::str::contains("may intercept").not());
}

#[test]
fn config_file_is_honored() {
    let temp = tempdir().unwrap();
    let file = write(temp.path(), "p.go", INTERCEPTED);
    let config = write(temp.path(), "custom.toml", "check-is = false\n");
    cmd(temp.path())
        .arg("--config")
        .arg(&config)
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("is always false"));

    // found by searching the working directory
    write(temp.path(), "ptrequality.toml", "check-is = false\n");
    cmd(temp.path()).arg(&file).assert().code(3).stderr(predicate::str::contains("is always false"));
}

#[test]
fn global_config_in_home_is_honored() {
    let temp = tempdir().unwrap();
    let work = temp.path().join("work");
    let global = temp.path().join("home").join(".config").join("ptrequality");
    std::fs::create_dir_all(&work).unwrap();
    std::fs::create_dir_all(&global).unwrap();
    write(&global, "ptrequality.toml", "check-is = false\n");
    let file = write(&work, "p.go", INTERCEPTED);
    cmd(&work)
        .env("HOME", temp.path().join("home"))
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("is always false"));
}

#[test]
fn unwrap_to_error_may_intercept() {
    let temp = tempdir().unwrap();
    let file = write(
        temp.path(),
        "p.go",
        "package p

import \"errors\"

type wrapped struct{ inner error }

func (w wrapped) Error() string { return \"\" }

func (w wrapped) Unwrap() error { return w.inner }

func f(err error) bool {
	return errors.Is(err, &wrapped{})
}
",
    );
    cmd(temp.path())
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains(
            "type \"wrapped\" is false or undefined; method \"Unwrap\" of type \"wrapped\" may intercept the comparison",
        ));
}

#[test]
fn context_lines_are_printed() {
    let temp = tempdir().unwrap();
    let file = write(temp.path(), "p.go", FLAGGED);
    cmd(temp.path())
        .arg("-c")
        .arg("1")
        .arg(&file)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("\t3\tfunc f(p *int) bool {"))
        .stderr(predicate::str::contains("\t4\t\treturn p == new(int)"))
        .stderr(predicate::str::contains("\t5\t}"));
}

#[test]
fn parse_error_exits_with_one() {
    let temp = tempdir().unwrap();
    let file = write(temp.path(), "p.go", "package p\n\nfucn f() {}\n");
    cmd(temp.path())
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unexpected token fucn"))
        .stderr(predicate::str::contains("did you mean `func`?"));
}

#[test]
fn package_mismatch_exits_with_one() {
    let temp = tempdir().unwrap();
    let a = write(temp.path(), "a.go", "package p\n");
    let b = write(temp.path(), "b.go", "package q\n");
    cmd(temp.path())
        .arg(&a)
        .arg(&b)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("found package q, expected p"));
}

#[test]
fn missing_file_exits_with_one() {
    let temp = tempdir().unwrap();
    cmd(temp.path())
        .arg(temp.path().join("nope.go"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read file"));
}

#[test]
fn write_config_creates_the_template_once() {
    let temp = tempdir().unwrap();
    cmd(temp.path())
        .arg("--write-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created ptrequality.toml"));
    let written = std::fs::read_to_string(temp.path().join("ptrequality.toml")).unwrap();
    assert!(written.contains("check-is = true"));

    cmd(temp.path())
        .arg("--write-config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn version_and_usage() {
    let temp = tempdir().unwrap();
    cmd(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    cmd(temp.path()).assert().failure().stderr(predicate::str::contains("Usage"));
}
