//! End-to-end CLI integration tests for the `arc` binary: each test sets
//! up a throwaway git repository, runs the binary as a subprocess via
//! `assert_cmd`, and checks its exit code and output.

use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn arc() -> Command {
    Command::cargo_bin("arc").unwrap()
}

fn init_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let run = |args: &[&str]| {
        let status = StdCommand::new("git").args(args).current_dir(tmp.path()).status().unwrap();
        assert!(status.success());
    };
    run(&["init", "-q"]);
    run(&["config", "user.email", "test@example.com"]);
    run(&["config", "user.name", "Test"]);
    std::fs::write(tmp.path().join("README.md"), "hello\n").unwrap();
    run(&["add", "."]);
    run(&["commit", "-q", "-m", "initial commit"]);
    tmp
}

#[test]
fn build_populates_the_store_and_doctor_reports_it() {
    let repo = init_repo();

    arc().arg("build").current_dir(repo.path()).assert().success();

    arc()
        .args(["doctor", "--json"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("schema_version"));
}

#[test]
fn doctor_on_empty_store_reports_zero_counts() {
    let repo = init_repo();

    arc().args(["doctor", "--json"]).current_dir(repo.path()).assert().success().stdout(predicate::str::contains("\"node_count\": 0"));
}

#[test]
fn why_query_returns_json_array() {
    let repo = init_repo();
    arc().arg("build").current_dir(repo.path()).assert().success();

    arc().args(["why", "query", "hello", "--json"]).current_dir(repo.path()).assert().success();
}

#[test]
fn relate_on_id_with_no_edges_succeeds_with_empty_output() {
    let repo = init_repo();
    arc().arg("build").current_dir(repo.path()).assert().success();

    arc().args(["relate", "commit:does-not-exist", "--json"]).current_dir(repo.path()).assert().success().stdout("[]\n");
}

#[test]
fn export_without_a_build_still_writes_an_empty_snapshot() {
    let repo = init_repo();
    arc().arg("build").current_dir(repo.path()).assert().success();

    let sha_output = StdCommand::new("git").args(["rev-parse", "HEAD"]).current_dir(repo.path()).output().unwrap();
    let sha = String::from_utf8(sha_output.stdout).unwrap().trim().to_string();

    let out_path = repo.path().join("export.json");
    arc().args(["export", &sha, out_path.to_str().unwrap()]).current_dir(repo.path()).assert().success();
    assert!(out_path.exists());
}

#[test]
fn auth_without_env_var_set_fails_with_remote_auth_exit_code() {
    let repo = init_repo();
    arc().args(["auth", "github"]).env_remove("GITHUB_TOKEN").current_dir(repo.path()).assert().code(3);
}

#[test]
fn auth_with_unknown_provider_fails_with_invalid_input_exit_code() {
    let repo = init_repo();
    arc().args(["auth", "bitbucket"]).current_dir(repo.path()).assert().code(2);
}
