//! Integration tests driving the `strata` binary.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn strata(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(args)
        .current_dir(cwd)
        .env_remove("STRATA_ENVIRONMENTS")
        .env_remove("STRATA_FUNCTION_ARCHIVE")
        .output()
        .expect("run strata")
}

fn write_archive(dir: &Path) -> String {
    let archive = dir.join("mainfunc.zip");
    fs::write(&archive, b"PK\x05\x06archive").expect("write archive");
    archive.display().to_string()
}

#[test]
fn synth_writes_one_artifact_per_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = write_archive(dir.path());
    let out = dir.path().join("out");
    let output = strata(
        &["synth", "--function-archive", &archive, "--out", &out.display().to_string()],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    for env in ["dev", "test", "demo"] {
        let text = fs::read_to_string(out.join(env).join("stack.json")).expect("artifact");
        let json: serde_json::Value = serde_json::from_str(&text).expect("json");
        assert_eq!(json["manifest"]["environment"], env);
        assert_eq!(json["resources"].as_array().map(Vec::len), Some(32));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("sha256:"), "stdout: {stdout}");
}

#[test]
fn synth_without_bundle_fails_every_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = strata(&["synth", "--only", "dev"], dir.path());
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 1 environment(s) failed"), "stderr: {stderr}");
    assert!(!dir.path().join("strata.out").join("dev").exists());
}

#[test]
fn failed_environment_drops_previous_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = write_archive(dir.path());
    let out = dir.path().join("out");
    let out_arg = out.display().to_string();
    let first = strata(
        &["synth", "--only", "dev", "--function-archive", &archive, "--out", &out_arg],
        dir.path(),
    );
    assert!(first.status.success(), "stderr: {}", String::from_utf8_lossy(&first.stderr));
    let artifact = out.join("dev").join("stack.json");
    assert!(artifact.exists());

    let envs = dir.path().join("environments.yaml");
    fs::write(
        &envs,
        "environments:\n  - name: cdktfworkshop-dev\n    environment: dev\n    region: us-east-1\n    setup_custom_domain: true\n",
    )
    .expect("write environments");
    let second = strata(
        &[
            "synth",
            "--environments",
            &envs.display().to_string(),
            "--function-archive",
            &archive,
            "--out",
            &out_arg,
        ],
        dir.path(),
    );
    assert!(!second.status.success());
    let stderr = String::from_utf8_lossy(&second.stderr);
    assert!(stderr.contains("1 of 1 environment(s) failed"), "stderr: {stderr}");
    assert!(!artifact.exists(), "previous artifact still present");
}

#[test]
fn write_failure_does_not_stop_other_environments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = write_archive(dir.path());
    let out = dir.path().join("out");
    fs::create_dir_all(&out).expect("out dir");
    // A plain file where the dev directory belongs.
    fs::write(out.join("dev"), b"not a directory").expect("blocker");

    let output = strata(
        &["synth", "--function-archive", &archive, "--out", &out.display().to_string()],
        dir.path(),
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 of 3 environment(s) failed"), "stderr: {stderr}");
    for env in ["demo", "test"] {
        assert!(out.join(env).join("stack.json").exists(), "{env} artifact missing");
    }
}

#[test]
fn synth_rejects_stale_function_hash() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = write_archive(dir.path());
    let stale = "0".repeat(64);
    let output = strata(
        &["synth", "--function-archive", &archive, "--function-hash", &stale],
        dir.path(),
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hash mismatch"), "stderr: {stderr}");
}

#[test]
fn plan_lists_resources_in_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = write_archive(dir.path());
    let output = strata(&["plan", "--only", "dev", "--function-archive", &archive], dir.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let bucket = stdout
        .find("+ aws_s3_bucket.ui-deployment-dev_s3-ui-deployment")
        .expect("bucket line");
    let distribution = stdout
        .find("+ aws_cloudfront_distribution.")
        .expect("distribution line");
    assert!(bucket < distribution);
    assert!(stdout.contains("32 resource(s) will be created."), "stdout: {stdout}");
}

#[test]
fn environments_file_drives_the_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = write_archive(dir.path());
    let envs = dir.path().join("environments.yaml");
    fs::write(
        &envs,
        "environments:\n  - name: api-only\n    environment: staging\n    region: eu-west-1\n",
    )
    .expect("write environments");

    let output = strata(
        &["plan", "--environments", &envs.display().to_string(), "--function-archive", &archive],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deployment plan for: staging (api-only)"), "stdout: {stdout}");
    assert!(!stdout.contains("aws_s3_bucket."), "stdout: {stdout}");
}

#[test]
fn graph_prints_dot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let archive = write_archive(dir.path());
    let output = strata(
        &["graph", "--environment", "demo", "--function-archive", &archive],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("digraph"), "stdout: {stdout}");
}
