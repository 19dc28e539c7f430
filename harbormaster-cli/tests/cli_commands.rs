//! End-to-end checks of the `harbormaster` binary.
//!
//! Registry calls point at a closed local port so provisioning exercises the
//! failure paths without network access.

use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

use harbormaster_core::{store, CredentialEnvVariable, EnvVarName, InternalProjectId};

const UNREACHABLE_API: &str = "http://127.0.0.1:9/api/";

fn harbormaster_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("harbormaster"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("LAGOON_ROUTES")
        .env_remove("HARBOR_BASE_API_URL")
        .env("RUST_LOG", "error");
    cmd
}

#[test]
fn routes_fall_back_to_defaults() {
    let home = TempDir::new().expect("home");
    harbormaster_cmd(home.path())
        .arg("routes")
        .assert()
        .success()
        .stdout(contains("http://172.17.0.1:8084"))
        .stdout(contains("http://webhook-handler:3000"));
}

#[test]
fn routes_pick_matching_entries_from_env() {
    let home = TempDir::new().expect("home");
    let output = harbormaster_cmd(home.path())
        .args(["routes", "--json"])
        .env(
            "LAGOON_ROUTES",
            "a.example.com,harbor-nginx.example.com,webhook-handler.example.com",
        )
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["registry_url"], "harbor-nginx.example.com");
    assert_eq!(value["webhook_url"], "webhook-handler.example.com");
}

#[test]
fn config_file_routes_are_used() {
    let home = TempDir::new().expect("home");
    let dir = home.path().join(".harbormaster");
    std::fs::create_dir_all(&dir).expect("mkdir");
    std::fs::write(dir.join("config.yaml"), "routes: https://harbor-nginx.cfg.test\n").expect("write");

    harbormaster_cmd(home.path())
        .arg("routes")
        .assert()
        .success()
        .stdout(contains("https://harbor-nginx.cfg.test"));
}

#[test]
fn env_list_empty_project() {
    let home = TempDir::new().expect("home");
    harbormaster_cmd(home.path())
        .args(["env", "list", "7"])
        .assert()
        .success()
        .stdout(contains("No credential records for project 7"));
}

#[test]
fn env_list_masks_password_unless_asked() {
    let home = TempDir::new().expect("home");
    let owner = InternalProjectId(7);
    for (name, value) in [
        (EnvVarName::InternalRegistryUsername, "robot$foo"),
        (EnvVarName::InternalRegistryPassword, "topsecret"),
    ] {
        store::insert_env_variable_at(
            home.path(),
            &CredentialEnvVariable::registry(name, value, owner),
        )
        .expect("insert");
    }

    harbormaster_cmd(home.path())
        .args(["env", "list", "7"])
        .assert()
        .success()
        .stdout(contains("INTERNAL_REGISTRY_USERNAME"))
        .stdout(contains("robot$foo"))
        .stdout(contains("topsecret").not());

    harbormaster_cmd(home.path())
        .args(["env", "list", "7", "--show-secrets"])
        .assert()
        .success()
        .stdout(contains("topsecret"));
}

#[test]
fn env_projects_lists_owners_with_records() {
    let home = TempDir::new().expect("home");
    harbormaster_cmd(home.path())
        .args(["env", "projects"])
        .assert()
        .success()
        .stdout(contains("No projects have stored credential records"));

    for id in [12, 3] {
        store::insert_env_variable_at(
            home.path(),
            &CredentialEnvVariable::registry(
                EnvVarName::InternalRegistryUrl,
                "http://172.17.0.1:8084",
                InternalProjectId(id),
            ),
        )
        .expect("insert");
    }
    let output = harbormaster_cmd(home.path())
        .args(["env", "projects", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let ids: Vec<u64> = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(ids, vec![3, 12]);
}

#[test]
fn provision_against_unreachable_registry_still_returns() {
    let home = TempDir::new().expect("home");
    let output = harbormaster_cmd(home.path())
        .args(["provision", "foo", "--project-id", "7", "--json"])
        .env("HARBOR_BASE_API_URL", UNREACHABLE_API)
        .env("HARBOR_TIMEOUT_SECS", "2")
        .output()
        .expect("run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let statuses: Vec<(&str, &str)> = report["steps"]
        .as_array()
        .expect("steps")
        .iter()
        .map(|s| {
            (
                s["step"].as_str().unwrap_or_default(),
                s["status"].as_str().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("create_project", "failed"),
            ("resolve_project_id", "failed"),
            ("create_robot", "skipped"),
            ("store_credentials", "skipped"),
            ("create_webhook", "skipped"),
        ]
    );
    assert!(store::load_env_at(home.path(), InternalProjectId(7))
        .expect("load")
        .is_empty());
}

#[test]
fn strict_provision_exits_non_zero_on_failures() {
    let home = TempDir::new().expect("home");
    harbormaster_cmd(home.path())
        .args(["provision", "foo", "--project-id", "7", "--strict"])
        .env("HARBOR_BASE_API_URL", UNREACHABLE_API)
        .env("HARBOR_TIMEOUT_SECS", "2")
        .assert()
        .failure()
        .stderr(contains("failed step"));
}

#[test]
fn deprovision_against_unreachable_registry_stops_after_lookup() {
    let home = TempDir::new().expect("home");
    harbormaster_cmd(home.path())
        .args(["deprovision", "foo", "--json"])
        .env("HARBOR_BASE_API_URL", UNREACHABLE_API)
        .env("HARBOR_TIMEOUT_SECS", "2")
        .assert()
        .success()
        .stdout(contains("resolve_project_id"))
        .stdout(contains("delete_project").not());
}

#[test]
fn invalid_timeout_setting_is_reported() {
    let home = TempDir::new().expect("home");
    harbormaster_cmd(home.path())
        .arg("routes")
        .env("HARBOR_TIMEOUT_SECS", "soon")
        .assert()
        .failure()
        .stderr(contains("HARBOR_TIMEOUT_SECS"));
}
