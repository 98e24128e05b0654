//! CLI subprocess integration tests.
//!
//! These tests invoke the `geopub` binary as a subprocess and verify exit
//! codes and output. Nothing here needs a running GeoServer: requests go to
//! a closed port or fail before any network call.

use std::process::Command;

// Nothing listens on port 1, so connecting is refused immediately.
const UNREACHABLE: &str = "http://127.0.0.1:1/geoserver";

fn geopub_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_geopub"));
    cmd.env_remove("GEOPUB_LOG");
    cmd
}

#[test]
fn cli_version_exits_zero() {
    let output = geopub_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "geopub --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("geopub"),
        "version output must contain 'geopub': {stdout}"
    );
}

#[test]
fn cli_help_lists_commands() {
    let output = geopub_bin().arg("--help").output().unwrap();
    assert!(output.status.success(), "geopub --help must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in [
        "create-workspace",
        "publish-shp",
        "create-group",
        "create-style",
        "remove-store",
    ] {
        assert!(stdout.contains(cmd), "help must list '{cmd}': {stdout}");
    }
}

#[test]
fn cli_completions_bash() {
    let output = geopub_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("geopub"), "bash completions must mention geopub");
}

#[test]
fn cli_man_pages_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("man");
    let output = geopub_bin()
        .args(["man-pages", out.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(out.join("geopub.1").exists());
    assert!(out.join("geopub-publish-shp.1").exists());
}

#[test]
fn cli_bad_url_is_config_error() {
    let output = geopub_bin()
        .args(["--url", "localhost:8080", "list", "workspace"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config error"), "stderr: {stderr}");
}

#[test]
fn cli_missing_config_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = geopub_bin()
        .env("GEOPUB_CONFIG", dir.path().join("absent.toml"))
        .args(["list", "workspace"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_config_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, format!("[server]\nurl = \"{UNREACHABLE}\"\n")).unwrap();
    let output = geopub_bin()
        .args(["--config", path.to_str().unwrap(), "list", "workspace"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "file URL must be dialled");
}

#[test]
fn cli_shp_archive_must_be_zip() {
    let output = geopub_bin()
        .args(["--url", UNREACHABLE, "publish-shp", "topp", "parcels.shp"])
        .output()
        .unwrap();
    assert_eq!(
        output.status.code(),
        Some(2),
        "a .shp path is rejected before any request"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid input"), "stderr: {stderr}");
}

#[test]
fn cli_connection_refused_is_transport_error() {
    let output = geopub_bin()
        .args(["--url", UNREACHABLE, "exists", "workspace", "topp"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("transport error"), "stderr: {stderr}");
}

#[test]
fn cli_unscoped_layer_list_queries_server() {
    let output = geopub_bin()
        .args(["--url", UNREACHABLE, "list", "layer"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn cli_scoped_query_needs_workspace() {
    let output = geopub_bin()
        .args(["--url", UNREACHABLE, "exists", "datastore", "roads"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--workspace"), "stderr: {stderr}");
}

#[test]
fn cli_remove_workspace_needs_yes_off_terminal() {
    let output = geopub_bin()
        .args(["--url", UNREACHABLE, "remove-workspace", "topp"])
        .stdin(std::process::Stdio::null())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--yes"), "stderr: {stderr}");
}

#[test]
fn cli_group_needs_layers() {
    let output = geopub_bin()
        .args(["--url", UNREACHABLE, "create-group", "topp", "base"])
        .output()
        .unwrap();
    assert!(!output.status.success(), "clap rejects a group without layers");
}
