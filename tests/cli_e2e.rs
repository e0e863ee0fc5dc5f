//! End-to-end CLI tests for the kb-export binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Command isolated from the user's config file and cookie environment.
fn kb_export(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kb-export").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("KB_EXPORT_COOKIE")
        .env_remove("RUST_LOG");
    cmd
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/catalog_nodes"))
        .and(query_param("book_id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "type": "TITLE", "title": "Guides", "uuid": "A", "url": "", "parent_uuid": "" },
                { "type": "DOC", "title": "Intro", "uuid": "B", "url": "intro-x1", "parent_uuid": "A" },
                { "type": "DOC", "title": "Setup", "uuid": "C", "url": "setup-y2", "parent_uuid": "A" }
            ]
        })))
        .mount(server)
        .await;
}

async fn mount_document(server: &MockServer, locator: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/team/handbook/{locator}/markdown")))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Runs the binary off the async runtime so the mock server keeps serving.
async fn run_blocking(mut cmd: Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap()
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let config_home = TempDir::new().unwrap();
    kb_export(config_home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export a hosted knowledge base"))
        .stdout(predicate::str::contains("--book-id"))
        .stdout(predicate::str::contains("Exit codes"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let config_home = TempDir::new().unwrap();
    kb_export(config_home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kb-export"));
}

/// Test that missing required arguments cause a usage error.
#[test]
fn test_binary_missing_args_returns_error() {
    let config_home = TempDir::new().unwrap();
    kb_export(config_home.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--book-id"));
}

#[test]
fn test_binary_invalid_namespace_returns_error() {
    let config_home = TempDir::new().unwrap();
    kb_export(config_home.path())
        .args(["--book-id", "42", "--namespace", "only-owner"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("namespace"));
}

#[test]
fn test_binary_invalid_config_file_is_fatal() {
    let config_home = TempDir::new().unwrap();
    let app_dir = config_home.path().join("kb-export");
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(app_dir.join("config.toml"), "concurrency = 4\n").unwrap();

    kb_export(config_home.path())
        .args(["--book-id", "42", "--namespace", "team/handbook"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config"));
}

#[test]
fn test_binary_unreadable_cookie_file_is_fatal() {
    let config_home = TempDir::new().unwrap();
    let missing = config_home.path().join("cookies.json");

    kb_export(config_home.path())
        .args(["--book-id", "42", "--namespace", "team/handbook"])
        .arg("--cookie-file")
        .arg(&missing)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cookie file"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_exports_catalog_and_exits_zero() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    mount_document(&server, "intro-x1", 200, "# Intro\n").await;
    mount_document(&server, "setup-y2", 200, "# Setup\n").await;
    let config_home = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let mut cmd = kb_export(config_home.path());
    cmd.args(["--book-id", "42", "--namespace", "team/handbook"])
        .arg("--service-base")
        .arg(server.uri())
        .args(["--rate-limit", "0"])
        .arg("-o")
        .arg(output.path());
    run_blocking(cmd)
        .await
        .code(0)
        .stdout(predicate::str::contains("2 saved"));

    let guides = output.path().join("Guides");
    assert_eq!(
        std::fs::read_to_string(guides.join("Intro__intro-x1.md")).unwrap(),
        "# Intro\n"
    );
    assert_eq!(
        std::fs::read_to_string(guides.join("Setup__setup-y2.md")).unwrap(),
        "# Setup\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_partial_failure_exits_one() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    mount_document(&server, "intro-x1", 200, "# Intro\n").await;
    mount_document(&server, "setup-y2", 404, "").await;
    let config_home = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let mut cmd = kb_export(config_home.path());
    cmd.args(["--book-id", "42", "--namespace", "team/handbook"])
        .arg("--service-base")
        .arg(server.uri())
        .args(["--rate-limit", "0", "--max-attempts", "1"])
        .arg("-o")
        .arg(output.path());
    run_blocking(cmd)
        .await
        .code(1)
        .stderr(predicate::str::contains("Setup"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_all_documents_failed_exits_two() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    mount_document(&server, "intro-x1", 500, "").await;
    mount_document(&server, "setup-y2", 500, "").await;
    let config_home = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let mut cmd = kb_export(config_home.path());
    cmd.args(["--book-id", "42", "--namespace", "team/handbook"])
        .arg("--service-base")
        .arg(server.uri())
        .args(["--rate-limit", "0", "--max-attempts", "1"])
        .arg("-o")
        .arg(output.path());
    run_blocking(cmd).await.code(2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_listing_failure_exits_two() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/catalog_nodes"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let config_home = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let mut cmd = kb_export(config_home.path());
    cmd.args(["--book-id", "42", "--namespace", "team/handbook"])
        .arg("--service-base")
        .arg(server.uri())
        .args(["--rate-limit", "0", "--max-attempts", "1"])
        .arg("-o")
        .arg(output.path());
    run_blocking(cmd)
        .await
        .code(2)
        .stderr(predicate::str::contains("catalog listing"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_cookie_from_environment_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/catalog_nodes"))
        .and(header("cookie", "_session=env"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;
    let config_home = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();

    let mut cmd = kb_export(config_home.path());
    cmd.env("KB_EXPORT_COOKIE", "_session=env")
        .args(["--book-id", "42", "--namespace", "team/handbook"])
        .arg("--service-base")
        .arg(server.uri())
        .args(["--rate-limit", "0", "--max-attempts", "1"])
        .arg("-o")
        .arg(output.path());
    run_blocking(cmd).await.code(0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_cookie_file_is_joined_into_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/catalog_nodes"))
        .and(header("cookie", "_session=abc; lang=en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;
    let config_home = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let cookie_file = config_home.path().join("cookies.json");
    std::fs::write(
        &cookie_file,
        r#"[{"name": "_session", "value": " abc "}, {"name": "empty", "value": ""}, {"name": "lang", "value": "en"}]"#,
    )
    .unwrap();

    let mut cmd = kb_export(config_home.path());
    cmd.args(["--book-id", "42", "--namespace", "team/handbook"])
        .arg("--service-base")
        .arg(server.uri())
        .args(["--rate-limit", "0", "--max-attempts", "1"])
        .arg("--cookie-file")
        .arg(&cookie_file)
        .arg("-o")
        .arg(output.path());
    run_blocking(cmd).await.code(0);
}
