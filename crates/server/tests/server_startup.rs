//! Start the real binary and talk to it over HTTP.

use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn minimal_config(port: u16) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[connection]
library_url = "http://127.0.0.1:9"
library_api_key = "radarr-key"
"#,
        port
    )
}

async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_cinescout"))
        .env("CINESCOUT_CONFIG", config_path)
        .env("RUST_LOG", "error")
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_and_sanitized_config() {
    let port = get_available_port();
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(minimal_config(port).as_bytes())
        .unwrap();
    temp_file.flush().unwrap();

    let mut server = spawn_server(temp_file.path()).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let health: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(health["status"], "ok");

    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let text = response.text().await.unwrap();
    assert!(!text.contains("radarr-key"));
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["connection"]["library_api_key_configured"], true);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_startup_writes_effective_config() {
    let port = get_available_port();
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, minimal_config(port)).unwrap();

    let mut server = spawn_server(&config_path).await;
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    // Defaults are filled in on disk.
    let saved = std::fs::read_to_string(&config_path).unwrap();
    assert!(saved.contains("minimum_votes"));
    assert!(saved.contains("root_folder_path"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let invalid = r#"
[server]
port = 5000

[discovery]
language = "English"
"#;

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(invalid.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_cinescout"))
            .env("CINESCOUT_CONFIG", temp_file.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_malformed_config_exits_with_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[server\nport = ").unwrap();
    temp_file.flush().unwrap();

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_cinescout"))
            .env("CINESCOUT_CONFIG", temp_file.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
