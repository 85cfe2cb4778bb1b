use std::path::Path;
use std::process::Output;

use serde_json::{Value, json};
use tokio::process::Command;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the CLI binary against `server` with an isolated credential file.
pub async fn run_cli(args: &[&str], store: &Path, server: &MockServer) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bazaar"));
    cmd.args(args);
    cmd.env("BAZAAR_API_ORIGIN", format!("{}/api", server.uri()));
    cmd.env("BAZAAR_STORE", store);
    cmd.env_remove("RUST_LOG");
    cmd.env("NO_COLOR", "1");
    cmd.output().await.expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub async fn run_cli_success(args: &[&str], store: &Path, server: &MockServer) -> String {
    let output = run_cli(args, store, server).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub async fn run_cli_failure(args: &[&str], store: &Path, server: &MockServer) -> String {
    let output = run_cli(args, store, server).await;
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Write a credential file the way the CLI stores it.
pub fn seed_store(store: &Path, access: &str, refresh: &str) {
    let document = json!({
        "accessToken": access,
        "refreshToken": refresh,
        "savedAt": "2026-01-01T00:00:00Z",
    });
    std::fs::write(store, document.to_string()).expect("Failed to seed store");
}

pub fn read_store(store: &Path) -> Option<Value> {
    let json = std::fs::read_to_string(store).ok()?;
    serde_json::from_str(&json).ok()
}

/// Serve `total_pages` pages of products, two per page, for `page_size=2`.
pub async fn mount_products(server: &MockServer, route: &str, total_pages: u32) {
    for page in 1..=total_pages {
        let items = json!([
            { "id": format!("p{}a", page), "title": format!("Item {}a", page) },
            { "id": format!("p{}b", page), "title": format!("Item {}b", page) },
        ]);
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param("page", page.to_string()))
            .and(query_param("pageSize", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "items": items, "totalPages": total_pages })),
            )
            .mount(server)
            .await;
    }
}

/// Answer a refresh exchange for `refresh_token`.
pub async fn mount_refresh(server: &MockServer, refresh_token: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(wiremock::matchers::body_json(
            json!({ "refreshToken": refresh_token }),
        ))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Reject requests carrying `token`.
pub async fn mount_expired(server: &MockServer, route: &str, token: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": "TokenExpired", "message": "expired" })),
        )
        .mount(server)
        .await;
}
