mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn root_banner_uses_success_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(&server.base_url).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "LoveAIHub API");
    assert!(body["data"]["endpoints"].is_object());

    Ok(())
}

#[tokio::test]
async fn health_reports_database_state() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/health", server.base_url))
        .send()
        .await?;

    // OK with a database, degraded without one; both are valid states here
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected health status {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    assert!(body.get("success").is_some());
    assert!(body["data"]["status"].is_string());

    Ok(())
}
