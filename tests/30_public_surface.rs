mod common;

use anyhow::Result;
use reqwest::StatusCode;

/// The image read path takes a caller-supplied filename, so anything that is
/// not a single plain path component must be rejected before it touches the
/// filesystem.
#[tokio::test]
async fn image_route_rejects_unsafe_filenames() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for name in [".env", ".hidden", "..%2F..%2Fetc%2Fpasswd"] {
        let res = client
            .get(format!("{}/api/images/{}", server.base_url, name))
            .send()
            .await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for {}",
            name
        );

        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["success"], false);
    }

    Ok(())
}

#[tokio::test]
async fn unknown_image_is_not_found() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/api/images/0011223344556677_1700000000000.png",
            server.base_url
        ))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

/// Webhook deliveries without the signature header are refused before any
/// parsing or database work happens.
#[tokio::test]
async fn webhook_requires_signature_header() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/webhooks/razorpay", server.base_url))
        .body(r#"{"event":"subscription.activated","payload":{}}"#)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");

    Ok(())
}
