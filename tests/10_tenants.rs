mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.get("/health", None).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = common::body(res).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn tenant_create_and_duplicate() -> Result<()> {
    let app = common::spawn_app().await?;
    let payload = json!({ "name": "Acme Store", "slug": "acme-store", "ownerEmail": "a@acme.com" });

    let res = app.post("/api/v1/tenants", None, &payload).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = common::body(res).await?;
    assert_eq!(body["data"]["slug"], "acme-store");
    assert_eq!(body["data"]["active"], true);

    let res = app.post("/api/v1/tenants", None, &payload).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = common::body(res).await?;
    assert_eq!(body["code"], "CONFLICT");

    let res = app.get("/api/v1/tenants/acme-store", None).await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn invalid_tenant_lists_field_errors() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app
        .post(
            "/api/v1/tenants",
            None,
            &json!({ "name": "Ab", "slug": "Not Valid", "ownerEmail": "nope" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = common::body(res).await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    for field in ["name", "slug", "ownerEmail"] {
        assert!(body["field_errors"].get(field).is_some(), "missing {} in {}", field, body);
    }
    Ok(())
}

#[tokio::test]
async fn unknown_slug_is_not_found() -> Result<()> {
    let app = common::spawn_app().await?;
    let res = app.get("/api/v1/tenants/ghost", None).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn my_tenant_follows_the_token() -> Result<()> {
    let app = common::spawn_app().await?;

    let res = app.get("/api/v1/tenants/my", None).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = app.merchant("bolt").await?;
    let res = app.get("/api/v1/tenants/my", Some(&token)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(common::body(res).await?["data"]["slug"], "bolt");
    Ok(())
}
