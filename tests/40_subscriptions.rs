mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

async fn plan_id(app: &TestApp, slug: &str) -> Result<String> {
    let res = app.get("/api/v1/subscriptions/plans", None).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let plans = common::body(res).await?;
    plans["data"]
        .as_array()
        .and_then(|plans| plans.iter().find(|p| p["slug"] == slug))
        .and_then(|p| p["id"].as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("plan {} missing from {}", slug, plans))
}

#[tokio::test]
async fn catalog_is_public_and_seeded() -> Result<()> {
    let app = common::spawn_app().await?;
    let res = app.get("/api/v1/subscriptions/plans", None).await?;
    let plans = common::body(res).await?;
    let slugs: Vec<&str> = plans["data"]
        .as_array()
        .map(|plans| plans.iter().filter_map(|p| p["slug"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(slugs, vec!["free", "basic", "pro", "enterprise"]);
    Ok(())
}

#[tokio::test]
async fn resubscribing_keeps_one_active_subscription() -> Result<()> {
    let app = common::spawn_app().await?;
    let merchant = app.merchant("acme").await?;

    let res = app.get("/api/v1/subscriptions/me", Some(&merchant)).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let basic = plan_id(&app, "basic").await?;
    let pro = plan_id(&app, "pro").await?;

    let res = app
        .post("/api/v1/subscriptions/subscribe", Some(&merchant), &json!({ "planId": basic }))
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let first = common::body(res).await?["data"].clone();
    assert_eq!(first["status"], "ACTIVE");
    assert_eq!(first["autoRenew"], true);

    let res = app
        .post("/api/v1/subscriptions/subscribe", Some(&merchant), &json!({ "planId": pro }))
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app.get("/api/v1/subscriptions/me", Some(&merchant)).await?;
    let current: Value = common::body(res).await?["data"].clone();
    assert_eq!(current["planId"], json!(pro));

    // Two paid subscriptions, two settled invoices
    let res = app.get("/api/v1/invoices", Some(&merchant)).await?;
    assert_eq!(common::body(res).await?["data"].as_array().map(Vec::len), Some(2));

    let res = app.post("/api/v1/subscriptions/cancel", Some(&merchant), &json!({})).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let canceled = common::body(res).await?["data"].clone();
    assert_eq!(canceled["autoRenew"], false);
    assert_eq!(canceled["status"], "ACTIVE");
    Ok(())
}

#[tokio::test]
async fn free_plan_needs_no_payment() -> Result<()> {
    let app = common::spawn_app().await?;
    let merchant = app.merchant("acme").await?;
    let free = plan_id(&app, "free").await?;

    let res = app
        .post(
            "/api/v1/subscriptions/subscribe",
            Some(&merchant),
            &json!({ "planId": free, "paymentMethod": "BITCOIN" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app.get("/api/v1/payments", Some(&merchant)).await?;
    assert_eq!(common::body(res).await?["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn cancel_without_subscription_is_not_found() -> Result<()> {
    let app = common::spawn_app().await?;
    let merchant = app.merchant("acme").await?;
    let res = app.post("/api/v1/subscriptions/cancel", Some(&merchant), &json!({})).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn only_admins_manage_plans() -> Result<()> {
    let app = common::spawn_app().await?;
    let merchant = app.merchant("acme").await?;
    let admin = app.admin().await?;
    let growth = json!({
        "name": "Growth",
        "slug": "growth",
        "price": "49.00",
        "billingInterval": "YEARLY",
        "features": "Up to 500 products"
    });

    let res = app.post("/api/v1/subscriptions/plans", None, &growth).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let res = app.post("/api/v1/subscriptions/plans", Some(&merchant), &growth).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.post("/api/v1/subscriptions/plans", Some(&admin), &growth).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let plan = common::body(res).await?["data"].clone();
    let id = plan["id"].as_str().unwrap_or_default().to_string();

    let res = app.post("/api/v1/subscriptions/plans", Some(&admin), &growth).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .client
        .delete(app.url(&format!("/api/v1/subscriptions/plans/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(common::body(res).await?["data"]["active"], false);

    // Retired plans drop out of the catalog and cannot be bought
    let res = app
        .post("/api/v1/subscriptions/subscribe", Some(&merchant), &json!({ "planId": id }))
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(plan_id(&app, "growth").await.is_err());
    Ok(())
}
