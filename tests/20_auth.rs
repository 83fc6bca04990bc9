mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_issues_bearer_token() -> Result<()> {
    let app = common::spawn_app().await?;
    app.merchant("acme").await?;

    let res = app
        .post(
            "/api/v1/auth/login",
            None,
            &json!({ "email": "OWNER@acme.test", "password": "password123" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = common::body(res).await?;
    assert_eq!(body["data"]["tokenType"], "Bearer");
    assert_eq!(body["data"]["user"]["role"], "MERCHANT");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() -> Result<()> {
    let app = common::spawn_app().await?;
    app.merchant("acme").await?;

    for (email, password) in [("owner@acme.test", "wrong-password"), ("ghost@acme.test", "password123")] {
        let res = app
            .post("/api/v1/auth/login", None, &json!({ "email": email, "password": password }))
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(common::body(res).await?["message"], "Invalid credentials");
    }
    Ok(())
}

#[tokio::test]
async fn shared_email_without_store_gets_the_plain_rejection() -> Result<()> {
    let app = common::spawn_app().await?;
    app.merchant("acme").await?;
    app.merchant("bolt").await?;
    app.customer("acme", "casey@mail.test").await?;
    app.customer("bolt", "casey@mail.test").await?;

    let res = app
        .post(
            "/api/v1/auth/login",
            None,
            &json!({ "email": "casey@mail.test", "password": "password123" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body(res).await?["message"], "Invalid credentials");

    app.login("casey@mail.test", "password123", Some("bolt")).await?;
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let app = common::spawn_app().await?;
    let res = app.get("/api/v1/orders/my", Some("not.a.jwt")).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn customer_cannot_reach_back_office() -> Result<()> {
    let app = common::spawn_app().await?;
    app.merchant("acme").await?;
    let shopper = app.customer("acme", "casey@mail.test").await?;

    let res = app.get("/api/v1/customers", Some(&shopper)).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.get("/api/v1/orders", Some(&shopper)).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app
        .post(
            "/api/v1/products",
            Some(&shopper),
            &json!({ "name": "Free", "slug": "free", "variants": [{ "sku": "FREE", "price": "0" }] }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.get("/api/v1/orders/cart", Some(&shopper)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn customer_signup_creates_customer_record() -> Result<()> {
    let app = common::spawn_app().await?;
    let merchant = app.merchant("acme").await?;
    app.customer("acme", "casey@mail.test").await?;

    let res = app.get("/api/v1/customers/casey@mail.test", Some(&merchant)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(common::body(res).await?["data"]["firstName"], "Casey");

    let res = app
        .post(
            "/api/v1/auth/customer/acme/register",
            None,
            &json!({
                "email": "casey@mail.test",
                "password": "password123",
                "firstName": "Casey",
                "lastName": "Again"
            }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn staff_cannot_manage_users() -> Result<()> {
    let app = common::spawn_app().await?;
    let merchant = app.merchant("acme").await?;

    let res = app
        .post(
            "/api/v1/users",
            Some(&merchant),
            &json!({
                "email": "clerk@acme.test",
                "password": "password123",
                "fullName": "Clerk",
                "role": "STAFF"
            }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let staff = app.login("clerk@acme.test", "password123", Some("acme")).await?;
    let res = app
        .post(
            "/api/v1/users",
            Some(&staff),
            &json!({
                "email": "other@acme.test",
                "password": "password123",
                "fullName": "Other",
                "role": "STAFF"
            }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Own profile stays readable
    let res = app.get("/api/v1/users/clerk@acme.test", Some(&staff)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = app.get("/api/v1/users/owner@acme.test", Some(&staff)).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn merchant_cannot_mint_admins() -> Result<()> {
    let app = common::spawn_app().await?;
    let merchant = app.merchant("acme").await?;

    let res = app
        .post(
            "/api/v1/users",
            Some(&merchant),
            &json!({
                "email": "boss@acme.test",
                "password": "password123",
                "fullName": "Boss",
                "role": "ADMIN"
            }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
