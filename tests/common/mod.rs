#![allow(dead_code)]

use anyhow::{Context, Result};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

use storefront_api::app::build_router;
use storefront_api::config::{AppConfig, Environment};
use storefront_api::database::Stores;
use storefront_api::payment::PaymentDispatcher;
use storefront_api::state::AppState;

/// One server per test, bound to an ephemeral port over in-memory stores.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub state: AppState,
}

pub async fn spawn_app() -> Result<TestApp> {
    let config = AppConfig::for_environment(Environment::Development);
    let state = AppState::new(config, Stores::memory(), PaymentDispatcher::with_defaults())?;
    state.services.subscriptions.seed_default_plans().await?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let base_url = format!("http://{}", listener.local_addr()?);

    let app = build_router(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestApp {
        base_url,
        client: reqwest::Client::new(),
        state,
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<Response> {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Ok(req.send().await?)
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> Result<Response> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Ok(req.send().await?)
    }

    /// Store plus MERCHANT owner; returns the owner's bearer token.
    pub async fn merchant(&self, slug: &str) -> Result<String> {
        let email = format!("owner@{}.test", slug);
        let res = self
            .post(
                "/api/v1/auth/register",
                None,
                &json!({
                    "storeName": format!("Store {}", slug),
                    "storeSlug": slug,
                    "email": email,
                    "password": "password123",
                    "fullName": "Store Owner"
                }),
            )
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        self.login(&email, "password123", Some(slug)).await
    }

    pub async fn login(&self, email: &str, password: &str, slug: Option<&str>) -> Result<String> {
        let res = self
            .post(
                "/api/v1/auth/login",
                None,
                &json!({ "email": email, "password": password, "storeSlug": slug }),
            )
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        token_of(res).await
    }

    /// Shopper account in `slug`; returns its bearer token.
    pub async fn customer(&self, slug: &str, email: &str) -> Result<String> {
        let res = self
            .post(
                &format!("/api/v1/auth/customer/{}/register", slug),
                None,
                &json!({
                    "email": email,
                    "password": "password123",
                    "firstName": "Casey",
                    "lastName": "Shopper"
                }),
            )
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "customer signup failed: {}", res.status());
        token_of(res).await
    }

    /// Single-variant product in the caller's store; returns the product JSON.
    pub async fn product(&self, token: &str, sku: &str, name: &str, price: &str, stock: u32) -> Result<Value> {
        let res = self
            .post(
                "/api/v1/products",
                Some(token),
                &json!({
                    "name": name,
                    "slug": sku.to_ascii_lowercase(),
                    "variants": [{ "sku": sku, "price": price, "stockLevel": stock }]
                }),
            )
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "product create failed: {}", res.status());
        Ok(body(res).await?["data"].clone())
    }

    /// Platform ADMIN token, provisioned directly through the services.
    pub async fn admin(&self) -> Result<String> {
        let (_, admin) = self
            .state
            .services
            .tenants
            .register_platform_admin("root@platform.test", "rootpass123", "Root")
            .await?;
        Ok(self.state.jwt.issue(&admin)?)
    }
}

async fn token_of(res: Response) -> Result<String> {
    let body = res.json::<Value>().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("no token in {}", body))
}

pub async fn body(res: Response) -> Result<Value> {
    Ok(res.json::<Value>().await?)
}
