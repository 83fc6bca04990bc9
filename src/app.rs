use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_capability, Capability};
use crate::state::AppState;

/// Full HTTP surface. Public routes need nothing, protected routes need a
/// bearer token plus the capability their group declares, elevated routes
/// need the platform ADMIN capability.
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(public_routes())
        // Bearer token required
        .merge(protected_routes(&state))
        .merge(elevated_routes(&state));

    // Global middleware
    if state.config.security.enable_cors {
        app = app.layer(cors_layer(&state.config.security));
    }
    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn guarded(router: Router<AppState>, capability: Capability) -> Router<AppState> {
    router.route_layer(from_fn_with_state(capability, require_capability))
}

fn public_routes() -> Router<AppState> {
    use public::{auth, plans, tenants};

    Router::new()
        // Store onboarding
        .route(
            "/api/v1/tenants",
            post(tenants::tenant_create).get(tenants::tenant_list),
        )
        .route("/api/v1/tenants/:slug", get(tenants::tenant_show))
        // Token acquisition
        .route("/api/v1/auth/register", post(auth::merchant_register))
        .route("/api/v1/auth/login", post(auth::login))
        .route(
            "/api/v1/auth/customer/:store_slug/register",
            post(auth::customer_register),
        )
        // Catalog
        .route("/api/v1/subscriptions/plans", get(plans::plans_list))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(tenant_routes())
        .merge(user_routes())
        .merge(customer_routes())
        .merge(catalog_routes())
        .merge(shop_routes())
        .merge(order_admin_routes())
        .merge(billing_routes())
        .merge(subscription_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn tenant_routes() -> Router<AppState> {
    Router::new().route("/api/v1/tenants/my", get(protected::tenants::tenant_my))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    let managed = Router::new()
        .route("/api/v1/users", post(users::user_create))
        .route("/api/v1/users/tenant/:tenant_id", get(users::user_list));

    // Self lookup is checked in the handler
    guarded(managed, Capability::ManageUsers)
        .route("/api/v1/users/:email", get(users::user_show))
}

fn customer_routes() -> Router<AppState> {
    use protected::customers;

    let router = Router::new()
        .route(
            "/api/v1/customers",
            post(customers::customer_create).get(customers::customer_list),
        )
        // GET takes an email, PUT and DELETE take the customer id
        .route(
            "/api/v1/customers/:key",
            get(customers::customer_show)
                .put(customers::customer_update)
                .delete(customers::customer_delete),
        );

    guarded(router, Capability::ManageCustomers)
}

fn catalog_routes() -> Router<AppState> {
    use protected::{discounts, products};

    let router = Router::new()
        .route("/api/v1/products", post(products::product_create))
        .route(
            "/api/v1/products/:id",
            put(products::product_update).delete(products::product_delete),
        )
        .route(
            "/api/v1/products/:id/variants/:variant_id",
            put(products::variant_update),
        )
        .route(
            "/api/v1/discounts",
            post(discounts::discount_create).get(discounts::discount_list),
        )
        .route(
            "/api/v1/discounts/:id",
            get(discounts::discount_show)
                .put(discounts::discount_update)
                .delete(discounts::discount_delete),
        )
        .route("/api/v1/discounts/:id/activate", post(discounts::discount_activate))
        .route("/api/v1/discounts/:id/deactivate", post(discounts::discount_deactivate));

    guarded(router, Capability::ManageCatalog)
}

fn shop_routes() -> Router<AppState> {
    use protected::{cart, discounts, orders, products};

    let router = Router::new()
        // Browsing; the GETs share paths with the catalog group
        .route("/api/v1/products", get(products::product_list))
        .route("/api/v1/products/slug/:slug", get(products::product_show_by_slug))
        .route("/api/v1/products/:id", get(products::product_show))
        .route("/api/v1/discounts/validate", post(discounts::discount_validate))
        .route("/api/v1/orders/cart/add", post(cart::cart_add))
        .route("/api/v1/orders/cart", get(cart::cart_show).delete(cart::cart_clear))
        .route("/api/v1/orders/checkout", post(cart::checkout))
        .route("/api/v1/orders/my", get(orders::order_list_mine))
        .route(
            "/api/v1/orders/number/:order_number",
            get(orders::order_show_by_number),
        )
        .route("/api/v1/orders/:id", get(orders::order_show))
        .route("/api/v1/orders/:id/pay", post(orders::order_pay));

    guarded(router, Capability::Shop)
}

fn order_admin_routes() -> Router<AppState> {
    use protected::orders;

    let router = Router::new()
        .route("/api/v1/orders", get(orders::order_list))
        .route("/api/v1/orders/:id/status", patch(orders::order_update_status));

    guarded(router, Capability::ManageOrders)
}

fn billing_routes() -> Router<AppState> {
    use protected::billing;

    let router = Router::new()
        .route("/api/v1/invoices", get(billing::invoice_list))
        .route("/api/v1/payments", get(billing::payment_list));

    guarded(router, Capability::ViewBilling)
}

fn subscription_routes() -> Router<AppState> {
    use protected::subscriptions;

    let router = Router::new()
        .route("/api/v1/subscriptions/me", get(subscriptions::subscription_current))
        .route("/api/v1/subscriptions/subscribe", post(subscriptions::subscribe))
        .route("/api/v1/subscriptions/cancel", post(subscriptions::subscription_cancel));

    guarded(router, Capability::ManageSubscription)
}

fn elevated_routes(state: &AppState) -> Router<AppState> {
    use elevated::plans;

    let router = Router::new()
        .route("/api/v1/subscriptions/plans", post(plans::plan_create))
        .route(
            "/api/v1/subscriptions/plans/:id",
            put(plans::plan_update).delete(plans::plan_deactivate),
        );

    guarded(router, Capability::ManagePlans)
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}
