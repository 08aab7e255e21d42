//! End-to-end HTTP tests against the full router and an in-memory database.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use storehub_api::auth::hash_password;
use storehub_api::email::{EmailError, EmailProvider, LogProvider, OutgoingEmail};
use storehub_api::{build_router, AppConfig, AppState};
use storehub_core::{NewEmployee, Role};
use storehub_db::{Database, DbConfig};
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@store.test";
const ADMIN_PASSWORD: &str = "admin-password";

struct DownProvider;

#[async_trait]
impl EmailProvider for DownProvider {
    async fn send(&self, _message: &OutgoingEmail) -> Result<String, EmailError> {
        Err(EmailError::Provider("503 Service Unavailable".to_string()))
    }
}

struct TestApp {
    router: Router,
    db: Database,
    admin_token: String,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_provider(Arc::new(LogProvider)).await
    }

    async fn with_provider(provider: Arc<dyn EmailProvider>) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Self::build(db, provider).await
    }

    async fn build(db: Database, provider: Arc<dyn EmailProvider>) -> Self {
        let hash = hash_password(ADMIN_PASSWORD).unwrap();
        db.employees()
            .create(
                &NewEmployee {
                    email: ADMIN_EMAIL.to_string(),
                    full_name: "Test Admin".to_string(),
                    role: Role::Admin,
                    password: String::new(),
                    phone: None,
                    hourly_rate_cents: None,
                    hired_at: None,
                },
                &hash,
            )
            .await
            .unwrap();

        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret-0123456789".to_string();
        config.email.alert_recipient = Some("owner@store.test".to_string());

        let state = Arc::new(AppState::with_provider(config, db.clone(), provider));
        let router = build_router(state);

        let mut app = TestApp {
            router,
            db,
            admin_token: String::new(),
        };
        app.admin_token = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        app
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(&self.admin_token), None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(&self.admin_token), Some(body))
            .await
    }

    async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    async fn login_session(&self, email: &str, password: &str) -> Value {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let session = self.login_session(email, password).await;
        session["access_token"].as_str().unwrap().to_string()
    }

    /// Creates a cashier through the API and returns their access token.
    async fn cashier_token(&self) -> String {
        let (status, body) = self
            .post(
                "/api/employees",
                json!({
                    "email": "till@store.test",
                    "full_name": "Till Operator",
                    "role": "cashier",
                    "password": "cashier-password"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        self.login("till@store.test", "cashier-password").await
    }

    async fn create_product(&self, sku: &str, price_cents: i64, quantity: i64) -> String {
        let (status, body) = self
            .post(
                "/api/products",
                json!({
                    "sku": sku,
                    "name": format!("Product {}", sku),
                    "price_cents": price_cents,
                    "cost_cents": price_cents / 2,
                    "tax_rate_bps": 825,
                    "initial_quantity": quantity,
                    "reorder_level": 2
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_template(&self, name: &str, subject: &str, html: &str) {
        let (status, body) = self
            .post(
                "/api/email/templates",
                json!({ "name": name, "subject": subject, "html_body": html }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    assert_eq!(body["migrations"]["total"], body["migrations"]["applied"]);
}

#[tokio::test]
async fn test_auth_required_and_roles() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .request(Method::GET, "/api/products", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/employees",
            json!({
                "email": "casey@store.test",
                "full_name": "Casey Cashier",
                "role": "cashier",
                "password": "cashier-password"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let cashier = app.login("casey@store.test", "cashier-password").await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/products",
            Some(&cashier),
            Some(json!({ "sku": "NOPE", "name": "Nope", "price_cents": 100 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // cashiers can still read the catalog and see themselves
    let (status, _) = app
        .request(Method::GET, "/api/products", Some(&cashier), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, me) = app
        .request(Method::GET, "/api/auth/me", Some(&cashier), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "cashier");
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_product_create_conflict_and_lookup() {
    let app = TestApp::new().await;
    let id = app.create_product("COLA-330", 199, 24).await;

    let (status, body) = app
        .post(
            "/api/products",
            json!({ "sku": "COLA-330", "name": "Another", "price_cents": 150 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = app.get("/api/products/lookup?code=COLA-330").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (status, _) = app.get("/api/products/lookup?code=UNKNOWN").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, level) = app.get(&format!("/api/inventory/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(level["quantity"], 24);
    assert_eq!(level["low_stock"], false);
}

#[tokio::test]
async fn test_sale_and_void_flow() {
    let app = TestApp::new().await;
    let product_id = app.create_product("CHIPS", 250, 10).await;

    let (status, customer) = app
        .post(
            "/api/customers",
            json!({ "first_name": "Jamie", "last_name": "Rivera" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let customer_id = customer["id"].as_str().unwrap().to_string();

    let (status, drawer) = app
        .post(
            "/api/cash-drawers/open",
            json!({ "register_name": "Front", "opening_balance_cents": 10_000 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let drawer_id = drawer["id"].as_str().unwrap().to_string();

    let (status, sale) = app
        .post(
            "/api/sales",
            json!({
                "customer_id": customer_id,
                "cash_drawer_id": drawer_id,
                "payment_method": "cash",
                "tendered_cents": 1_000,
                "items": [{ "product_id": product_id, "quantity": 2 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", sale);
    assert_eq!(sale["status"], "completed");
    assert_eq!(sale["subtotal_cents"], 500);
    let total = sale["total_cents"].as_i64().unwrap();
    assert_eq!(
        total,
        sale["subtotal_cents"].as_i64().unwrap() + sale["tax_cents"].as_i64().unwrap()
    );
    assert_eq!(sale["change_cents"].as_i64().unwrap(), 1_000 - total);
    assert_eq!(sale["items"].as_array().unwrap().len(), 1);
    let sale_id = sale["id"].as_str().unwrap().to_string();

    let (_, level) = app.get(&format!("/api/inventory/{}", product_id)).await;
    assert_eq!(level["quantity"], 8);

    let (_, account) = app
        .get(&format!("/api/loyalty/accounts/{}", customer_id))
        .await;
    assert_eq!(account["points_balance"], sale["points_earned"]);

    let (_, drawer) = app.get(&format!("/api/cash-drawers/{}", drawer_id)).await;
    assert_eq!(drawer["expected_balance_cents"].as_i64().unwrap(), 10_000 + total);

    let (_, history) = app
        .get(&format!("/api/customers/{}/sales", customer_id))
        .await;
    assert_eq!(history["items"].as_array().unwrap().len(), 1);

    let (status, voided) = app
        .post(&format!("/api/sales/{}/void", sale_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", voided);
    assert_eq!(voided["status"], "voided");

    let (_, level) = app.get(&format!("/api/inventory/{}", product_id)).await;
    assert_eq!(level["quantity"], 10);

    let (_, account) = app
        .get(&format!("/api/loyalty/accounts/{}", customer_id))
        .await;
    assert_eq!(account["points_balance"], 0);

    let (_, drawer) = app.get(&format!("/api/cash-drawers/{}", drawer_id)).await;
    assert_eq!(drawer["expected_balance_cents"], 10_000);

    // a second void is a state error
    let (status, body) = app
        .post(&format!("/api/sales/{}/void", sale_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_sale_rejects_oversell() {
    let app = TestApp::new().await;
    let product_id = app.create_product("RARE", 999, 1).await;

    let (status, body) = app
        .post(
            "/api/sales",
            json!({
                "payment_method": "card",
                "items": [{ "product_id": product_id, "quantity": 2 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let (_, level) = app.get(&format!("/api/inventory/{}", product_id)).await;
    assert_eq!(level["quantity"], 1);
}

#[tokio::test]
async fn test_adjustment_rules() {
    let app = TestApp::new().await;
    let product_id = app.create_product("SOAP", 300, 3).await;

    let (status, body) = app
        .post(
            "/api/inventory/adjust",
            json!({ "product_id": product_id, "quantity_change": -5, "reason": "damaged" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let (status, _) = app
        .post(
            "/api/inventory/adjust",
            json!({ "product_id": product_id, "quantity_change": 0, "reason": "damaged" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/inventory/adjust",
            json!({ "product_id": product_id, "quantity_change": 4, "reason": "sale" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/inventory/adjust",
            json!({ "product_id": product_id, "quantity_change": 4, "reason": "count_correction" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["level"]["quantity"], 7);
    assert_eq!(body["adjustment"]["quantity_after"], 7);

    let (_, history) = app
        .get(&format!("/api/inventory/{}/adjustments", product_id))
        .await;
    // opening stock plus the correction
    assert_eq!(history["items"].as_array().unwrap().len(), 2);
    assert_eq!(history["items"][0]["reason"], "count_correction");
}

#[tokio::test]
async fn test_low_stock_alert_is_logged() {
    let app = TestApp::new().await;
    app.create_template(
        "low_stock_alert",
        "Low stock: {{ sku }}",
        "<p>{{ name }} is down to {{ quantity }} (reorder at {{ reorder_level }})</p>",
    )
    .await;
    let product_id = app.create_product("TEA", 450, 5).await;

    let (status, body) = app
        .post(
            "/api/inventory/adjust",
            json!({ "product_id": product_id, "quantity_change": -3, "reason": "shrinkage" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"]["low_stock"], true);

    let (_, logs) = app.get("/api/email/logs").await;
    let logs = logs["items"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["template_name"], "low_stock_alert");
    assert_eq!(logs[0]["recipient"], "owner@store.test");
    assert_eq!(logs[0]["subject"], "Low stock: TEA");
    assert_eq!(logs[0]["status"], "sent");
}

#[tokio::test]
async fn test_email_send_and_logs() {
    let app = TestApp::new().await;
    app.create_template("welcome", "Welcome {{ name }}", "<p>Hi {{ name }}</p>")
        .await;

    let (status, preview) = app
        .post(
            "/api/email/preview",
            json!({ "template": "welcome", "variables": { "name": "<Jo>" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["html_body"], "<p>Hi &lt;Jo&gt;</p>");
    assert_eq!(preview["subject"], "Welcome <Jo>");

    let (status, body) = app
        .post(
            "/api/email/send",
            json!({ "template": "welcome", "to": "jo@store.test", "variables": {} }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("name"));

    let (status, _) = app
        .post(
            "/api/email/send",
            json!({ "template": "welcome", "to": "not-an-address", "variables": { "name": "Jo" } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/email/send",
            json!({ "template": "missing", "to": "jo@store.test", "variables": {} }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, log) = app
        .post(
            "/api/email/send",
            json!({ "template": "welcome", "to": "jo@store.test", "variables": { "name": "Jo" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["status"], "sent");

    // the invalid recipient never reached the service; the other two did
    let (_, logs) = app.get("/api/email/logs").await;
    let logs = logs["items"].as_array().unwrap();
    assert_eq!(logs.len(), 2);
    let statuses: Vec<&str> = logs.iter().map(|l| l["status"].as_str().unwrap()).collect();
    assert!(statuses.contains(&"sent"));
    assert!(statuses.contains(&"failed"));
}

#[tokio::test]
async fn test_email_provider_failure_is_502() {
    let app = TestApp::with_provider(Arc::new(DownProvider)).await;
    app.create_template("welcome", "Welcome {{ name }}", "<p>Hi {{ name }}</p>")
        .await;

    let (status, body) = app
        .post(
            "/api/email/send",
            json!({ "template": "welcome", "to": "jo@store.test", "variables": { "name": "Jo" } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "EMAIL_PROVIDER_ERROR");

    let (_, logs) = app.get("/api/email/logs").await;
    assert_eq!(logs["items"][0]["status"], "failed");
}

#[tokio::test]
async fn test_admin_cannot_deactivate_self() {
    let app = TestApp::new().await;
    let (_, me) = app.get("/api/auth/me").await;
    let id = me["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/api/employees/{}", id),
            Some(&app.admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BUSINESS_RULE");

    // still able to use the API
    let (status, _) = app.get("/api/employees").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_purchase_order_receive() {
    let app = TestApp::new().await;
    let product_id = app.create_product("BEANS", 800, 0).await;

    let (status, supplier) = app
        .post("/api/suppliers", json!({ "name": "Acme Wholesale" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, order) = app
        .post(
            "/api/purchase-orders",
            json!({
                "supplier_id": supplier["id"],
                "items": [{ "product_id": product_id, "quantity": 10, "unit_cost_cents": 400 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", order);
    assert_eq!(order["status"], "draft");
    assert_eq!(order["total_cost_cents"], 4_000);
    let order_id = order["id"].as_str().unwrap().to_string();
    let item_id = order["items"][0]["id"].as_str().unwrap().to_string();

    // drafts cannot be received
    let (status, _) = app
        .post(
            &format!("/api/purchase-orders/{}/receive", order_id),
            json!({ "items": [{ "item_id": item_id, "quantity_received": 4 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, submitted) = app
        .request(
            Method::PUT,
            &format!("/api/purchase-orders/{}/status", order_id),
            Some(&app.admin_token),
            Some(json!({ "status": "submitted" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "submitted");

    let (status, partial) = app
        .post(
            &format!("/api/purchase-orders/{}/receive", order_id),
            json!({ "items": [{ "item_id": item_id, "quantity_received": 4 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(partial["status"], "partially_received");

    let (status, body) = app
        .post(
            &format!("/api/purchase-orders/{}/receive", order_id),
            json!({ "items": [{ "item_id": item_id, "quantity_received": 7 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "OVER_RECEIPT");

    let (status, done) = app
        .post(
            &format!("/api/purchase-orders/{}/receive", order_id),
            json!({ "items": [{ "item_id": item_id, "quantity_received": 6 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "received");

    let (_, level) = app.get(&format!("/api/inventory/{}", product_id)).await;
    assert_eq!(level["quantity"], 10);
}

#[tokio::test]
async fn test_reports() {
    let app = TestApp::new().await;
    let product_id = app.create_product("MUG", 1_200, 5).await;
    let (status, _) = app
        .post(
            "/api/sales",
            json!({
                "payment_method": "card",
                "items": [{ "product_id": product_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get("/api/reports/sales-summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["sale_count"], 1);
    assert!(body["period"]["from"].is_string());

    let (status, body) = app.get("/api/reports/top-products?limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"][0]["quantity"], 1);

    let (status, _) = app
        .get("/api/reports/tax?from=2026-02-01T00:00:00Z&to=2026-01-01T00:00:00Z")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for path in [
        "/api/reports/tax",
        "/api/reports/inventory-valuation",
        "/api/reports/inventory-adjustments",
        "/api/reports/cash-variance",
        "/api/reports/loyalty-liability",
    ] {
        let (status, body) = app.get(path).await;
        assert_eq!(status, StatusCode::OK, "{}: {}", path, body);
    }
}

#[tokio::test]
async fn test_login_unknown_email_matches_wrong_password() {
    let app = TestApp::new().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@store.test", "password": "whatever-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_refresh_rejects_tokens_but_surfaces_db_failures() {
    let app = TestApp::new().await;
    let session = app.login_session(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();
    let access_token = session["access_token"].as_str().unwrap().to_string();

    let (status, body) = app
        .post("/api/auth/refresh", json!({ "refresh_token": refresh_token }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["access_token"].is_string());

    let (status, _) = app
        .post("/api/auth/refresh", json!({ "refresh_token": access_token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // a database outage is a server error, not a bad token
    app.db.pool().close().await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_ERROR");
}

#[tokio::test]
async fn test_malformed_requests_use_error_envelope() {
    let app = TestApp::new().await;
    let product_id = app.create_product("SALT", 150, 5).await;

    let (status, body) = app
        .post(
            "/api/inventory/adjust",
            json!({ "product_id": product_id, "quantity_change": -1, "reason": "bogus" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("bogus"));

    let (status, body) = app
        .post(
            "/api/inventory/adjust",
            json!({ "product_id": product_id, "reason": "damaged" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.get("/api/products?limit=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app.get("/api/sales?status=pending").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // not JSON at all
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/customers")
        .header("authorization", format!("Bearer {}", app.admin_token))
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_out_of_range_numbers_are_rejected() {
    let app = TestApp::new().await;
    let product_id = app.create_product("OIL", 900, 5).await;
    let (_, customer) = app
        .post("/api/customers", json!({ "first_name": "Sam", "last_name": "Lee" }))
        .await;
    let (_, supplier) = app
        .post("/api/suppliers", json!({ "name": "Big Supplier" }))
        .await;
    let (_, drawer) = app
        .post(
            "/api/cash-drawers/open",
            json!({ "register_name": "Back", "opening_balance_cents": 5_000 }),
        )
        .await;

    let cases = [
        (
            "/api/inventory/adjust".to_string(),
            json!({ "product_id": product_id, "quantity_change": i64::MIN, "reason": "damaged" }),
        ),
        (
            "/api/loyalty/transactions".to_string(),
            json!({ "customer_id": customer["id"], "kind": "adjust", "points": i64::MIN }),
        ),
        (
            "/api/purchase-orders".to_string(),
            json!({
                "supplier_id": supplier["id"],
                "items": [{ "product_id": product_id, "quantity": 3, "unit_cost_cents": i64::MAX / 2 }]
            }),
        ),
        (
            "/api/products".to_string(),
            json!({ "sku": "GOLD", "name": "Gold bar", "price_cents": i64::MAX }),
        ),
        (
            format!("/api/cash-drawers/{}/transactions", drawer["id"].as_str().unwrap()),
            json!({ "kind": "cash_in", "amount_cents": i64::MAX }),
        ),
    ];

    for (uri, body) in cases {
        let (status, response) = app.post(&uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}: {}", uri, response);
        assert_eq!(response["code"], "VALIDATION_ERROR");
    }

    // nothing moved
    let (_, level) = app.get(&format!("/api/inventory/{}", product_id)).await;
    assert_eq!(level["quantity"], 5);
    let (_, drawer) = app
        .get(&format!("/api/cash-drawers/{}", drawer["id"].as_str().unwrap()))
        .await;
    assert_eq!(drawer["expected_balance_cents"], 5_000);
}

#[tokio::test]
async fn test_cashier_role_gates_for_loyalty_and_drawers() {
    let app = TestApp::new().await;
    let cashier = app.cashier_token().await;

    let (status, customer) = app
        .request(
            Method::POST,
            "/api/customers",
            Some(&cashier),
            Some(json!({ "first_name": "Ana", "last_name": "Diaz" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let customer_id = customer["id"].as_str().unwrap().to_string();

    let (status, outcome) = app
        .request(
            Method::POST,
            "/api/loyalty/transactions",
            Some(&cashier),
            Some(json!({ "customer_id": customer_id, "kind": "earn", "points": 40 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", outcome);
    assert_eq!(outcome["account"]["points_balance"], 40);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/loyalty/transactions",
            Some(&cashier),
            Some(json!({ "customer_id": customer_id, "kind": "adjust", "points": 500 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (_, account) = app
        .get(&format!("/api/loyalty/accounts/{}", customer_id))
        .await;
    assert_eq!(account["points_balance"], 40);

    // drawer session run by the cashier
    let (status, drawer) = app
        .request(
            Method::POST,
            "/api/cash-drawers/open",
            Some(&cashier),
            Some(json!({ "register_name": "Till 2", "opening_balance_cents": 2_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let drawer_uri = format!("/api/cash-drawers/{}", drawer["id"].as_str().unwrap());

    let (status, _) = app
        .put(&format!("{}/status", drawer_uri), &cashier, json!({ "status": "counting" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, closed) = app
        .put(
            &format!("{}/status", drawer_uri),
            &cashier,
            json!({ "status": "closed", "counted_balance_cents": 1_950 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", closed);
    assert_eq!(closed["variance_cents"], -50);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("{}/transactions", drawer_uri),
            Some(&cashier),
            Some(json!({ "kind": "cash_in", "amount_cents": 500 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "DRAWER_NOT_OPEN");

    let (status, _) = app
        .put(&format!("{}/status", drawer_uri), &cashier, json!({ "status": "reconciled" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, reconciled) = app
        .put(
            &format!("{}/status", drawer_uri),
            &app.admin_token,
            json!({ "status": "reconciled" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reconciled["status"], "reconciled");
}

#[tokio::test]
async fn test_duplicate_customer_email_leaves_no_loyalty_account() {
    let app = TestApp::new().await;
    let cashier = app.cashier_token().await;
    let customer = json!({ "first_name": "Kim", "last_name": "Park", "email": "kim@example.com" });

    let (status, _) = app
        .request(Method::POST, "/api/customers", Some(&cashier), Some(customer.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(Method::POST, "/api/customers", Some(&cashier), Some(customer))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, customers) = app.get("/api/customers?q=kim").await;
    assert_eq!(customers["items"].as_array().unwrap().len(), 1);

    let (status, liability) = app.get("/api/reports/loyalty-liability").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liability["report"]["account_count"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_on_file_database() {
    let path = std::env::temp_dir().join(format!("storehub-api-{}.db", uuid::Uuid::new_v4()));
    let db = Database::new(DbConfig::new(path.clone()).max_connections(8))
        .await
        .unwrap();
    let app = Arc::new(TestApp::build(db, Arc::new(LogProvider)).await);
    let product_id = app.create_product("BREAD", 300, 100).await;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let app = app.clone();
        let product_id = product_id.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                app.post(
                    "/api/sales",
                    json!({
                        "payment_method": "card",
                        "items": [{ "product_id": product_id, "quantity": 1 }]
                    }),
                )
                .await
            } else {
                app.post(
                    "/api/inventory/adjust",
                    json!({ "product_id": product_id, "quantity_change": -1, "reason": "shrinkage" }),
                )
                .await
            }
        }));
    }

    for task in tasks {
        let (status, body) = task.await.unwrap();
        assert!(status.is_success(), "{}: {}", status, body);
    }

    let (_, level) = app.get(&format!("/api/inventory/{}", product_id)).await;
    assert_eq!(level["quantity"], 80);
    let (_, sales) = app.get("/api/sales").await;
    assert_eq!(sales["items"].as_array().unwrap().len(), 10);

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}
