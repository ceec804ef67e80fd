use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use roster_api::users::{MemoryUserStore, UserStore};
use roster_api::{build_app, AppConfig};
use roster_kit::Environment;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const PASSWORD: &str = "Secret#123";

struct TestApp {
    router: Router,
    store: Arc<dyn UserStore>,
}

impl TestApp {
    fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.secret = "integration-secret".into();
        config.password_cost = 4;
        config.server.environment = Environment::Test;

        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        let router = build_app(&config, store.clone()).unwrap();
        Self { router, store }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn register(&self, email: &str) -> (String, String) {
        let (status, json) = self
            .send(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": PASSWORD,
                    "phone": "0912345678",
                    "osType": "web"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        let token = json["data"]["accessToken"].as_str().unwrap().to_string();
        let id = self.store.find_by_email(email).await.unwrap().unwrap().id;
        (id, token)
    }

    async fn admin(&self, email: &str, role: &str) -> (String, String) {
        let (id, _) = self.register(email).await;
        let user = self.store.get(&id).await.unwrap().unwrap();
        self.store.update(user.with_role(role)).await.unwrap();

        let (status, json) = self
            .send(
                Method::POST,
                "/api/v1/auth/admin/login",
                None,
                Some(json!({"email": email, "password": PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        (id, json["data"]["accessToken"].as_str().unwrap().to_string())
    }
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, json) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn protected_route_requires_token() {
    let app = TestApp::new();
    let (status, json) = app.send(Method::GET, "/api/v1/user/someone", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["name"], "UnauthorizedError");
    assert_eq!(json["code"], "credentials_required");
}

#[tokio::test]
async fn registered_driver_reads_own_profile() {
    let app = TestApp::new();
    let (id, token) = app.register("driver@fleet.io").await;

    let (status, json) = app
        .send(Method::GET, &format!("/api/v1/user/{}", id), Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], 200);
    assert_eq!(json["message"], "Ok");
    assert_eq!(json["data"]["email"], "driver@fleet.io");
    assert_eq!(json["data"]["role"], "driver");
    assert!(json["data"].get("passwordHash").is_none());

    let (other, _) = app.register("other@fleet.io").await;
    let (status, json) = app
        .send(Method::GET, &format!("/api/v1/user/{}", other), Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "permission_denied");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = TestApp::new();
    app.register("dup@fleet.io").await;

    let (status, json) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "dup@fleet.io",
                "password": PASSWORD,
                "phone": "0912345678",
                "osType": "web"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Account: dup@fleet.io is already taken.");
}

#[tokio::test]
async fn drivers_are_kept_out_of_admin_routes() {
    let app = TestApp::new();
    let (_, token) = app.register("driver@fleet.io").await;

    let (status, json) = app.send(Method::GET, "/api/v1/user/admin", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["name"], "ForbiddenError");

    let (status, _) = app.send(Method::GET, "/api/v1/user", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn driver_cannot_use_admin_login() {
    let app = TestApp::new();
    app.register("driver@fleet.io").await;

    let (status, json) = app
        .send(
            Method::POST,
            "/api/v1/auth/admin/login",
            None,
            Some(json!({"email": "driver@fleet.io", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "You are not admin!!");
}

#[tokio::test]
async fn super_admin_lists_and_pages_users() {
    let app = TestApp::new();
    for n in 0..3 {
        app.register(&format!("driver{}@fleet.io", n)).await;
    }
    let (_, token) = app.admin("root@fleet.io", "super admin").await;

    let (status, json) = app
        .send(Method::GET, "/api/v1/user?page=2&page_size=2&role=driver", Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["total_item"], 3);
    assert_eq!(json["data"]["total_page"], 2);
    assert_eq!(json["data"]["data"].as_array().unwrap().len(), 1);

    let (status, json) = app.send(Method::GET, "/api/v1/user/admin", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn locking_revokes_existing_tokens() {
    let app = TestApp::new();
    let (driver_id, driver_token) = app.register("driver@fleet.io").await;
    let (_, admin_token) = app.admin("boss@fleet.io", "admin").await;

    let lock_uri = |flag: &str| format!("/api/v1/user/admin/lock/{}{}", driver_id, flag);

    let (status, json) = app
        .send(Method::PUT, &lock_uri(""), Some(admin_token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "User lock status must be true/false");

    let (status, _) = app
        .send(Method::PUT, &lock_uri("?lock=maybe"), Some(admin_token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .send(Method::PUT, &lock_uri("?lock=true"), Some(admin_token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["isLock"], true);

    let (status, json) = app
        .send(Method::GET, &format!("/api/v1/user/{}", driver_id), Some(driver_token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "revoked_token");

    let (status, json) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "driver@fleet.io", "password": PASSWORD, "osType": "web"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().starts_with("Account locked"));

    let (status, json) = app
        .send(Method::PUT, &lock_uri("?lock=false"), Some(admin_token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["isLock"], false);

    let (status, _) = app
        .send(Method::GET, &format!("/api/v1/user/{}", driver_id), Some(driver_token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_changes_roles() {
    let app = TestApp::new();
    let (driver_id, _) = app.register("driver@fleet.io").await;
    let (_, token) = app.admin("boss@fleet.io", "admin").await;

    let uri = format!("/api/v1/user/admin/{}?role=pilot", driver_id);
    let (status, json) = app.send(Method::PUT, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Role is invalid!");

    let uri = format!("/api/v1/user/admin/{}?role=admin", driver_id);
    let (status, json) = app.send(Method::PUT, &uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["role"], "admin");

    let (status, json) = app
        .send(Method::PUT, "/api/v1/user/admin/nobody?role=admin", Some(token.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "User not found!");
}

#[tokio::test]
async fn profile_update_and_password_change() {
    let app = TestApp::new();
    let (id, token) = app.register("driver@fleet.io").await;

    let (status, json) = app
        .send(
            Method::PUT,
            &format!("/api/v1/user/{}", id),
            Some(token.as_str()),
            Some(json!({
                "firstName": "Linh",
                "lastName": "Tran",
                "phone": "0912345678",
                "address": "1 Main St",
                "city": "Hanoi",
                "state": "HN",
                "zipCode": "10000"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["active"]["profile"], true);

    let (status, json) = app
        .send(
            Method::PUT,
            "/api/v1/user/password/change",
            Some(token.as_str()),
            Some(json!({
                "oldPassword": PASSWORD,
                "newPassword": "Next#4567",
                "retryPassword": "Next#4567"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Change password success!");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "driver@fleet.io", "password": "Next#4567", "osType": "web"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
