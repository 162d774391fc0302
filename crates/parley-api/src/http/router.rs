//! Axum router configuration with middleware.
//!
//! Account routes live under `/api/auth`, chat routes under `/api/chats`.
//! Middleware: CORS, tracing.

use axum::Json;
use axum::Router;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/users/me", get(handlers::auth::me));

    let chat_routes = Router::new()
        .route("/", get(handlers::chat::list_chats))
        .route("/messages", post(handlers::chat::create_chat))
        .route(
            "/{id}",
            patch(handlers::chat::rename_chat).delete(handlers::chat::delete_chat),
        )
        .route(
            "/{id}/messages",
            get(handlers::chat::chat_messages).post(handlers::chat::append_message),
        );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/chats", chat_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE, WWW_AUTHENTICATE};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use parley_core::llm::box_provider::BoxCompletionProvider;
    use parley_core::llm::provider::CompletionProvider;
    use parley_infra::sqlite::pool::DatabasePool;
    use parley_types::config::AppConfig;
    use parley_types::llm::{ChatTurn, CompletionError};

    /// Replies with a fixed text, or fails as unavailable when `reply` is `None`.
    struct CannedProvider {
        reply: Option<&'static str>,
    }

    impl CompletionProvider for CannedProvider {
        async fn complete(&self, _history: &[ChatTurn]) -> Result<String, CompletionError> {
            self.reply
                .map(str::to_string)
                .ok_or_else(|| CompletionError::Unavailable("connection refused".to_string()))
        }
    }

    async fn app(reply: Option<&'static str>) -> Router {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        let pool = DatabasePool::new(&url).await.unwrap();

        let mut config = AppConfig::default();
        config.auth.secret = Some(SecretString::from("http-test-secret".to_string()));

        let state = AppState::build(
            pool,
            &config,
            BoxCompletionProvider::new(CannedProvider { reply }),
        )
        .unwrap();
        build_router(state)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &Router, email: &str) -> StatusCode {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                serde_json::json!({ "email": email, "password": "pw12345678" }),
            ))
            .await
            .unwrap()
            .status()
    }

    /// Log in and return (access token, Set-Cookie header).
    async fn login(app: &Router, email: &str) -> (String, String) {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                serde_json::json!({ "email": email, "password": "pw12345678" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        let json = body_json(response).await;
        assert_eq!(json["data"]["token_type"], "bearer");
        (json["data"]["access_token"].as_str().unwrap().to_string(), cookie)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Some("hi")).await;
        let response = app.oneshot(empty_request("GET", "/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_login_me() {
        let app = app(Some("hi")).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                serde_json::json!({
                    "email": "Alice@Example.com",
                    "password": "pw12345678",
                    "fullname": "Alice",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["data"]["email"], "alice@example.com");
        assert!(json["data"].get("hashed_password").is_none());

        let (access, cookie) = login(&app, "alice@example.com").await;
        assert!(cookie.starts_with("refresh_token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("Path=/api/auth"));

        let response = app
            .oneshot(empty_request("GET", "/api/auth/users/me", Some(&access)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["fullname"], "Alice");
    }

    #[tokio::test]
    async fn test_register_conflict_and_weak_password() {
        let app = app(Some("hi")).await;
        assert_eq!(register(&app, "bob@example.com").await, StatusCode::CREATED);
        assert_eq!(register(&app, "bob@example.com").await, StatusCode::CONFLICT);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                serde_json::json!({ "email": "carol@example.com", "password": "short" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = app(Some("hi")).await;
        register(&app, "dave@example.com").await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                serde_json::json!({ "email": "dave@example.com", "password": "not-the-password" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_refresh_uses_cookie_only() {
        let app = app(Some("hi")).await;
        register(&app, "erin@example.com").await;
        let (access, cookie) = login(&app, "erin@example.com").await;
        let refresh_pair = cookie.split(';').next().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(COOKIE, &refresh_pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["data"]["access_token"].is_string());

        // An access credential in the cookie is the wrong kind.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/refresh")
                    .header(COOKIE, format!("refresh_token={access}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(empty_request("POST", "/api/auth/refresh", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_bearer() {
        let app = app(Some("hi")).await;
        register(&app, "frank@example.com").await;
        let (_, cookie) = login(&app, "frank@example.com").await;
        let refresh = cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("refresh_token="))
            .unwrap()
            .to_string();

        let response = app
            .oneshot(empty_request("GET", "/api/auth/users/me", Some(&refresh)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_chat_requires_credential() {
        let app = app(Some("hi")).await;
        let response = app.oneshot(empty_request("GET", "/api/chats", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_chat_lifecycle() {
        let app = app(Some("Hello! I can help. Ask me anything.")).await;
        register(&app, "gina@example.com").await;
        let (access, _) = login(&app, "gina@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chats/messages",
                Some(&access),
                serde_json::json!({ "content": "hello" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        let chat_id = json["data"]["chat"]["id"].as_i64().unwrap();
        assert_eq!(json["data"]["chat"]["title"], "Hello! I can help.");
        assert_eq!(json["data"]["assistant_message"]["role"], "assistant");
        assert!(json["data"]["assistant_message"]["sender_id"].is_null());

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/chats/{chat_id}/messages"),
                Some(&access),
                serde_json::json!({ "content": "and again" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(empty_request("GET", &format!("/api/chats/{chat_id}/messages"), Some(&access)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let messages = body_json(response).await;
        assert_eq!(messages["data"].as_array().unwrap().len(), 4);
        assert_eq!(messages["data"][2]["content"], "and again");

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/chats/{chat_id}"),
                Some(&access),
                serde_json::json!({ "title": "Renamed" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["title"], "Renamed");

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/chats", Some(&access)))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/api/chats/{chat_id}"), Some(&access)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(empty_request("GET", &format!("/api/chats/{chat_id}/messages"), Some(&access)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_foreign_chat_is_not_found() {
        let app = app(Some("hi")).await;
        register(&app, "hank@example.com").await;
        register(&app, "ivy@example.com").await;
        let (hank, _) = login(&app, "hank@example.com").await;
        let (ivy, _) = login(&app, "ivy@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chats/messages",
                Some(&hank),
                serde_json::json!({ "content": "private" }),
            ))
            .await
            .unwrap();
        let chat_id = body_json(response).await["data"]["chat"]["id"].as_i64().unwrap();

        let response = app
            .oneshot(json_request(
                "POST",
                &format!("/api/chats/{chat_id}/messages"),
                Some(&ivy),
                serde_json::json!({ "content": "let me in" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["errors"][0]["code"], "CHAT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway_and_writes_nothing() {
        let app = app(None).await;
        register(&app, "jack@example.com").await;
        let (access, _) = login(&app, "jack@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/chats/messages",
                Some(&access),
                serde_json::json!({ "content": "hello?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = app
            .oneshot(empty_request("GET", "/api/chats", Some(&access)))
            .await
            .unwrap();
        assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
    }
}
