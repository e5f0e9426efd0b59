use crate::core::error;
use crate::core::state::AppState;
use crate::routes::auth;
use crate::utils;
use axum::error_handling::HandleErrorLayer;
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::Method,
    middleware,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{self, CorsLayer},
    trace::TraceLayer,
};
use tracing::info_span;

const BODY_LIMIT: usize = 16 * 1024;

pub(crate) fn routes(state: AppState) -> Router {
    let exposed = [
        state.token_headers.access.clone(),
        state.token_headers.refresh.clone(),
    ];

    let authorized_routes = Router::new()
        .route("/user", get(auth::current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            utils::auth::authorize,
        ));

    // /auth/...
    let auth_router = Router::new()
        .route("/", get(auth::check))
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/refresh", post(auth::refresh))
        .merge(authorized_routes);

    Router::new()
        .nest("/auth", auth_router)
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .route_layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        let matched_path = request
                            .extensions()
                            .get::<MatchedPath>()
                            .map(MatchedPath::as_str);

                        info_span!(
                            "request",
                            method = ?request.method(),
                            matched_path,
                        )
                    }),
                )
                .layer(HandleErrorLayer::new(error::handle_middleware_errors))
                .buffer(128)
                .rate_limit(10, Duration::from_secs(1))
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST])
                        .allow_origin(cors::Any)
                        .expose_headers(exposed),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::user::UserController;
    use crate::identity::mock::test_codec;
    use crate::identity::provider::TokenLifetimes;
    use crate::utils::auth::TokenHeaders;
    use axum::body::{Body, Bytes};
    use axum::http::{self, HeaderMap, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        routes(AppState::from_parts(
            UserController::new(4).unwrap(),
            test_codec(),
            TokenLifetimes::default(),
            TokenHeaders::default(),
        ))
    }

    async fn send(app: &Router, request: Request) -> (StatusCode, HeaderMap, Bytes) {
        let response = app.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

        (parts.status, parts.headers, body)
    }

    fn post_json(uri: &str, body: Value) -> Request {
        http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn with_header(method: Method, uri: &str, name: &str, value: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    fn alice() -> Value {
        json!({ "username": "alice", "password": "password123" })
    }

    async fn signed_up(app: &Router) -> Value {
        let (status, _, body) = send(app, post_json("/auth/signup", alice())).await;
        assert_eq!(status, StatusCode::OK);

        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn signup_returns_user_and_tokens() {
        let app = app();
        let body = signed_up(&app).await;

        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["alreadyExists"], false);
        assert!(!body["tokens"]["accessToken"].as_str().unwrap().is_empty());
        assert!(!body["tokens"]["refreshToken"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let app = app();
        signed_up(&app).await;

        let (status, _, body) = send(&app, post_json("/auth/signup", alice())).await;
        let body: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["alreadyExists"], true);
        assert_eq!(body["tokens"]["accessToken"], "");
    }

    #[tokio::test]
    async fn signup_rejects_short_password() {
        let app = app();

        let (status, _, body) = send(
            &app,
            post_json(
                "/auth/signup",
                json!({ "username": "alice", "password": "short" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Password min length is 8 and max length is 64");
    }

    #[tokio::test]
    async fn signup_reports_incorrect_fields() {
        let app = app();

        let (status, _, body) = send(
            &app,
            post_json(
                "/auth/signup",
                json!({ "username": "al ice", "password": "password123" }),
            ),
        )
        .await;
        let body: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["invalidCredentials"], true);
        assert_eq!(body["credentialsCheck"]["username"]["isCorrect"], false);
    }

    #[tokio::test]
    async fn signin_with_wrong_password_is_unauthorized() {
        let app = app();
        signed_up(&app).await;

        let (status, _, body) = send(
            &app,
            post_json(
                "/auth/signin",
                json!({ "username": "alice", "password": "password124" }),
            ),
        )
        .await;
        let body: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["notAuthorized"], true);
        assert_eq!(body["invalidCredentials"], true);
    }

    #[tokio::test]
    async fn signin_issues_tokens() {
        let app = app();
        let signup = signed_up(&app).await;

        let (status, _, body) = send(&app, post_json("/auth/signin", alice())).await;
        let body: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], signup["user"]["id"]);
        assert!(!body["tokens"]["accessToken"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn refresh_places_tokens_in_headers() {
        let app = app();
        let signup = signed_up(&app).await;
        let refresh = signup["tokens"]["refreshToken"].as_str().unwrap();

        let (status, headers, body) = send(
            &app,
            with_header(Method::POST, "/auth/refresh", "x-refresh-token", refresh),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            "Success: 2 tokens, Access Token and Refresh Token, have been placed to headers"
        );
        assert!(headers.contains_key("x-access-token"));
        assert!(headers.contains_key("x-refresh-token"));
        assert_eq!(headers.get_all(header::SET_COOKIE).iter().count(), 2);
    }

    #[tokio::test]
    async fn refresh_without_token_is_bad_request() {
        let app = app();

        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/auth/refresh")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn refresh_with_garbage_is_unauthorized() {
        let app = app();

        let (status, _, _) = send(
            &app,
            with_header(Method::POST, "/auth/refresh", "x-refresh-token", "not-a-jwt"),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn undecodable_token_is_unauthorized() {
        let app = app();

        let (status, _, _) =
            send(&app, with_header(Method::GET, "/auth", "x-access-token", "abc.def.ghi")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(
            &app,
            with_header(Method::POST, "/auth/refresh", "x-refresh-token", "abc.def.ghi"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signin_rejects_out_of_bounds_credentials() {
        let app = app();

        let (status, _, body) = send(
            &app,
            post_json("/auth/signin", json!({ "username": "a", "password": "x" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            "Invalid signin credentials: Username min length is 3 and max length is 64"
        );
    }

    #[tokio::test]
    async fn check_reports_remaining_lifetime() {
        let app = app();
        let signup = signed_up(&app).await;
        let access = signup["tokens"]["accessToken"].as_str().unwrap();

        let (status, _, body) =
            send(&app, with_header(Method::GET, "/auth", "x-access-token", access)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(
            String::from_utf8_lossy(&body).starts_with("CheckAuth: token is valid for duration: ")
        );

        let request = http::Request::builder().uri("/auth").body(Body::empty()).unwrap();
        let (status, _, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Unauthorized: no access token");
    }

    #[tokio::test]
    async fn current_user_requires_access_token() {
        let app = app();
        let signup = signed_up(&app).await;
        let access = signup["tokens"]["accessToken"].as_str().unwrap();

        let (status, _, body) = send(
            &app,
            with_header(Method::GET, "/auth/user", "x-access-token", access),
        )
        .await;
        let body: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        let request = http::Request::builder()
            .uri("/auth/user")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = app();
        let padding = "a".repeat(BODY_LIMIT);

        let (status, _, _) = send(
            &app,
            post_json(
                "/auth/signup",
                json!({ "username": padding, "password": "password123" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
