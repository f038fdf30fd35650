//! Integration tests for login, registration, logout, and the Google code
//! exchange endpoint.

use authgate::{ApiClient, Error};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::builder()
        .base_url(format!("{}/api", server.uri()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_login_stores_token_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"username": "alice", "password": "hunter2"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "a1", "refresh": "r1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let pair = client.login("alice", "hunter2").await.unwrap();
    assert_eq!(pair.access, "a1");

    assert_eq!(client.session().access_token().unwrap().as_deref(), Some("a1"));
    assert_eq!(client.session().refresh_token().unwrap().as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_login_failure_reports_field_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            json!({"non_field_errors": ["Unable to log in with provided credentials."]}),
        ))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.login("alice", "wrong").await.unwrap_err();
    match err {
        Error::Api { status, errors } => {
            assert_eq!(status, 400);
            assert_eq!(
                errors.summary(),
                "Unable to log in with provided credentials."
            );
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    // Nothing stored on failure.
    assert_eq!(client.session().access_token().unwrap(), None);
}

#[tokio::test]
async fn test_register_stores_token_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/registration/"))
        .and(body_json(json!({
            "username": "bob",
            "email": "bob@example.com",
            "password1": "s3cretpass",
            "password2": "s3cretpass"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"access": "a2", "refresh": "r2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .register("bob", "bob@example.com", "s3cretpass", "s3cretpass")
        .await
        .unwrap();

    assert_eq!(client.session().access_token().unwrap().as_deref(), Some("a2"));
}

#[tokio::test]
async fn test_register_validation_errors_are_per_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/registration/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "username": ["A user with that username already exists."],
            "password1": ["This password is too common."]
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client
        .register("bob", "bob@example.com", "password", "password")
        .await
        .unwrap_err();
    match err {
        Error::Api { errors, .. } => {
            assert_eq!(
                errors.field("username"),
                Some(&["A user with that username already exists.".to_string()][..])
            );
            assert!(errors.field("password1").is_some());
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_logout_clears_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client.session().set_tokens("a", "r").unwrap();

    client.logout().await.unwrap();
    assert_eq!(client.session().access_token().unwrap(), None);
    assert_eq!(client.session().refresh_token().unwrap(), None);
}

#[tokio::test]
async fn test_logout_clears_tokens_even_when_request_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let client = client(&server);
    client.session().set_tokens("a", "r").unwrap();

    let err = client.logout().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(client.session().access_token().unwrap(), None);
    assert_eq!(client.session().refresh_token().unwrap(), None);
}

#[tokio::test]
async fn test_google_callback_exchanges_code_for_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/google/callback/"))
        .and(body_json(json!({
            "code": "auth-code",
            "redirect_uri": "http://localhost:5173/auth/google/callback"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "ga", "refresh": "gr"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let pair = client
        .google_callback("auth-code", "http://localhost:5173/auth/google/callback")
        .await
        .unwrap();
    assert_eq!(pair.access, "ga");
    assert_eq!(client.session().refresh_token().unwrap().as_deref(), Some("gr"));

    // The exchange goes out unauthenticated.
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_google_callback_without_tokens_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/google/callback/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "ok"})))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.google_callback("code", "uri").await.unwrap_err();
    assert!(matches!(err, Error::MissingTokens));
    assert_eq!(client.session().access_token().unwrap(), None);
}

#[tokio::test]
async fn test_google_callback_error_status_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/google/callback/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.google_callback("expired", "uri").await.unwrap_err();
    match err {
        Error::Api { status, errors } => {
            assert_eq!(status, 400);
            assert_eq!(errors.summary(), "invalid_grant");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
