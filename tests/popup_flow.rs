//! End-to-end tests for the Google sign-in coordinator: fake popup, message
//! handshake, and the backend code exchange against a mock server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use authgate::oauth::{AuthMessage, GoogleAuthConfig, GoogleSignIn, PopupHandle, PopupOpener};
use authgate::{ApiClient, Error};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORIGIN: &str = "http://localhost:5173";
const REDIRECT_URI: &str = "http://localhost:5173/auth/google/callback";

struct FakePopup {
    closed: Arc<AtomicBool>,
}

impl PopupHandle for FakePopup {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct FakeOpener {
    closed: Arc<AtomicBool>,
}

impl PopupOpener for FakeOpener {
    fn open(&self, url: &str) -> authgate::Result<Box<dyn PopupHandle>> {
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        Ok(Box::new(FakePopup {
            closed: self.closed.clone(),
        }))
    }
}

fn signin(server: &MockServer) -> GoogleSignIn {
    let client = ApiClient::builder()
        .base_url(format!("{}/api", server.uri()))
        .build()
        .unwrap();
    GoogleSignIn::new(
        client,
        GoogleAuthConfig::new("test-client", REDIRECT_URI),
        ORIGIN,
    )
    .poll_interval(Duration::from_millis(10))
    .timeout(Duration::from_secs(30))
}

#[tokio::test]
async fn test_sign_in_exchanges_code_and_stores_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/google/callback/"))
        .and(body_json(json!({"code": "auth-code", "redirect_uri": REDIRECT_URI})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "ga", "refresh": "gr"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let opener = FakeOpener::default();
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(AuthMessage::success(ORIGIN, "auth-code")).unwrap();

    let pair = signin(&server).sign_in(&opener, rx).await.unwrap();
    assert_eq!(pair.access, "ga");
    assert_eq!(pair.refresh, "gr");
}

#[tokio::test]
async fn test_sign_in_exchange_failure_is_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/google/callback/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let opener = FakeOpener::default();
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(AuthMessage::success(ORIGIN, "bad-code")).unwrap();

    // A consent success followed by a failed exchange is still a failed
    // sign-in.
    let err = signin(&server).sign_in(&opener, rx).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_provider_error_skips_the_exchange() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/google/callback/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let opener = FakeOpener::default();
    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(AuthMessage::error(ORIGIN, "access_denied")).unwrap();

    let err = signin(&server).sign_in(&opener, rx).await.unwrap_err();
    assert!(matches!(err, Error::Provider(_)));
}

#[tokio::test]
async fn test_closed_popup_cancels_sign_in() {
    let server = MockServer::start().await;

    let opener = FakeOpener::default();
    let closed = opener.closed.clone();
    let (_tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        closed.store(true, Ordering::SeqCst);
    });

    let err = signin(&server).sign_in(&opener, rx).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}
