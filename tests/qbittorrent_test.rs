//! qBittorrent Session Client Tests
//!
//! Login, cookie caching, re-authentication on 403, and retry bounds,
//! against a mockito stand-in for the daemon.

use std::sync::Arc;

use futures::future::join_all;
use mockito::{Matcher, Server, ServerGuard};
use reqwest::Method;
use torrename::api::{QbClient, QbError};
use torrename::error::AppError;

const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

fn client(server: &ServerGuard) -> QbClient {
    QbClient::with_base_url(server.url(), "admin", "adminadmin")
}

async fn mock_login(server: &mut ServerGuard, cookie: &str, hits: usize) -> mockito::Mock {
    server
        .mock("POST", "/api/v2/auth/login")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("username".into(), "admin".into()),
            Matcher::UrlEncoded("password".into(), "adminadmin".into()),
        ]))
        .with_status(200)
        .with_header("set-cookie", &format!("{}; HttpOnly; path=/", cookie))
        .with_body("Ok.")
        .expect(hits)
        .create_async()
        .await
}

// =============================================================================
// Authentication
// =============================================================================

/// Test: Successful login caches the cookie
#[tokio::test]
async fn test_authenticate_success() {
    let mut server = Server::new_async().await;
    let login = mock_login(&mut server, "SID=abc", 1).await;

    let client = client(&server);
    assert!(client.authenticate().await);
    assert!(client.is_authenticated().await);

    login.assert_async().await;
}

/// Test: Bad credentials (200 "Fails." without cookie) return false
#[tokio::test]
async fn test_authenticate_without_cookie_fails() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/api/v2/auth/login")
        .with_status(200)
        .with_body("Fails.")
        .create_async()
        .await;

    let client = client(&server);
    assert!(!client.authenticate().await);
    assert!(!client.is_authenticated().await);

    login.assert_async().await;
}

/// Test: Network failure returns false instead of erroring
#[tokio::test]
async fn test_authenticate_unreachable() {
    let client = QbClient::with_base_url("http://127.0.0.1:1", "admin", "x");
    assert!(!client.authenticate().await);
}

/// Test: Login attempts stop at the configured bound
#[tokio::test]
async fn test_authenticate_attempts_bounded() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/api/v2/auth/login")
        .with_status(401)
        .expect(3)
        .create_async()
        .await;

    let client = client(&server).with_retry_limits(3, 2);
    for _ in 0..5 {
        assert!(!client.authenticate().await);
    }

    // Only three attempts ever reached the daemon
    login.assert_async().await;
}

/// Test: request() without a session fails with Authentication when login fails
#[tokio::test]
async fn test_request_fails_when_login_fails() {
    let mut server = Server::new_async().await;
    let _login = server
        .mock("POST", "/api/v2/auth/login")
        .with_status(403)
        .create_async()
        .await;
    let data = server
        .mock("GET", "/api/v2/torrents/info")
        .expect(0)
        .create_async()
        .await;

    let client = client(&server);
    let err = client
        .request("/torrents/info", Method::GET, None)
        .await
        .unwrap_err();

    assert!(matches!(err, QbError::Authentication));
    data.assert_async().await;
}

// =============================================================================
// Requests
// =============================================================================

/// Test: Requests carry the session cookie, login happens once
#[tokio::test]
async fn test_request_reuses_cookie() {
    let mut server = Server::new_async().await;
    let login = mock_login(&mut server, "SID=abc", 1).await;
    let data = server
        .mock("GET", "/api/v2/torrents/info")
        .match_header("cookie", "SID=abc")
        .with_status(200)
        .with_body("[]")
        .expect(2)
        .create_async()
        .await;

    let client = client(&server);
    assert!(client.torrents().await.unwrap().is_empty());
    assert!(client.torrents().await.unwrap().is_empty());

    login.assert_async().await;
    data.assert_async().await;
}

/// Test: One 403 triggers exactly one re-authentication and the retry succeeds
#[tokio::test]
async fn test_request_reauthenticates_once_on_403() {
    let mut server = Server::new_async().await;
    let login = mock_login(&mut server, "SID=abc", 2).await;
    let expired = server
        .mock("GET", "/api/v2/app/version")
        .with_status(403)
        .expect(1)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/api/v2/app/version")
        .with_status(200)
        .with_body("v4.6.2")
        .expect(1)
        .create_async()
        .await;

    let client = client(&server);
    assert!(client.authenticate().await);

    let version = client.app_version().await.unwrap();
    assert_eq!(version, "v4.6.2");

    // Initial login + one re-authentication
    login.assert_async().await;
    expired.assert_async().await;
    ok.assert_async().await;
}

/// Test: A daemon that always answers 403 is tried max_retries + 1 times
#[tokio::test]
async fn test_request_gives_up_after_max_retries() {
    let mut server = Server::new_async().await;
    let login = mock_login(&mut server, "SID=abc", 3).await;
    let forbidden = server
        .mock("GET", "/api/v2/torrents/info")
        .with_status(403)
        .expect(3)
        .create_async()
        .await;

    let client = client(&server);
    let err = client.torrents().await.unwrap_err();

    assert!(matches!(err, QbError::Forbidden(3)), "got {:?}", err);
    forbidden.assert_async().await;
    login.assert_async().await;

    // Still refused after every re-login: an authentication failure
    assert!(matches!(AppError::from(err), AppError::Authentication));
}

/// Test: Non-403 failures propagate without re-authentication
#[tokio::test]
async fn test_request_other_status_propagates() {
    let mut server = Server::new_async().await;
    let login = mock_login(&mut server, "SID=abc", 1).await;
    let _props = server
        .mock("GET", "/api/v2/torrents/properties")
        .match_query(Matcher::UrlEncoded("hash".into(), HASH.into()))
        .with_status(404)
        .create_async()
        .await;

    let client = client(&server);
    let err = client.properties(HASH).await.unwrap_err();

    assert!(matches!(err, QbError::Status(404)));
    login.assert_async().await;
}

/// Test: Malformed JSON is an InvalidResponse error
#[tokio::test]
async fn test_invalid_json() {
    let mut server = Server::new_async().await;
    let _login = mock_login(&mut server, "SID=abc", 1).await;
    let _files = server
        .mock("GET", "/api/v2/torrents/files")
        .match_query(Matcher::UrlEncoded("hash".into(), HASH.into()))
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let client = client(&server);
    let err = client.files(HASH).await.unwrap_err();
    assert!(matches!(err, QbError::InvalidResponse(_)));
}

/// Test: Concurrent requests on a fresh client share a single login
#[tokio::test]
async fn test_concurrent_requests_single_login() {
    let mut server = Server::new_async().await;
    let login = mock_login(&mut server, "SID=abc", 1).await;
    let _data = server
        .mock("GET", "/api/v2/torrents/info")
        .match_header("cookie", "SID=abc")
        .with_status(200)
        .with_body("[]")
        .expect(5)
        .create_async()
        .await;

    let client = Arc::new(client(&server));
    let calls = (0..5).map(|_| {
        let client = Arc::clone(&client);
        async move { client.torrents().await }
    });

    for result in join_all(calls).await {
        assert!(result.is_ok());
    }
    login.assert_async().await;
}

// =============================================================================
// Typed Endpoints
// =============================================================================

/// Test: renameFile posts hash, oldPath, newPath as form fields
#[tokio::test]
async fn test_rename_file_form() {
    let mut server = Server::new_async().await;
    let _login = mock_login(&mut server, "SID=abc", 1).await;
    let rename = server
        .mock("POST", "/api/v2/torrents/renameFile")
        .match_header("cookie", "SID=abc")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("hash".into(), HASH.into()),
            Matcher::UrlEncoded("oldPath".into(), "Show/a b.mkv".into()),
            Matcher::UrlEncoded("newPath".into(), "Show/Season 01/A & B.mkv".into()),
        ]))
        .with_status(200)
        .create_async()
        .await;

    let client = client(&server);
    client
        .rename_file(HASH, "Show/a b.mkv", "Show/Season 01/A & B.mkv")
        .await
        .unwrap();

    rename.assert_async().await;
}

/// Test: torrents/info parses records and keeps extra fields
#[tokio::test]
async fn test_torrents_parse() {
    let mut server = Server::new_async().await;
    let _login = mock_login(&mut server, "SID=abc", 1).await;
    let _info = server
        .mock("GET", "/api/v2/torrents/info")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"[{{"hash":"{}","name":"Show.S01","state":"stalledUP","size":1024,
                "category":"tv","tags":"","progress":1,"num_seeds":3}}]"#,
            HASH
        ))
        .create_async()
        .await;

    let client = client(&server);
    let torrents = client.torrents().await.unwrap();

    assert_eq!(torrents.len(), 1);
    assert_eq!(torrents[0].hash, HASH);
    assert_eq!(torrents[0].state, "stalledUP");
    assert_eq!(torrents[0].progress, 1.0);
    assert_eq!(torrents[0].extra["num_seeds"], 3);
}
