//! Torrent Enrichment Tests
//!
//! Base list + concurrent per-torrent properties/files, with per-item
//! failures tolerated.

use mockito::{Matcher, Server, ServerGuard};
use torrename::error::AppError;
use torrename::torrents::list_enriched_torrents;
use torrename::QbClient;

const HASHES: [&str; 3] = [
    "1111111111111111111111111111111111111111",
    "2222222222222222222222222222222222222222",
    "3333333333333333333333333333333333333333",
];

async fn login(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/api/v2/auth/login")
        .with_status(200)
        .with_header("set-cookie", "SID=abc; HttpOnly; path=/")
        .expect_at_least(1)
        .create_async()
        .await
}

async fn torrent_list(server: &mut ServerGuard) -> mockito::Mock {
    let body: Vec<String> = HASHES
        .iter()
        .enumerate()
        .map(|(i, h)| {
            format!(
                r#"{{"hash":"{}","name":"Torrent {}","state":"uploading","size":{},"category":"tv","tags":"","progress":1}}"#,
                h,
                i + 1,
                (i + 1) * 100
            )
        })
        .collect();

    server
        .mock("GET", "/api/v2/torrents/info")
        .with_status(200)
        .with_body(format!("[{}]", body.join(",")))
        .create_async()
        .await
}

async fn properties(server: &mut ServerGuard, hash: &str, status: usize) -> mockito::Mock {
    server
        .mock("GET", "/api/v2/torrents/properties")
        .match_query(Matcher::UrlEncoded("hash".into(), hash.into()))
        .with_status(status)
        .with_body(format!(r#"{{"save_path":"/downloads/{}","comment":""}}"#, &hash[..4]))
        .create_async()
        .await
}

async fn files(server: &mut ServerGuard, hash: &str, status: usize) -> mockito::Mock {
    server
        .mock("GET", "/api/v2/torrents/files")
        .match_query(Matcher::UrlEncoded("hash".into(), hash.into()))
        .with_status(status)
        .with_body(r#"[{"index":0,"name":"episode.mkv","size":100,"progress":0.5}]"#)
        .create_async()
        .await
}

/// Test: Every torrent gets properties and files, in list order
#[tokio::test]
async fn test_all_enriched_in_order() {
    let mut server = Server::new_async().await;
    let _login = login(&mut server).await;
    let _list = torrent_list(&mut server).await;
    let mut mocks = Vec::new();
    for hash in HASHES {
        mocks.push(properties(&mut server, hash, 200).await);
        mocks.push(files(&mut server, hash, 200).await);
    }

    let client = QbClient::with_base_url(server.url(), "admin", "adminadmin");
    let torrents = list_enriched_torrents(&client).await.unwrap();

    let order: Vec<&str> = torrents.iter().map(|t| t.torrent.hash.as_str()).collect();
    assert_eq!(order, HASHES.to_vec());
    assert!(torrents.iter().all(|t| t.is_fully_enriched()));

    let first = &torrents[0];
    assert_eq!(
        first.properties.as_ref().unwrap().save_path.as_deref(),
        Some("/downloads/1111")
    );
    let files = first.files.as_ref().unwrap();
    assert_eq!(files[0].name, "episode.mkv");
    assert_eq!(files[0].progress, 0.5);
}

/// Test: Torrent #2's properties fail; it is still returned, missing only properties
#[tokio::test]
async fn test_partial_enrichment_failure() {
    let mut server = Server::new_async().await;
    let _login = login(&mut server).await;
    let _list = torrent_list(&mut server).await;
    let mut mocks = vec![
        properties(&mut server, HASHES[0], 200).await,
        properties(&mut server, HASHES[1], 500).await,
        properties(&mut server, HASHES[2], 200).await,
    ];
    for hash in HASHES {
        mocks.push(files(&mut server, hash, 200).await);
    }

    let client = QbClient::with_base_url(server.url(), "admin", "adminadmin");
    let torrents = list_enriched_torrents(&client).await.unwrap();

    assert_eq!(torrents.len(), 3);
    assert!(torrents[0].is_fully_enriched());
    assert!(torrents[1].properties.is_none());
    assert!(torrents[1].files.is_some());
    assert_eq!(torrents[1].torrent.name, "Torrent 2");
    assert_eq!(torrents[1].torrent.size, 200);
    assert!(torrents[2].is_fully_enriched());

    let json = serde_json::to_value(&torrents[1]).unwrap();
    assert!(json.get("properties").is_none());
    assert_eq!(json["hash"], HASHES[1]);
}

/// Test: Torrents whose detail calls all fail keep their base fields
#[tokio::test]
async fn test_all_detail_calls_fail() {
    let mut server = Server::new_async().await;
    let _login = login(&mut server).await;
    let _list = torrent_list(&mut server).await;
    let mut mocks = Vec::new();
    for hash in HASHES {
        mocks.push(properties(&mut server, hash, 500).await);
        mocks.push(files(&mut server, hash, 500).await);
    }

    let client = QbClient::with_base_url(server.url(), "admin", "adminadmin");
    let torrents = list_enriched_torrents(&client).await.unwrap();

    assert_eq!(torrents.len(), 3);
    assert!(torrents
        .iter()
        .all(|t| t.properties.is_none() && t.files.is_none()));
}

/// Test: Failure of the base list call fails the whole listing
#[tokio::test]
async fn test_base_list_failure_is_fatal() {
    let mut server = Server::new_async().await;
    let _login = login(&mut server).await;
    let _list = server
        .mock("GET", "/api/v2/torrents/info")
        .with_status(500)
        .create_async()
        .await;

    let client = QbClient::with_base_url(server.url(), "admin", "adminadmin");
    let err = list_enriched_torrents(&client).await.unwrap_err();
    assert!(matches!(err, AppError::Daemon(_)));
}

/// Test: Empty list needs no detail calls
#[tokio::test]
async fn test_empty_list() {
    let mut server = Server::new_async().await;
    let _login = login(&mut server).await;
    let _list = server
        .mock("GET", "/api/v2/torrents/info")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let props = server
        .mock("GET", "/api/v2/torrents/properties")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = QbClient::with_base_url(server.url(), "admin", "adminadmin");
    assert!(list_enriched_torrents(&client).await.unwrap().is_empty());
    props.assert_async().await;
}
