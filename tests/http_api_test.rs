mod common;

use std::time::Duration;

use common::http;
use common::http_chunked;
use common::open_request;
use common::settle;
use common::start_server;
use common::start_server_with;
use common::test_config;
use common::TOKEN;

#[tokio::test]
async fn test_put_get_delete_over_tcp() {
    let server = start_server(30_000).await;

    let res = http(server.addr, "PUT", "/kv/foo", Some(TOKEN), b"bar").await;
    assert_eq!(res.status, 204);

    let res = http(server.addr, "GET", "/kv/foo", Some(TOKEN), b"").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body, b"bar");
    assert_eq!(res.header("content-type"), Some("application/octet-stream"));

    let res = http(server.addr, "DELETE", "/kv/foo", Some(TOKEN), b"").await;
    assert_eq!(res.status, 204);

    let res = http(server.addr, "GET", "/kv/foo", Some(TOKEN), b"").await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_binary_value_round_trips_unchanged() {
    let server = start_server(30_000).await;
    let value: Vec<u8> = (0..=255u8).collect();

    http(server.addr, "PUT", "/kv/blob", Some(TOKEN), &value).await;
    let res = http(server.addr, "GET", "/kv/blob", Some(TOKEN), b"").await;

    assert_eq!(res.body, value);
}

#[tokio::test]
async fn test_requests_without_token_are_forbidden() {
    let server = start_server(30_000).await;

    assert_eq!(http(server.addr, "GET", "/kv/foo", None, b"").await.status, 403);
    assert_eq!(http(server.addr, "PUT", "/kv/foo", None, b"x").await.status, 403);
    assert_eq!(
        http(server.addr, "GET", "/watch/foo", Some("wrong"), b"").await.status,
        403
    );
    // Nothing was stored by the rejected write
    assert_eq!(http(server.addr, "GET", "/kv/foo", Some(TOKEN), b"").await.status, 404);
}

#[tokio::test]
async fn test_watch_then_put_over_tcp() {
    let server = start_server(5_000).await;
    let addr = server.addr;

    let watcher = tokio::spawn(async move { http(addr, "GET", "/watch/foo", Some(TOKEN), b"").await });
    settle().await;
    http(addr, "PUT", "/kv/foo", Some(TOKEN), b"baz").await;

    let res = watcher.await.unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.body, b"baz");
    assert_eq!(res.header("x-watch-event"), Some("put"));
    assert_eq!(server.node.registry().watched_target_count(), 0);
}

#[tokio::test]
async fn test_shutdown_answers_pending_watch_and_stops_server() {
    let server = start_server(30_000).await;
    let addr = server.addr;

    let watcher = tokio::spawn(async move { http(addr, "GET", "/watch/foo", Some(TOKEN), b"").await });
    settle().await;
    assert_eq!(server.node.registry().watched_target_count(), 1);

    server.shutdown_tx.send(()).unwrap();

    let res = tokio::time::timeout(Duration::from_secs(2), watcher)
        .await
        .expect("watch answered on shutdown")
        .unwrap();
    assert_eq!(res.status, 204);
    tokio::time::timeout(Duration::from_secs(2), server.server)
        .await
        .expect("server drained")
        .unwrap();
    server.node.teardown().unwrap();
}

#[tokio::test]
async fn test_chunked_put_without_content_length_is_stored() {
    let server = start_server(30_000).await;

    let res = http_chunked(server.addr, "PUT", "/kv/foo", &[b"ba", b"r"]).await;
    assert_eq!(res.status, 204);

    let res = http(server.addr, "GET", "/kv/foo", Some(TOKEN), b"").await;
    assert_eq!(res.body, b"bar");
}

#[tokio::test]
async fn test_chunked_put_over_limit_is_rejected() {
    let mut config = test_config(30_000);
    config.server.max_body_bytes = 8;
    let server = start_server_with(config).await;

    let res = http_chunked(server.addr, "PUT", "/kv/big", &[b"12345", b"67890"]).await;
    assert_eq!(res.status, 413);

    let res = http(server.addr, "GET", "/kv/big", Some(TOKEN), b"").await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_client_hang_up_releases_watch_registration() {
    let server = start_server(30_000).await;

    let conn = open_request(server.addr, "/watch/foo").await;
    settle().await;
    assert_eq!(server.node.registry().watched_target_count(), 1);

    drop(conn);

    let mut remaining = 1;
    for _ in 0..50 {
        remaining = server.node.registry().watched_target_count();
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(remaining, 0, "registration released after hang-up");
}
