use bytes::Bytes;
use tokio::time::{timeout, Duration};

use super::*;

fn setup(buffer_size: usize) -> (WatchRegistry, WatchDispatcher) {
    let registry = WatchRegistry::new(buffer_size);
    let dispatcher = WatchDispatcher::new(registry.clone());
    (registry, dispatcher)
}

fn key(k: &'static str) -> WatchTarget {
    WatchTarget::Key(Bytes::from_static(k.as_bytes()))
}

#[test]
fn test_notify_without_watchers_is_noop() {
    let (registry, dispatcher) = setup(1);

    assert_eq!(dispatcher.notify_put(Bytes::from("nobody"), Bytes::from("v")), 0);
    assert_eq!(dispatcher.notify_delete(Bytes::from("nobody")), 0);
    assert_eq!(registry.watched_target_count(), 0);
}

#[tokio::test]
async fn test_dispatch_to_matching_watcher() {
    let (_registry, dispatcher) = setup(1);
    let mut handle = dispatcher.registry().register(key("test_key"));

    let delivered = dispatcher.notify_put(Bytes::from("test_key"), Bytes::from("test_value"));
    assert_eq!(delivered, 1);

    let received = timeout(Duration::from_millis(100), handle.receiver_mut().recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    assert_eq!(received.key, Bytes::from("test_key"));
    assert_eq!(received.value, Bytes::from("test_value"));
    assert_eq!(received.event_type, WatchEventType::Put);
}

#[tokio::test]
async fn test_dispatch_ignores_non_matching_key() {
    let (registry, dispatcher) = setup(1);
    let mut handle = registry.register(key("key1"));

    assert_eq!(dispatcher.notify_put(Bytes::from("key2"), Bytes::from("v")), 0);
    // keys compare exactly, never by prefix
    assert_eq!(dispatcher.notify_put(Bytes::from("key10"), Bytes::from("v")), 0);

    let result = timeout(Duration::from_millis(50), handle.receiver_mut().recv()).await;
    assert!(result.is_err(), "Should not receive event for different key");
}

#[tokio::test]
async fn test_delete_event_is_distinct_from_empty_put() {
    let (registry, dispatcher) = setup(2);
    let mut handle = registry.register(key("k"));

    dispatcher.notify_put(Bytes::from("k"), Bytes::new());
    dispatcher.notify_delete(Bytes::from("k"));

    let put = handle.receiver_mut().recv().await.unwrap();
    let delete = handle.receiver_mut().recv().await.unwrap();

    assert_eq!(put.value, Bytes::new());
    assert!(!put.is_delete());
    assert_eq!(delete.value, Bytes::new());
    assert!(delete.is_delete());
}

#[tokio::test]
async fn test_multiple_watchers_all_receive_event() {
    let (registry, dispatcher) = setup(1);
    let mut handles: Vec<_> = (0..3).map(|_| registry.register(key("shared_key"))).collect();

    assert_eq!(dispatcher.notify_put(Bytes::from("shared_key"), Bytes::from("shared_value")), 3);

    for handle in handles.iter_mut() {
        let received = timeout(Duration::from_millis(100), handle.receiver_mut().recv())
            .await
            .expect("Timeout")
            .expect("Channel closed");
        assert_eq!(received.value, Bytes::from("shared_value"));
    }
}

#[tokio::test]
async fn test_full_watcher_drops_later_notifications() {
    let (registry, dispatcher) = setup(1);
    let mut handle = registry.register(key("k"));

    assert_eq!(dispatcher.notify_put(Bytes::from("k"), Bytes::from("first")), 1);
    assert_eq!(dispatcher.notify_put(Bytes::from("k"), Bytes::from("second")), 0);

    let received = handle.receiver_mut().recv().await.unwrap();
    assert_eq!(received.value, Bytes::from("first"));
    let nothing_more = timeout(Duration::from_millis(50), handle.receiver_mut().recv()).await;
    assert!(nothing_more.is_err());
}

#[tokio::test]
async fn test_prefix_watcher_receives_matching_keys() {
    let (registry, dispatcher) = setup(4);
    let mut handle = registry.register(WatchTarget::Prefix(Bytes::from_static(b"app/")));

    assert_eq!(dispatcher.notify_put(Bytes::from("app/a"), Bytes::from("1")), 1);
    assert_eq!(dispatcher.notify_put(Bytes::from("db/a"), Bytes::from("2")), 0);
    assert_eq!(dispatcher.notify_delete(Bytes::from("app/b")), 1);

    let first = handle.receiver_mut().recv().await.unwrap();
    assert_eq!(first.key, Bytes::from("app/a"));
    let second = handle.receiver_mut().recv().await.unwrap();
    assert_eq!(second.key, Bytes::from("app/b"));
    assert!(second.is_delete());
}

#[tokio::test]
async fn test_notify_skips_closed_receiver() {
    let (registry, dispatcher) = setup(1);
    let handle = registry.register(key("k"));

    // receiver dropped with the handle, which also unregisters it
    drop(handle);

    assert_eq!(dispatcher.notify_put(Bytes::from("k"), Bytes::from("v")), 0);
}
