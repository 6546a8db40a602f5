//! End-to-end client tests against the in-memory substrate

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use brill_client::{Client, UserData};
use brill_core::BrillError;
use brill_test::MemSubstrate;

fn connected_client() -> (MemSubstrate, Client) {
    let substrate = MemSubstrate::new();
    let client = Client::new(Arc::new(substrate.clone()));
    client.connect("127.0.0.1", 7447).unwrap();
    (substrate, client)
}

#[test]
fn publish_then_get_round_trips_typed_values() {
    let (_substrate, client) = connected_client();
    client.add_mem_storage("all", "**").unwrap();

    client.publish("t/bool", true).unwrap();
    client.publish("t/int", -42i32).unwrap();
    client.publish("t/uint", 7u16).unwrap();
    client.publish("t/float", 1.5f64).unwrap();
    client.publish("t/text", "hello").unwrap();
    client.publish_raw("t/raw", b"\x00\x01").unwrap();

    let expect = [
        ("/t/bool", &b"true"[..], "text/plain;bool"),
        ("/t/float", b"1.5", "text/plain;float64"),
        ("/t/int", b"-42", "text/plain;int32"),
        ("/t/raw", b"\x00\x01", "application/octet-stream"),
        ("/t/text", b"hello", "text/plain"),
        ("/t/uint", b"7", "text/plain;uint16"),
    ];
    let vars = client.get("t/**").unwrap();
    assert_eq!(vars.len(), expect.len());
    for (var, (topic, value, encoding)) in vars.iter().zip(expect) {
        assert_eq!(var.topic(), topic);
        assert_eq!(var.value(), value);
        assert_eq!(var.encoding(), encoding);
        assert!(var.is_owned());
        assert!(var.timestamp().parse::<u64>().unwrap() > 0);
    }
}

#[test]
fn documented_scenario() {
    // connect -> publish int32 -> get through a storage over "a/**"
    let (_substrate, client) = connected_client();
    client.add_mem_storage("scenario", "a/**").unwrap();
    client.publish("a/b", 42i32).unwrap();

    let vars = client.get("a/b").unwrap();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].topic(), "/a/b");
    assert_eq!(vars[0].value(), b"42");
    assert_eq!(vars[0].encoding(), "text/plain;int32");
}

#[test]
fn subscribe_replays_stored_values_once_then_goes_live() {
    let (_substrate, client) = connected_client();
    client.add_mem_storage("s", "a/**").unwrap();
    client.publish("a/one", 1i32).unwrap();
    client.publish("a/two", 2i32).unwrap();

    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    client
        .subscribe("a/**", move |var| {
            sink.lock()
                .push((var.topic().to_string(), var.value_str().unwrap().to_string()));
        })
        .unwrap();

    // Catch-up delivered exactly the two stored values, exactly once.
    assert_eq!(
        seen.lock().as_slice(),
        [
            ("/a/one".to_string(), "1".to_string()),
            ("/a/two".to_string(), "2".to_string()),
        ]
    );

    client.publish("a/three", 3i32).unwrap();
    assert_eq!(seen.lock().len(), 3);
    assert_eq!(seen.lock()[2], ("/a/three".to_string(), "3".to_string()));
}

#[test]
fn duplicate_subscribe_fails_and_leaves_first_intact() {
    let (_substrate, client) = connected_client();
    let hits = Arc::new(AtomicUsize::new(0));

    let sink = Arc::clone(&hits);
    client
        .subscribe("a/b", move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let err = client.subscribe("/a/b", |_| {}).unwrap_err();
    assert!(matches!(err, BrillError::AlreadySubscribed(_)));

    client.publish("a/b", 1i32).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribe_stops_delivery() {
    let (substrate, client) = connected_client();
    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);
    client
        .subscribe("a/b", move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert_eq!(substrate.subscriber_count(), 1);

    client.unsubscribe("/a/b").unwrap();
    assert_eq!(substrate.subscriber_count(), 0);

    client.publish("a/b", 1i32).unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let err = client.unsubscribe("a/b").unwrap_err();
    assert!(matches!(err, BrillError::NoSuchSubscription(_)));
}

#[test]
fn subscribe_with_passes_user_data() {
    let (_substrate, client) = connected_client();
    let total = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&total);
    let data: Arc<UserData> = Arc::new(40usize);

    client
        .subscribe_with(
            "a",
            move |var, data| {
                let base = data.downcast_ref::<usize>().copied().unwrap_or(0);
                let value: usize = var.value_str().unwrap().parse().unwrap();
                sink.fetch_add(base + value, Ordering::SeqCst);
            },
            data,
        )
        .unwrap();

    client.publish("a", 2u32).unwrap();
    assert_eq!(total.load(Ordering::SeqCst), 42);
}

#[test]
fn mem_storage_name_is_unique_and_removal_empties_queries() {
    let (substrate, client) = connected_client();
    client.add_mem_storage("demo", "a/**").unwrap();

    let err = client.add_mem_storage("demo", "b/**").unwrap_err();
    assert!(matches!(err, BrillError::StorageExists(_)));
    assert_eq!(substrate.storage_names(), ["demo"]);

    client.publish("a/b", 1i32).unwrap();
    assert_eq!(client.get("a/**").unwrap().len(), 1);

    client.remove_mem_storage("demo").unwrap();
    assert!(client.get("a/**").unwrap().is_empty());

    let err = client.remove_mem_storage("demo").unwrap_err();
    assert!(matches!(err, BrillError::NoSuchStorage(_)));
}

#[test]
fn erase_removes_stored_values() {
    let (_substrate, client) = connected_client();
    client.add_mem_storage("s", "a/**").unwrap();
    client.publish("a/b", 1i32).unwrap();
    client.publish("a/c", 2i32).unwrap();

    client.erase("/a/b").unwrap();
    let vars = client.get("a/**").unwrap();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].topic(), "/a/c");
}

#[test]
fn disconnect_is_idempotent_and_tears_down_lifo() {
    let (substrate, client) = connected_client();
    client.add_mem_storage("first", "a/**").unwrap();
    client.add_mem_storage("second", "b/**").unwrap();
    client.subscribe("a/x", |_| {}).unwrap();
    client.subscribe("a/y", |_| {}).unwrap();

    client.disconnect().unwrap();
    assert!(!client.is_connected());
    assert_eq!(substrate.subscriber_count(), 0);
    assert!(substrate.storage_names().is_empty());

    // Most-recently-created first, subscriptions before storages.
    assert_eq!(
        substrate.admin_log(),
        [
            "create:first",
            "create:second",
            "subscribe:a/x",
            "subscribe:a/y",
            "unsubscribe:a/y",
            "unsubscribe:a/x",
            "delete:second",
            "delete:first",
        ]
    );

    // Second disconnect is a no-op that still succeeds.
    client.disconnect().unwrap();
    assert!(!client.is_connected());
}

#[test]
fn operations_require_connection() {
    let substrate = MemSubstrate::new();
    let client = Client::new(Arc::new(substrate));

    assert!(matches!(
        client.publish("a", 1i32).unwrap_err(),
        BrillError::NotConnected
    ));
    assert!(matches!(
        client.subscribe("a", |_| {}).unwrap_err(),
        BrillError::NotConnected
    ));
    assert!(matches!(
        client.get("a").unwrap_err(),
        BrillError::NotConnected
    ));
    assert!(matches!(
        client.add_mem_storage("s", "a/**").unwrap_err(),
        BrillError::NotConnected
    ));
    assert!(!client.is_connected());
}

#[test]
fn connected_means_router_reachable() {
    let (substrate, client) = connected_client();
    assert!(client.is_connected());

    // A live socket with zero reachable routers counts as disconnected,
    // uniformly across the data operations.
    substrate.set_reachable(false);
    assert!(!client.is_connected());
    assert!(matches!(
        client.get("a").unwrap_err(),
        BrillError::NotConnected
    ));
    assert!(matches!(
        client.publish("a", 1i32).unwrap_err(),
        BrillError::NotConnected
    ));
    assert!(matches!(
        client.erase("a").unwrap_err(),
        BrillError::NotConnected
    ));

    substrate.set_reachable(true);
    client.reconnect().unwrap();
    assert!(client.is_connected());
}

#[test]
fn reconnect_reuses_stored_endpoint() {
    let (substrate, client) = connected_client();
    client.subscribe("a", |_| {}).unwrap();
    client.reconnect().unwrap();

    assert!(client.is_connected());
    // Reconnect went through a full disconnect: the subscription is gone.
    assert_eq!(substrate.subscriber_count(), 0);
    assert!(matches!(
        client.unsubscribe("a").unwrap_err(),
        BrillError::NoSuchSubscription(_)
    ));
}

#[test]
fn connect_after_router_loss_tears_down_old_session() {
    let (substrate, client) = connected_client();
    client.subscribe("a/b", |_| {}).unwrap();
    assert_eq!(substrate.subscriber_count(), 1);

    substrate.set_reachable(false);
    let err = client.connect("127.0.0.1", 7447).unwrap_err();
    assert!(matches!(err, BrillError::NoRouter));

    // The unreachable session was still torn down before being replaced:
    // its subscriber is gone and the topic is free again.
    assert_eq!(substrate.subscriber_count(), 0);

    substrate.set_reachable(true);
    client.connect("127.0.0.1", 7447).unwrap();
    client.subscribe("a/b", |_| {}).unwrap();
    assert_eq!(substrate.subscriber_count(), 1);
}

#[test]
fn connect_while_connected_resets_session_state() {
    let (substrate, client) = connected_client();
    client.add_mem_storage("demo", "a/**").unwrap();

    client.connect("127.0.0.1", 7447).unwrap();
    assert!(client.is_connected());
    // The implicit disconnect removed the storage created earlier.
    assert!(substrate.storage_names().is_empty());
}

#[test]
fn custom_encodings_survive_the_round_trip() {
    let (_substrate, client) = connected_client();
    client.add_mem_storage("s", "c/**").unwrap();

    client
        .publish_custom("c/v", b"payload", "x-vendor/frob+v2")
        .unwrap();
    let vars = client.get("c/v").unwrap();
    assert_eq!(vars.len(), 1);
    assert_eq!(vars[0].encoding(), "x-vendor/frob+v2");

    client
        .publish_custom("c/j", br#"{"k":1}"#, "application/json")
        .unwrap();
    let vars = client.get("c/j").unwrap();
    assert_eq!(vars[0].encoding(), "application/json");
}
